use std::path::PathBuf;

use super::forest::Forest;
use super::settings::Settings;

/// A fully loaded dashboard workspace
#[derive(Debug)]
pub struct Dashboard {
    /// Path to the `unidash/` directory
    pub data_dir: PathBuf,
    /// Parsed settings.toml
    pub settings: Settings,
    /// The task forest from tasks.json
    pub forest: Forest,
}
