use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ops::view_ops::{SortDirection, SortKey};

/// Per-session view state (written to .state.json)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Department the views are scoped to, if any
    #[serde(default)]
    pub active_department: Option<String>,
    /// Default sort for `list` when no `--sort` is given
    #[serde(default)]
    pub sort_key: Option<SortKey>,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

/// Read .state.json; a missing or unreadable file yields `None`.
pub fn read_view_state(data_dir: &Path) -> Option<ViewState> {
    let path = data_dir.join(".state.json");
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed view state");
            None
        }
    }
}

/// Write .state.json to the data directory
pub fn write_view_state(data_dir: &Path, state: &ViewState) -> Result<(), std::io::Error> {
    let path = data_dir.join(".state.json");
    let content = serde_json::to_string_pretty(state)?;
    fs::write(&path, content)
}
