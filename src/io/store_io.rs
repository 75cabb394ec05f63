use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::dashboard::Dashboard;
use crate::model::forest::Forest;
use crate::model::settings::Settings;

/// Name of the data directory inside a dashboard root
pub const DATA_DIR: &str = "unidash";
const SETTINGS_FILE: &str = "settings.toml";
const TASKS_FILE: &str = "tasks.json";

/// Error type for dashboard storage
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not a unidash workspace: no unidash/ directory found")]
    NotADashboard,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse settings.toml: {0}")]
    SettingsParseError(#[from] toml::de::Error),
    #[error("could not parse {path}: {source}")]
    TasksParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize tasks: {0}")]
    TasksSerializeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Find the dashboard by walking up from `start`, looking for
/// `unidash/settings.toml`.
pub fn discover_dashboard(start: &Path) -> Result<PathBuf, StoreError> {
    let mut current = start.to_path_buf();
    loop {
        let data_dir = current.join(DATA_DIR);
        if data_dir.is_dir() && data_dir.join(SETTINGS_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(StoreError::NotADashboard);
        }
    }
}

/// Load settings and the task forest. A missing tasks.json is an empty forest.
pub fn load_dashboard(root: &Path) -> Result<Dashboard, StoreError> {
    let data_dir = root.join(DATA_DIR);
    if !data_dir.is_dir() {
        return Err(StoreError::NotADashboard);
    }

    let settings_path = data_dir.join(SETTINGS_FILE);
    let settings_text = fs::read_to_string(&settings_path).map_err(|e| StoreError::ReadError {
        path: settings_path.clone(),
        source: e,
    })?;
    let settings: Settings = toml::from_str(&settings_text)?;

    let forest = load_forest(&data_dir)?;
    tracing::debug!(
        root = %root.display(),
        nodes = forest.node_count(),
        departments = settings.departments.len(),
        "loaded dashboard"
    );

    Ok(Dashboard {
        data_dir,
        settings,
        forest,
    })
}

/// Read tasks.json from the data directory.
pub fn load_forest(data_dir: &Path) -> Result<Forest, StoreError> {
    let tasks_path = data_dir.join(TASKS_FILE);
    if !tasks_path.exists() {
        return Ok(Forest::default());
    }
    let text = fs::read_to_string(&tasks_path).map_err(|e| StoreError::ReadError {
        path: tasks_path.clone(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| StoreError::TasksParseError {
        path: tasks_path,
        source: e,
    })
}

/// Write the forest to tasks.json, replacing the file atomically.
pub fn save_forest(data_dir: &Path, forest: &Forest) -> Result<(), StoreError> {
    let tasks_path = data_dir.join(TASKS_FILE);
    let mut content = serde_json::to_string_pretty(forest)?;
    content.push('\n');
    atomic_write(&tasks_path, content.as_bytes()).map_err(|e| {
        tracing::error!(path = %tasks_path.display(), error = %e, "task write failed");
        StoreError::WriteError {
            path: tasks_path.clone(),
            source: e,
        }
    })?;
    tracing::debug!(nodes = forest.node_count(), "saved tasks");
    Ok(())
}

/// Write via a temp file in the same directory, then rename over the target.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
