use std::fs;
use std::path::Path;

use crate::io::store_io::{StoreError, atomic_write};
use crate::model::settings::{DepartmentRegistry, Settings};

/// Keys under `[app]` that `settings set` may change
pub const APP_KEYS: [&str; 4] = ["name", "logo_url", "time_zone", "resource_categories"];

/// Read settings.toml, returning both the parsed settings and the raw
/// toml_edit document for round-trip-safe editing.
pub fn read_settings(data_dir: &Path) -> Result<(Settings, toml_edit::DocumentMut), StoreError> {
    let path = data_dir.join("settings.toml");
    let text = fs::read_to_string(&path).map_err(|e| StoreError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    let settings: Settings = toml::from_str(&text)?;
    // Already valid TOML at this point, so a toml_edit failure is unexpected
    let doc: toml_edit::DocumentMut = text.parse().map_err(|e: toml_edit::TomlError| {
        StoreError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    })?;
    Ok((settings, doc))
}

/// Write the settings document back to disk, preserving formatting.
pub fn write_settings(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), StoreError> {
    let path = data_dir.join("settings.toml");
    atomic_write(&path, doc.to_string().as_bytes()).map_err(|e| StoreError::WriteError {
        path,
        source: e,
    })
}

/// Replace the `departments` array with the registry contents
pub fn set_departments(doc: &mut toml_edit::DocumentMut, registry: &DepartmentRegistry) {
    let mut array = toml_edit::Array::new();
    for name in registry.names() {
        array.push(name.as_str());
    }
    doc["departments"] = toml_edit::value(array);
}

/// Update one `[app]` key from a raw string value.
///
/// `resource_categories` takes a comma-separated list; an empty `logo_url`
/// removes the key.
pub fn set_app_value(doc: &mut toml_edit::DocumentMut, key: &str, value: &str) -> Result<(), String> {
    if !APP_KEYS.contains(&key) {
        return Err(format!(
            "unknown setting '{}' (expected: {})",
            key,
            APP_KEYS.join(", ")
        ));
    }
    if !doc.contains_key("app") {
        doc["app"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    let value = value.trim();
    match key {
        "resource_categories" => {
            let mut array = toml_edit::Array::new();
            for cat in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                array.push(cat);
            }
            doc["app"][key] = toml_edit::value(array);
        }
        "logo_url" if value.is_empty() => {
            if let Some(app) = doc["app"].as_table_like_mut() {
                app.remove(key);
            }
        }
        "name" | "time_zone" if value.is_empty() => {
            return Err(format!("{} cannot be empty", key));
        }
        _ => doc["app"][key] = toml_edit::value(value),
    }
    Ok(())
}
