use crate::model::forest::Forest;
use crate::model::settings::DepartmentRegistry;
use crate::ops::stats_ops::count_by_department;
use crate::ops::tree_ops;

/// Error type for department registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DepartmentError {
    #[error("department name cannot be empty")]
    EmptyName,
    #[error("department already exists: {0}")]
    AlreadyExists(String),
    #[error("department not found: {0}")]
    NotFound(String),
    #[error("department {name} is still used by {count} task(s)")]
    InUse { name: String, count: usize },
}

/// Append a department to the registry.
pub fn add_department(registry: &mut DepartmentRegistry, name: &str) -> Result<(), DepartmentError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DepartmentError::EmptyName);
    }
    if registry.contains(name) {
        return Err(DepartmentError::AlreadyExists(name.to_string()));
    }
    registry.names_mut().push(name.to_string());
    Ok(())
}

/// Remove a department. Refused while any task at any depth references it.
pub fn remove_department(
    registry: &mut DepartmentRegistry,
    forest: &Forest,
    name: &str,
) -> Result<(), DepartmentError> {
    let idx = registry
        .position(name)
        .ok_or_else(|| DepartmentError::NotFound(name.to_string()))?;
    let count = count_by_department(forest.roots())
        .get(name)
        .copied()
        .unwrap_or(0);
    if count > 0 {
        return Err(DepartmentError::InUse {
            name: name.to_string(),
            count,
        });
    }
    registry.names_mut().remove(idx);
    Ok(())
}

/// Rename a department everywhere it appears.
///
/// All checks run before anything changes. On success the registry entry
/// keeps its position, every task tagged `old_name` is retagged, and the
/// active department filter follows the rename. Returns the number of
/// tasks retagged.
pub fn rename_department(
    registry: &mut DepartmentRegistry,
    forest: &mut Forest,
    active_filter: &mut Option<String>,
    old_name: &str,
    new_name: &str,
) -> Result<usize, DepartmentError> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(DepartmentError::EmptyName);
    }
    let idx = registry
        .position(old_name)
        .ok_or_else(|| DepartmentError::NotFound(old_name.to_string()))?;
    if new_name == old_name {
        return Ok(0);
    }
    if registry.contains(new_name) {
        return Err(DepartmentError::AlreadyExists(new_name.to_string()));
    }

    registry.names_mut()[idx] = new_name.to_string();
    let retagged = tree_ops::rename_department(forest, old_name, new_name);
    if active_filter.as_deref() == Some(old_name) {
        *active_filter = Some(new_name.to_string());
    }
    Ok(retagged)
}
