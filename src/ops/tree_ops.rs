use std::collections::HashSet;

use crate::model::forest::Forest;
use crate::model::task::{Resource, Task, TaskStatus, parse_ymd};

/// Error type for task tree operations.
///
/// `NotFound` is the lookup-miss case: the operation did nothing and the
/// forest is exactly as it was. Callers that want fail-soft behavior check
/// [`TreeError::is_miss`] and carry on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("resource {resource_id} not found on task {task_id}")]
    ResourceNotFound { task_id: String, resource_id: String },
    #[error("task id already in use: {0}")]
    DuplicateId(String),
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("field '{0}' is structural and cannot be set directly")]
    StructuralField(String),
    #[error("unknown task field: {0}")]
    UnknownField(String),
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

impl TreeError {
    /// True when the error only means "no node had that id"
    pub fn is_miss(&self) -> bool {
        matches!(self, TreeError::NotFound(_) | TreeError::ResourceNotFound { .. })
    }
}

// ---------------------------------------------------------------------------
// Field mutations
// ---------------------------------------------------------------------------

/// A change to a single, non-structural task field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskMutation {
    SetStatus(TaskStatus),
    SetTitle(String),
    SetDescription(Option<String>),
    SetAssignee(Option<String>),
    SetStartDate(Option<String>),
    SetEndDate(Option<String>),
    SetDates {
        start: Option<String>,
        end: Option<String>,
    },
    SetDepartment(String),
    SetSpecific(bool),
}

impl TaskMutation {
    /// Build a mutation from a field name and a raw value.
    ///
    /// Accepts camelCase and snake_case names. An empty value clears an
    /// optional field. Dates must be `YYYY-MM-DD`.
    pub fn from_field(field: &str, value: &str) -> Result<TaskMutation, TreeError> {
        let optional = || {
            let v = value.trim();
            if v.is_empty() { None } else { Some(v.to_string()) }
        };
        let date = || -> Result<Option<String>, TreeError> {
            match optional() {
                Some(d) if parse_ymd(&d).is_none() => Err(invalid(field, value)),
                other => Ok(other),
            }
        };

        match field {
            "id" | "subtasks" | "resources" => Err(TreeError::StructuralField(field.to_string())),
            "status" => TaskStatus::parse(value)
                .map(TaskMutation::SetStatus)
                .ok_or_else(|| invalid(field, value)),
            "title" => Ok(TaskMutation::SetTitle(value.trim().to_string())),
            "description" => Ok(TaskMutation::SetDescription(optional())),
            "assignee" => Ok(TaskMutation::SetAssignee(optional())),
            "startDate" | "start_date" | "start" => Ok(TaskMutation::SetStartDate(date()?)),
            "endDate" | "end_date" | "end" => Ok(TaskMutation::SetEndDate(date()?)),
            "department" => match optional() {
                Some(d) => Ok(TaskMutation::SetDepartment(d)),
                None => Err(invalid(field, value)),
            },
            "isSpecificTask" | "is_specific_task" | "specific" => {
                match value.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" | "1" => Ok(TaskMutation::SetSpecific(true)),
                    "false" | "no" | "0" => Ok(TaskMutation::SetSpecific(false)),
                    _ => Err(invalid(field, value)),
                }
            }
            _ => Err(TreeError::UnknownField(field.to_string())),
        }
    }

    fn validate(&self) -> Result<(), TreeError> {
        if let TaskMutation::SetTitle(title) = self
            && title.trim().is_empty()
        {
            return Err(TreeError::EmptyTitle);
        }
        Ok(())
    }

    fn apply_to(self, task: &mut Task) {
        match self {
            TaskMutation::SetStatus(status) => task.status = status,
            TaskMutation::SetTitle(title) => task.title = title,
            TaskMutation::SetDescription(d) => task.description = d,
            TaskMutation::SetAssignee(a) => task.assignee = a,
            TaskMutation::SetStartDate(d) => task.start_date = d,
            TaskMutation::SetEndDate(d) => task.end_date = d,
            TaskMutation::SetDates { start, end } => {
                task.start_date = start;
                task.end_date = end;
            }
            TaskMutation::SetDepartment(d) => task.department = d,
            TaskMutation::SetSpecific(s) => task.is_specific_task = s,
        }
    }
}

fn invalid(field: &str, value: &str) -> TreeError {
    TreeError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Apply a single field mutation to the task with the given id.
pub fn apply(forest: &mut Forest, task_id: &str, mutation: TaskMutation) -> Result<(), TreeError> {
    mutation.validate()?;
    let task = forest
        .get_mut(task_id)
        .ok_or_else(|| TreeError::NotFound(task_id.to_string()))?;
    mutation.apply_to(task);
    Ok(())
}

/// Set only the status of the task with the given id.
pub fn set_status(forest: &mut Forest, task_id: &str, status: TaskStatus) -> Result<(), TreeError> {
    apply(forest, task_id, TaskMutation::SetStatus(status))
}

/// Set a field by name. Structural fields are rejected before any lookup.
pub fn set_field(forest: &mut Forest, task_id: &str, field: &str, value: &str) -> Result<(), TreeError> {
    let mutation = TaskMutation::from_field(field, value)?;
    apply(forest, task_id, mutation)
}

// ---------------------------------------------------------------------------
// Structural changes
// ---------------------------------------------------------------------------

/// Replace the task with the given id (and its whole subtree) by `new_task`,
/// keeping its position among its siblings.
pub fn find_and_replace(forest: &mut Forest, task_id: &str, new_task: Task) -> Result<(), TreeError> {
    check_titles(&new_task)?;
    let old = forest
        .get(task_id)
        .ok_or_else(|| TreeError::NotFound(task_id.to_string()))?;

    // Ids inside the replaced subtree are free to be reused by the new one
    let mut released = HashSet::new();
    collect_ids(old, &mut released);
    check_unique(forest, &new_task, &released)?;

    let slot = forest
        .get_mut(task_id)
        .ok_or_else(|| TreeError::NotFound(task_id.to_string()))?;
    *slot = new_task;
    forest.reindex();
    Ok(())
}

/// Prepend a task to the root sequence (newest first).
pub fn insert_root(forest: &mut Forest, new_task: Task) -> Result<(), TreeError> {
    check_titles(&new_task)?;
    check_unique(forest, &new_task, &HashSet::new())?;
    forest.roots_mut().insert(0, new_task);
    forest.reindex();
    Ok(())
}

/// Append a task to the end of a parent's children (oldest first).
///
/// When the parent does not exist the new task is dropped and the forest is
/// left unchanged.
pub fn insert_child(forest: &mut Forest, parent_id: &str, new_task: Task) -> Result<(), TreeError> {
    let Some(parent_path) = forest.path_of(parent_id).map(|p| p.to_vec()) else {
        return Err(TreeError::NotFound(parent_id.to_string()));
    };
    check_titles(&new_task)?;
    check_unique(forest, &new_task, &HashSet::new())?;

    let parent = forest
        .get_mut(parent_id)
        .ok_or_else(|| TreeError::NotFound(parent_id.to_string()))?;
    parent.subtasks.push(new_task);
    let mut child_path = parent_path;
    child_path.push(parent.subtasks.len() - 1);
    forest.index_subtree(child_path);
    Ok(())
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

pub fn add_resource(forest: &mut Forest, task_id: &str, resource: Resource) -> Result<(), TreeError> {
    let task = forest
        .get_mut(task_id)
        .ok_or_else(|| TreeError::NotFound(task_id.to_string()))?;
    task.resources.push(resource);
    Ok(())
}

pub fn delete_resource(forest: &mut Forest, task_id: &str, resource_id: &str) -> Result<Resource, TreeError> {
    let task = forest
        .get_mut(task_id)
        .ok_or_else(|| TreeError::NotFound(task_id.to_string()))?;
    let idx = task
        .resources
        .iter()
        .position(|r| r.id == resource_id)
        .ok_or_else(|| TreeError::ResourceNotFound {
            task_id: task_id.to_string(),
            resource_id: resource_id.to_string(),
        })?;
    Ok(task.resources.remove(idx))
}

/// Replace a task's resource list wholesale with the caller's ordering.
/// The new list is trusted as given.
pub fn reorder_resources(
    forest: &mut Forest,
    task_id: &str,
    ordered: Vec<Resource>,
) -> Result<(), TreeError> {
    let task = forest
        .get_mut(task_id)
        .ok_or_else(|| TreeError::NotFound(task_id.to_string()))?;
    task.resources = ordered;
    Ok(())
}

// ---------------------------------------------------------------------------
// Department propagation
// ---------------------------------------------------------------------------

/// Rewrite `department` on every node at every depth that carries `old_name`.
/// Returns the number of nodes changed.
pub fn rename_department(forest: &mut Forest, old_name: &str, new_name: &str) -> usize {
    fn rename_in(tasks: &mut [Task], old_name: &str, new_name: &str) -> usize {
        let mut changed = 0;
        for task in tasks.iter_mut() {
            if task.department == old_name {
                task.department = new_name.to_string();
                changed += 1;
            }
            changed += rename_in(&mut task.subtasks, old_name, new_name);
        }
        changed
    }
    if old_name == new_name {
        return 0;
    }
    rename_in(forest.roots_mut(), old_name, new_name)
}

// ---------------------------------------------------------------------------
// Id allocation
// ---------------------------------------------------------------------------

/// Next free task id of the form `T-NNN`.
pub fn next_task_id(forest: &Forest) -> String {
    let mut max = 0usize;
    for_each_task(forest.roots(), &mut |task| {
        if let Some(n) = numeric_suffix(&task.id, "T-")
            && n > max
        {
            max = n;
        }
    });
    format!("T-{:03}", max + 1)
}

/// Next free resource id on a task, of the form `R-NNN`.
pub fn next_resource_id(task: &Task) -> String {
    let max = task
        .resources
        .iter()
        .filter_map(|r| numeric_suffix(&r.id, "R-"))
        .max()
        .unwrap_or(0);
    format!("R-{:03}", max + 1)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn numeric_suffix(id: &str, prefix: &str) -> Option<usize> {
    id.strip_prefix(prefix)?.parse().ok()
}

fn for_each_task(tasks: &[Task], f: &mut dyn FnMut(&Task)) {
    for task in tasks {
        f(task);
        for_each_task(&task.subtasks, f);
    }
}

fn collect_ids(task: &Task, ids: &mut HashSet<String>) {
    ids.insert(task.id.clone());
    for sub in &task.subtasks {
        collect_ids(sub, ids);
    }
}

fn check_titles(task: &Task) -> Result<(), TreeError> {
    if task.title.trim().is_empty() {
        return Err(TreeError::EmptyTitle);
    }
    task.subtasks.iter().try_for_each(check_titles)
}

/// Every id in `task`'s subtree must be unused in the forest (ignoring
/// `released`) and unique within the subtree itself.
fn check_unique(forest: &Forest, task: &Task, released: &HashSet<String>) -> Result<(), TreeError> {
    let mut seen = HashSet::new();
    let mut result = Ok(());
    for_each_task(std::slice::from_ref(task), &mut |t| {
        if result.is_err() {
            return;
        }
        let taken = forest.contains(&t.id) && !released.contains(&t.id);
        if taken || !seen.insert(t.id.clone()) {
            result = Err(TreeError::DuplicateId(t.id.clone()));
        }
    });
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
