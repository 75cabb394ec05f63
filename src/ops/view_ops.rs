use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::task::{Task, TaskKind, TaskStatus};

/// Depth-first pre-order: each parent before its children, children in
/// stored order.
pub fn flatten(tasks: &[Task]) -> Vec<&Task> {
    fn walk<'a>(tasks: &'a [Task], out: &mut Vec<&'a Task>) {
        for task in tasks {
            out.push(task);
            walk(&task.subtasks, out);
        }
    }
    let mut out = Vec::new();
    walk(tasks, &mut out);
    out
}

/// Like [`flatten`], paired with each node's depth (0 = root).
pub fn flatten_with_depth(tasks: &[Task]) -> Vec<(usize, &Task)> {
    fn walk<'a>(tasks: &'a [Task], depth: usize, out: &mut Vec<(usize, &'a Task)>) {
        for task in tasks {
            out.push((depth, task));
            walk(&task.subtasks, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(tasks, 0, &mut out);
    out
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Filter dimensions. Every unset dimension matches everything; all set
/// dimensions must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Case-insensitive substring of title, description, assignee or department
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub kind: Option<TaskKind>,
    /// Exact assignee
    pub assignee: Option<String>,
    /// Exact department
    pub department: Option<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        set(&self.search).is_none()
            && self.status.is_none()
            && self.kind.is_none()
            && set(&self.assignee).is_none()
            && set(&self.department).is_none()
    }

    /// Whether the task itself (ignoring descendants) matches
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(query) = set(&self.search) {
            let query = query.to_lowercase();
            let hit = |s: &str| s.to_lowercase().contains(&query);
            let found = hit(&task.title)
                || task.description.as_deref().is_some_and(hit)
                || task.assignee.as_deref().is_some_and(hit)
                || hit(&task.department);
            if !found {
                return false;
            }
        }
        if let Some(status) = self.status
            && task.status != status
        {
            return false;
        }
        if let Some(kind) = self.kind
            && task.kind() != kind
        {
            return false;
        }
        if let Some(assignee) = set(&self.assignee)
            && task.assignee.as_deref() != Some(assignee)
        {
            return false;
        }
        if let Some(department) = set(&self.department)
            && task.department != department
        {
            return false;
        }
        true
    }
}

/// Treat empty strings as unset
fn set(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Keep every node that matches or has a matching descendant.
///
/// Ancestors of a match are always kept, so a match is never orphaned.
/// Kept nodes carry only their filtered children; unrelated siblings are
/// pruned at every level.
pub fn filter_tasks(tasks: &[Task], criteria: &FilterCriteria) -> Vec<Task> {
    tasks
        .iter()
        .filter_map(|task| {
            let children = filter_tasks(&task.subtasks, criteria);
            if criteria.matches(task) || !children.is_empty() {
                let mut kept = task.clone();
                kept.subtasks = children;
                Some(kept)
            } else {
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    Title,
    Status,
    StartDate,
    EndDate,
    Assignee,
    Department,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<SortKey> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Some(SortKey::Title),
            "status" => Some(SortKey::Status),
            "start" | "start-date" | "startdate" | "start_date" => Some(SortKey::StartDate),
            "end" | "end-date" | "enddate" | "end_date" => Some(SortKey::EndDate),
            "assignee" => Some(SortKey::Assignee),
            "department" | "dept" => Some(SortKey::Department),
            _ => None,
        }
    }

    /// The sort value of a task; an absent field sorts as the empty string.
    fn value(self, task: &Task) -> &str {
        match self {
            SortKey::Title => &task.title,
            SortKey::Status => task.status.label(),
            SortKey::StartDate => task.start_date.as_deref().unwrap_or(""),
            SortKey::EndDate => task.end_date.as_deref().unwrap_or(""),
            SortKey::Assignee => task.assignee.as_deref().unwrap_or(""),
            SortKey::Department => &task.department,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Stable sort of every sibling list, each level sorted on its own.
pub fn sort_tasks(tasks: &mut [Task], key: SortKey, direction: SortDirection) {
    tasks.sort_by(|a, b| {
        let ord: Ordering = key.value(a).cmp(key.value(b));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    for task in tasks.iter_mut() {
        sort_tasks(&mut task.subtasks, key, direction);
    }
}

/// Filter, then optionally sort, producing a fresh projection of the forest.
pub fn project_view(
    tasks: &[Task],
    criteria: &FilterCriteria,
    sort: Option<(SortKey, SortDirection)>,
) -> Vec<Task> {
    let mut view = if criteria.is_empty() {
        tasks.to_vec()
    } else {
        filter_tasks(tasks, criteria)
    };
    if let Some((key, direction)) = sort {
        sort_tasks(&mut view, key, direction);
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(id: &str, title: &str, status: TaskStatus) -> Task {
        let mut t = Task::new(id, "Escolares", title);
        t.status = status;
        t
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    /// r1
    ///   a1
    ///     g1 (assignee Ana, "Revisión de actas")
    ///     g2
    ///   a2
    /// r2
    fn three_levels() -> Vec<Task> {
        let mut g1 = node("g1", "Revisión de actas", TaskStatus::Pending);
        g1.assignee = Some("Ana".into());
        g1.is_specific_task = true;
        let mut a1 = node("a1", "Cierre de ciclo", TaskStatus::Pending);
        a1.subtasks = vec![g1, node("g2", "Archivo", TaskStatus::Pending)];
        let mut r1 = node("r1", "Semestre", TaskStatus::Pending);
        r1.subtasks = vec![a1, node("a2", "Becas", TaskStatus::Pending)];
        vec![r1, node("r2", "Presupuesto", TaskStatus::Pending)]
    }

    #[test]
    fn flatten_is_preorder() {
        let tasks = three_levels();
        let order: Vec<&str> = flatten(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["r1", "a1", "g1", "g2", "a2", "r2"]);
        let depths: Vec<usize> = flatten_with_depth(&tasks).iter().map(|(d, _)| *d).collect();
        assert_eq!(depths, vec![0, 1, 2, 2, 1, 0]);
    }

    #[test]
    fn filter_keeps_ancestor_chain_of_deep_match() {
        let criteria = FilterCriteria {
            search: Some("ACTAS".into()),
            ..Default::default()
        };
        let view = filter_tasks(&three_levels(), &criteria);
        assert_eq!(ids(&view), vec!["r1"]);
        assert_eq!(ids(&view[0].subtasks), vec!["a1"]);
        assert_eq!(ids(&view[0].subtasks[0].subtasks), vec!["g1"]);
    }

    #[test]
    fn matching_parent_keeps_only_matching_children() {
        let criteria = FilterCriteria {
            search: Some("ciclo".into()),
            ..Default::default()
        };
        let view = filter_tasks(&three_levels(), &criteria);
        assert_eq!(ids(&view), vec!["r1"]);
        assert_eq!(ids(&view[0].subtasks), vec!["a1"]);
        assert!(view[0].subtasks[0].subtasks.is_empty());
    }

    #[test]
    fn search_checks_description_assignee_and_department() {
        let mut t = node("x", "Sin coincidencia", TaskStatus::Pending);
        t.description = Some("Conciliación bancaria".into());
        t.assignee = Some("Luis Pérez".into());
        let by = |q: &str| FilterCriteria {
            search: Some(q.into()),
            ..Default::default()
        };
        assert!(by("bancaria").matches(&t));
        assert!(by("pérez").matches(&t));
        assert!(by("escolar").matches(&t));
        assert!(!by("finanzas").matches(&t));
    }

    #[test]
    fn dimensions_combine_with_and() {
        let criteria = FilterCriteria {
            status: Some(TaskStatus::Pending),
            kind: Some(TaskKind::Specific),
            assignee: Some("Ana".into()),
            ..Default::default()
        };
        let view = filter_tasks(&three_levels(), &criteria);
        let flat: Vec<&str> = flatten(&view).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(flat, vec!["r1", "a1", "g1"]);

        let none = FilterCriteria {
            status: Some(TaskStatus::Completed),
            ..criteria
        };
        assert!(filter_tasks(&three_levels(), &none).is_empty());
    }

    #[test]
    fn empty_strings_are_unset() {
        let criteria = FilterCriteria {
            search: Some(String::new()),
            assignee: Some("  ".into()),
            ..Default::default()
        };
        assert!(criteria.is_empty());
        assert_eq!(filter_tasks(&three_levels(), &criteria), three_levels());
    }

    #[test]
    fn sort_by_status_is_stable() {
        let mut tasks = vec![
            node("1", "a", TaskStatus::Pending),
            node("2", "b", TaskStatus::Completed),
            node("3", "c", TaskStatus::Pending),
            node("4", "d", TaskStatus::Completed),
            node("5", "e", TaskStatus::Overdue),
        ];
        sort_tasks(&mut tasks, SortKey::Status, SortDirection::Asc);
        // Atrasado < Completado < Pendiente
        assert_eq!(ids(&tasks), vec!["5", "2", "4", "1", "3"]);

        sort_tasks(&mut tasks, SortKey::Status, SortDirection::Desc);
        assert_eq!(ids(&tasks), vec!["1", "3", "2", "4", "5"]);
    }

    #[test]
    fn absent_values_sort_first_ascending() {
        let mut with = node("with", "a", TaskStatus::Pending);
        with.end_date = Some("2024-01-01".into());
        let mut later = node("later", "b", TaskStatus::Pending);
        later.end_date = Some("2024-12-01".into());
        let without = node("without", "c", TaskStatus::Pending);
        let mut tasks = vec![later, with, without];
        sort_tasks(&mut tasks, SortKey::EndDate, SortDirection::Asc);
        assert_eq!(ids(&tasks), vec!["without", "with", "later"]);
    }

    #[test]
    fn sort_applies_to_each_level_independently() {
        let mut tasks = three_levels();
        sort_tasks(&mut tasks, SortKey::Title, SortDirection::Asc);
        assert_eq!(ids(&tasks), vec!["r2", "r1"]);
        assert_eq!(ids(&tasks[1].subtasks), vec!["a2", "a1"]);
        assert_eq!(ids(&tasks[1].subtasks[1].subtasks), vec!["g2", "g1"]);
    }

    #[test]
    fn project_view_filters_then_sorts() {
        let criteria = FilterCriteria {
            department: Some("Escolares".into()),
            ..Default::default()
        };
        let view = project_view(
            &three_levels(),
            &criteria,
            Some((SortKey::Title, SortDirection::Desc)),
        );
        assert_eq!(ids(&view), vec!["r1", "r2"]);
        assert_eq!(SortKey::parse("start_date"), Some(SortKey::StartDate));
        assert_eq!(SortKey::parse("priority"), None);
    }
}
