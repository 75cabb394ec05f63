use indexmap::IndexMap;
use serde::Serialize;

use crate::model::task::{Task, TaskStatus};
use crate::ops::stats_ops::Kpis;
use crate::util::unicode::{display_width, pad_to_width, truncate_to_width};

/// Titles longer than this are cut in tree listings
const TITLE_WIDTH: usize = 60;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ShowJson<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ancestors: Vec<&'a str>,
    #[serde(flatten)]
    pub task: &'a Task,
}

#[derive(Serialize)]
pub struct FlatTaskJson<'a> {
    pub depth: usize,
    #[serde(flatten)]
    pub task: FlatTask<'a>,
}

/// A task without its subtasks, for flat listings
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatTask<'a> {
    pub id: &'a str,
    pub department: &'a str,
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<&'a str>,
    pub is_specific_task: bool,
    pub status: TaskStatus,
}

impl<'a> From<&'a Task> for FlatTask<'a> {
    fn from(task: &'a Task) -> Self {
        FlatTask {
            id: &task.id,
            department: &task.department,
            title: &task.title,
            start_date: task.start_date.as_deref(),
            end_date: task.end_date.as_deref(),
            assignee: task.assignee.as_deref(),
            is_specific_task: task.is_specific_task,
            status: task.status,
        }
    }
}

#[derive(Serialize)]
pub struct StatsJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<&'a str>,
    pub today: String,
    pub kpis: &'a Kpis,
    pub by_department: &'a IndexMap<String, usize>,
}

#[derive(Serialize)]
pub struct DepartmentJson<'a> {
    pub name: &'a str,
    pub tasks: usize,
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

pub fn status_symbol(status: TaskStatus) -> char {
    match status {
        TaskStatus::Pending => '○',
        TaskStatus::InProgress => '▸',
        TaskStatus::Completed => '✓',
        TaskStatus::Overdue => '!',
    }
}

/// One-line summary: `✓ T-004 Title  [Finanzas] @Ana 2024-03-01..2024-03-31`
pub fn format_task_line(task: &Task) -> String {
    let mut line = format!(
        "{} {} {}",
        status_symbol(task.status),
        task.id,
        truncate_to_width(&task.title, TITLE_WIDTH)
    );
    if task.is_specific_task {
        line.push_str(" (task)");
    }
    line.push_str(&format!("  [{}]", task.department));
    if let Some(assignee) = &task.assignee {
        line.push_str(&format!(" @{}", assignee));
    }
    match (&task.start_date, &task.end_date) {
        (None, None) => {}
        (start, end) => line.push_str(&format!(
            " {}..{}",
            start.as_deref().unwrap_or("?"),
            end.as_deref().unwrap_or("?")
        )),
    }
    line
}

/// A task and its subtasks, two spaces of indent per level
pub fn format_task_tree(task: &Task, depth: usize) -> Vec<String> {
    let mut lines = vec![format!("{}{}", "  ".repeat(depth), format_task_line(task))];
    for sub in &task.subtasks {
        lines.extend(format_task_tree(sub, depth + 1));
    }
    lines
}

/// Full detail for `show`
pub fn format_task_detail(task: &Task, ancestors: &[&Task]) -> Vec<String> {
    let mut lines = Vec::new();
    if !ancestors.is_empty() {
        let chain: Vec<String> = ancestors
            .iter()
            .map(|a| format!("{} {}", a.id, a.title))
            .collect();
        lines.push(format!("in: {}", chain.join(" > ")));
    }
    lines.push(format!("{} {} {}", status_symbol(task.status), task.id, task.title));
    lines.push(format!("type: {}", task.kind().label()));
    lines.push(format!("status: {}", task.status));
    lines.push(format!("department: {}", task.department));
    if let Some(a) = &task.assignee {
        lines.push(format!("assignee: {}", a));
    }
    if let Some(d) = &task.start_date {
        lines.push(format!("start: {}", d));
    }
    if let Some(d) = &task.end_date {
        lines.push(format!("end: {}", d));
    }
    if let Some(desc) = &task.description {
        lines.push("description:".to_string());
        for line in desc.lines() {
            lines.push(format!("  {}", line));
        }
    }

    if !task.resources.is_empty() {
        lines.push(String::new());
        lines.push("resources:".to_string());
        for r in &task.resources {
            let category = if r.category.is_empty() {
                String::new()
            } else {
                format!(" ({})", r.category)
            };
            lines.push(format!("  {} [{}] {}{} {}", r.id, r.kind, r.name, category, r.url));
        }
    }

    if !task.subtasks.is_empty() {
        lines.push(String::new());
        lines.push("subtasks:".to_string());
        for sub in &task.subtasks {
            lines.extend(format_task_tree(sub, 1));
        }
    }
    lines
}

/// KPI block plus an aligned per-department table
pub fn format_stats(kpis: &Kpis, by_department: &IndexMap<String, usize>) -> Vec<String> {
    let mut lines = vec![
        format!(
            "total {}  ({} processes, {} tasks)",
            kpis.total, kpis.processes, kpis.specific_tasks
        ),
        TaskStatus::ALL
            .iter()
            .map(|&st| format!("{} {} {}", status_symbol(st), kpis.count(st), st.key().replace('-', " ")))
            .collect::<Vec<_>>()
            .join("  "),
        format!(
            "completion {:.1}%  past end date {}",
            kpis.completion_rate, kpis.past_due
        ),
    ];
    if !by_department.is_empty() {
        lines.push(String::new());
        let width = by_department.keys().map(|k| display_width(k)).max().unwrap_or(0);
        for (dept, count) in by_department {
            lines.push(format!("  {}  {:>4}", pad_to_width(dept, width), count));
        }
    }
    lines
}
