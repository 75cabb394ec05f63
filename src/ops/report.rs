//! Text rendering handed to the analysis model.
//!
//! The model call lives outside this crate; everything here is a pure,
//! deterministic projection of the task tree.

use crate::model::settings::AppSettings;
use crate::model::task::Task;
use crate::ops::stats_ops::Kpis;
use crate::ops::view_ops::flatten_with_depth;

/// One line per node in pre-order, indented two spaces per depth:
///
/// `- [Process] Title | 2024-03-01..2024-03-31 | Pendiente | Ana`
pub fn render_outline(tasks: &[Task]) -> String {
    let mut out = String::new();
    for (depth, task) in flatten_with_depth(tasks) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&outline_line(task));
        out.push('\n');
    }
    out
}

fn outline_line(task: &Task) -> String {
    format!(
        "- [{}] {} | {} | {} | {}",
        task.kind().label(),
        task.title,
        date_range(task),
        task.status,
        task.assignee.as_deref().unwrap_or("unassigned"),
    )
}

fn date_range(task: &Task) -> String {
    match (task.start_date.as_deref(), task.end_date.as_deref()) {
        (None, None) => "no dates".to_string(),
        (start, end) => format!("{}..{}", start.unwrap_or("?"), end.unwrap_or("?")),
    }
}

/// Build the efficiency-analysis prompt for a department (or all of them).
///
/// `tasks` is the already-filtered list of top-level tasks with their
/// subtasks intact.
pub fn build_analysis_prompt(
    settings: &AppSettings,
    department: Option<&str>,
    tasks: &[Task],
    kpis: &Kpis,
) -> String {
    let scope = department.unwrap_or("all departments");
    let mut out = String::new();
    out.push_str(&format!(
        "You are reviewing administrative work at {} ({}).\n",
        settings.name, settings.time_zone
    ));
    out.push_str(&format!("Scope: {}\n\n", scope));

    out.push_str("Indicators:\n");
    out.push_str(&format!(
        "- total: {} ({} processes, {} specific tasks)\n",
        kpis.total, kpis.processes, kpis.specific_tasks
    ));
    out.push_str(&format!(
        "- pending: {}, in progress: {}, completed: {}, overdue: {}\n",
        kpis.pending, kpis.in_progress, kpis.completed, kpis.overdue
    ));
    out.push_str(&format!(
        "- completion rate: {:.1}%, past end date: {}\n\n",
        kpis.completion_rate, kpis.past_due
    ));

    out.push_str("Processes and tasks:\n");
    if tasks.is_empty() {
        out.push_str("(none)\n");
    } else {
        out.push_str(&render_outline(tasks));
    }

    out.push_str(
        "\nAssess the efficiency of this work: identify bottlenecks, overdue or \
         stalled items, workload balance across assignees, and give concrete \
         recommendations.\n",
    );
    out
}
