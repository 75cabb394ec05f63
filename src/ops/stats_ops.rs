use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use crate::model::task::{Task, TaskKind, TaskStatus, parse_ymd};
use crate::ops::view_ops::flatten;

/// Count every node at every depth, keyed by its own department.
///
/// Keys appear in the order the departments are first met in pre-order.
pub fn count_by_department(tasks: &[Task]) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    for task in flatten(tasks) {
        *counts.entry(task.department.clone()).or_insert(0) += 1;
    }
    counts
}

/// Aggregate indicators over a set of tasks (all depths)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub processes: usize,
    pub specific_tasks: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
    /// Percentage of nodes that are completed, 0.0 when there are none
    pub completion_rate: f64,
    /// Not completed, with an end date before the reference day
    pub past_due: usize,
}

impl Kpis {
    pub fn count(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Pending => self.pending,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Completed => self.completed,
            TaskStatus::Overdue => self.overdue,
        }
    }
}

/// Compute KPIs over `tasks` and all their descendants.
///
/// `today` is only used for `past_due`; statuses are reported as stored and
/// never derived from dates.
pub fn compute_kpis(tasks: &[Task], today: NaiveDate) -> Kpis {
    let mut kpis = Kpis::default();
    for task in flatten(tasks) {
        kpis.total += 1;
        match task.kind() {
            TaskKind::Process => kpis.processes += 1,
            TaskKind::Specific => kpis.specific_tasks += 1,
        }
        match task.status {
            TaskStatus::Pending => kpis.pending += 1,
            TaskStatus::InProgress => kpis.in_progress += 1,
            TaskStatus::Completed => kpis.completed += 1,
            TaskStatus::Overdue => kpis.overdue += 1,
        }
        if task.status != TaskStatus::Completed
            && task
                .end_date
                .as_deref()
                .and_then(parse_ymd)
                .is_some_and(|end| end < today)
        {
            kpis.past_due += 1;
        }
    }
    if kpis.total > 0 {
        kpis.completion_rate = kpis.completed as f64 * 100.0 / kpis.total as f64;
    }
    kpis
}
