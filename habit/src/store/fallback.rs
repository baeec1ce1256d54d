//! Degraded-mode transforms.
//!
//! Each function is the local stand-in for one server endpoint and is only
//! used when that endpoint fails. They approximate server behavior; they are
//! not authoritative.

use std::cmp::Reverse;

use chrono::NaiveDate;
use habit_proto::task::{Priority, Task};

/// Keeps tasks whose priority matches, case-insensitively.
///
/// Stand-in for `GET /tasks/by-priority`. Applied to whatever collection is
/// currently held, which may be stale.
#[must_use]
pub fn filter_by_priority(mut tasks: Vec<Task>, priority: &Priority) -> Vec<Task> {
    tasks.retain(|task| task.priority.matches(priority));
    tasks
}

/// Keeps tasks whose date range covers `date` (inclusive, open-ended when a
/// bound is missing).
///
/// Stand-in for `GET /tasks/active`.
#[must_use]
pub fn active_on(mut tasks: Vec<Task>, date: NaiveDate) -> Vec<Task> {
    tasks.retain(|task| task.covers(date));
    tasks
}

/// Stable sort, highest priority rank first.
///
/// Stand-in for `GET /tasks/sorted-by-priority`.
#[must_use]
pub fn sort_by_priority(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|task| Reverse(task.priority.rank()));
    tasks
}

/// Adds each task's daily target to its accumulated value.
///
/// Stand-in for `POST /tasks/process-daily-rollover`. Unlike the server it
/// cannot tell completed or inactive tasks apart and applies to all of them.
pub fn approximate_rollover(tasks: &mut [Task]) {
    for task in tasks {
        task.accumulated_value = Some(task.accumulated().saturating_add(task.daily_target()));
    }
}
