//! Per-task completion statistics. Read-only on the client.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::task::TaskId;

/// Completion aggregate for one task, as computed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStatistics {
    /// Task the statistics describe.
    pub task_id: TaskId,
    /// Task title at the time of the query.
    #[serde(default)]
    pub task_title: String,
    /// Number of recorded completions.
    #[serde(default)]
    pub total_completions: u32,
    /// Days between start and today (or end, if earlier), inclusive.
    #[serde(default)]
    pub total_possible_days: u32,
    /// Completions as a percentage of possible days.
    #[serde(default)]
    pub completion_rate: f64,
    /// Days with a completion, most recent first.
    #[serde(default)]
    pub completed_dates: Vec<NaiveDate>,
    /// Earliest completion.
    #[serde(default)]
    pub first_completion: Option<NaiveDate>,
    /// Latest completion.
    #[serde(default)]
    pub last_completion: Option<NaiveDate>,
}

impl CompletionStatistics {
    /// Completion dates, newest first, regardless of server order.
    #[must_use]
    pub fn history(&self) -> Vec<NaiveDate> {
        let mut dates = self.completed_dates.clone();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates
    }

    /// Whether a completion was recorded on `date`.
    #[must_use]
    pub fn completed_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.contains(&date)
    }

    /// Completion rate rounded to one decimal, e.g. `"42.9%"`.
    #[must_use]
    pub fn rate_label(&self) -> String {
        format!("{:.1}%", self.completion_rate)
    }
}
