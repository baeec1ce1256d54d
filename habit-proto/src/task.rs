//! Task model as exchanged with the task API.
//!
//! Responses are decoded leniently (see [`Task`]); request bodies
//! ([`TaskDraft`], [`CompletionRequest`]) are strict and only produced by
//! validated client code.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::lenient;

/// Minimum task title length in characters.
pub const MIN_TITLE_LENGTH: usize = 3;

/// Maximum task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Smallest accepted daily target.
pub const MIN_DAILY_TARGET: i64 = 1;

/// Server-assigned task identifier.
///
/// Opaque to the client: it is only compared, displayed, and sent back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A string that is not a task identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid task id {0:?}")]
pub struct InvalidTaskId(pub String);

impl FromStr for TaskId {
    type Err = InvalidTaskId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| InvalidTaskId(s.to_string()))
    }
}

/// Task priority.
///
/// Known levels are matched case-insensitively. Anything else the server
/// sends is preserved in [`Priority::Other`] and ranks below every known
/// level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
    /// Unrecognized or missing value, kept verbatim.
    Other(String),
}

impl Priority {
    /// The three levels a user can pick, lowest first.
    pub const LEVELS: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Reads a priority, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "LOW" => Self::Low,
            "MEDIUM" => Self::Medium,
            "HIGH" => Self::High,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Sort rank: HIGH=3, MEDIUM=2, LOW=1, anything else 0.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Other(_) => 0,
        }
    }

    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Other(raw) => raw,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Low => "Low Priority".to_string(),
            Self::Medium => "Medium Priority".to_string(),
            Self::High => "High Priority".to_string(),
            Self::Other(raw) if raw.is_empty() => "No Priority".to_string(),
            Self::Other(raw) => raw.clone(),
        }
    }

    /// Case-insensitive comparison of wire representations.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }

    /// Whether this is one of the three known levels.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<Option<String>> for Priority {
    fn from(raw: Option<String>) -> Self {
        raw.map_or_else(Self::default, |s| Self::parse(&s))
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        priority.as_str().to_string()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A priority argument that is not LOW, MEDIUM, or HIGH.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority {0:?} (expected LOW, MEDIUM or HIGH)")]
pub struct UnknownPriority(pub String);

impl FromStr for Priority {
    type Err = UnknownPriority;

    /// Strict parse for user input: only the three known levels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parse(s) {
            Self::Other(raw) => Err(UnknownPriority(raw)),
            known => Ok(known),
        }
    }
}

/// Priority filter selection. Empty input and `ALL` mean no filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorityFilter {
    /// Show every task.
    All,
    /// Show tasks with this priority only.
    Only(Priority),
}

impl PriorityFilter {
    /// Reads a filter selection, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("ALL") {
            Self::All
        } else {
            Self::Only(Priority::parse(trimmed))
        }
    }
}

impl From<&str> for PriorityFilter {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<Option<Priority>> for PriorityFilter {
    fn from(priority: Option<Priority>) -> Self {
        priority.map_or(Self::All, Self::Only)
    }
}

/// A task as returned by the API.
///
/// `accumulated_value` and `daily_target_value` are `None` when the server
/// omitted them or sent something non-numeric; arithmetic treats that as
/// zero via [`Task::accumulated`] and [`Task::daily_target`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Server-assigned identifier.
    pub id: TaskId,
    /// Task title.
    #[serde(default)]
    pub title: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Amount to do each day.
    #[serde(default, deserialize_with = "lenient::int")]
    pub daily_target_value: Option<i64>,
    /// Outstanding amount, maintained by the server's rollover rules.
    #[serde(default, deserialize_with = "lenient::int")]
    pub accumulated_value: Option<i64>,
    /// Task priority.
    #[serde(default)]
    pub priority: Priority,
    /// First day the task applies.
    #[serde(default, deserialize_with = "lenient::date")]
    pub start_date: Option<NaiveDate>,
    /// Last day the task applies.
    #[serde(default, deserialize_with = "lenient::date")]
    pub end_date: Option<NaiveDate>,
    /// Day the last rollover was applied.
    #[serde(default, deserialize_with = "lenient::date")]
    pub last_processed_date: Option<NaiveDate>,
    /// Server-derived activity flag.
    #[serde(default)]
    pub active: bool,
}

impl Task {
    /// Accumulated value, absent counting as zero.
    #[must_use]
    pub fn accumulated(&self) -> i64 {
        self.accumulated_value.unwrap_or(0)
    }

    /// Daily target, absent counting as zero.
    #[must_use]
    pub fn daily_target(&self) -> i64 {
        self.daily_target_value.unwrap_or(0)
    }

    /// Whether the task's date range covers `date`.
    ///
    /// Both ends are inclusive and a missing bound is unbounded.
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| start <= date)
            && self.end_date.is_none_or(|end| end >= date)
    }

    /// Number of days in the task's range, when both bounds are known.
    #[must_use]
    pub fn duration_days(&self) -> Option<u64> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(dates::days_between(start, end) + 1),
            _ => None,
        }
    }
}

/// Create/update request body: every task field the client controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    /// Task title, 3 to 200 characters.
    pub title: String,
    /// Optional description, up to 1000 characters.
    pub description: Option<String>,
    /// Daily target, at least 1.
    pub daily_target_value: i64,
    /// One of the known priority levels.
    pub priority: Priority,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day, not before `start_date`.
    pub end_date: NaiveDate,
}

/// Body of `POST /tasks/complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    /// Task being completed.
    pub task_id: TaskId,
    /// Day the completion counts for.
    pub completion_date: NaiveDate,
}
