//! Plain-text rendering for the terminal.
//!
//! Every function returns a `String`; printing is left to the caller so the
//! output can be asserted on in tests.

use std::fmt::Write as _;

use chrono::NaiveDate;
use habit_proto::dates;
use habit_proto::statistics::CompletionStatistics;
use habit_proto::task::Task;

use crate::form::ValidationFailure;

/// Renders model values with a configured date format.
#[derive(Debug, Clone)]
pub struct Renderer {
    date_format: String,
}

impl Renderer {
    /// Creates a renderer that formats dates with `date_format` (chrono
    /// syntax).
    #[must_use]
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    /// The chrono format dates are rendered with.
    #[must_use]
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    fn date(&self, date: Option<NaiveDate>) -> String {
        date.map_or_else(
            || "-".to_string(),
            |d| dates::format_date_with(d, &self.date_format),
        )
    }

    /// One task as a compact card.
    #[must_use]
    pub fn task_card(&self, task: &Task) -> String {
        let mut out = String::new();
        let status = if task.active { "Active" } else { "Inactive" };
        let _ = writeln!(out, "#{} {}", task.id, task.title);
        let _ = writeln!(out, "    {} | {}", task.priority.label(), status);
        let _ = writeln!(
            out,
            "    Daily target: {}  Accumulated: {}",
            task.daily_target(),
            task.accumulated()
        );
        let _ = writeln!(
            out,
            "    {} -> {}",
            self.date(task.start_date),
            self.date(task.end_date)
        );
        out
    }

    /// The task list, or the empty-state hint.
    #[must_use]
    pub fn task_list(&self, tasks: &[Task]) -> String {
        if tasks.is_empty() {
            return "No tasks found\nCreate your first task to get started!\n".to_string();
        }
        tasks.iter().map(|task| self.task_card(task)).collect()
    }

    /// Full details of one task.
    #[must_use]
    pub fn task_details(&self, task: &Task) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", task.title);
        let _ = writeln!(out, "{}", "=".repeat(task.title.chars().count().max(1)));
        if let Some(description) = task.description.as_deref().filter(|d| !d.trim().is_empty()) {
            let _ = writeln!(out, "{description}");
            out.push('\n');
        }
        let _ = writeln!(out, "Id:             {}", task.id);
        let _ = writeln!(out, "Priority:       {}", task.priority.label());
        let _ = writeln!(
            out,
            "Status:         {}",
            if task.active { "Active" } else { "Inactive" }
        );
        let _ = writeln!(out, "Daily target:   {}", task.daily_target());
        let _ = writeln!(out, "Accumulated:    {}", task.accumulated());
        let _ = writeln!(out, "Start date:     {}", self.date(task.start_date));
        let _ = writeln!(out, "End date:       {}", self.date(task.end_date));
        if let Some(days) = task.duration_days() {
            let _ = writeln!(out, "Duration:       {days} days");
        }
        let _ = writeln!(out, "Last processed: {}", self.date(task.last_processed_date));
        out
    }

    /// Completion statistics with the completion history.
    #[must_use]
    pub fn statistics(&self, stats: &CompletionStatistics) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Statistics");
        let _ = writeln!(out, "  Completion rate:   {}", stats.rate_label());
        let _ = writeln!(out, "  Total completions: {}", stats.total_completions);
        let _ = writeln!(out, "  Possible days:     {}", stats.total_possible_days);
        let _ = writeln!(out, "  First completion:  {}", self.date(stats.first_completion));
        let _ = writeln!(out, "  Last completion:   {}", self.date(stats.last_completion));
        out.push('\n');

        let history = stats.history();
        if history.is_empty() {
            let _ = writeln!(
                out,
                "No completions yet. Start completing tasks to see your progress!"
            );
            return out;
        }
        let _ = writeln!(out, "Completion History");
        for date in history {
            let marker = if dates::is_today(date) { " (today)" } else { "" };
            let _ = writeln!(out, "  * {}{marker}", self.date(Some(date)));
        }
        out
    }
}

/// An error banner with an optional retry hint.
#[must_use]
pub fn error_message(message: &str, retry_hint: Option<&str>) -> String {
    let mut out = format!("Oops! Something went wrong\n{message}\n");
    if let Some(hint) = retry_hint {
        let _ = writeln!(out, "{hint}");
    }
    out
}

/// Field-by-field validation errors.
#[must_use]
pub fn validation_errors(failure: &ValidationFailure) -> String {
    let mut out = String::from("Please fix the following:\n");
    for (field, message) in &failure.errors {
        let _ = writeln!(out, "  {field}: {message}");
    }
    out
}

/// A warning line for results that came from a local approximation.
#[must_use]
pub fn degraded_notice(what: &str) -> String {
    format!("note: the server could not {what}; showing a local approximation\n")
}
