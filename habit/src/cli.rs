//! Subcommands and their dispatch.
//!
//! Each subcommand corresponds to one screen of the task tracker: the task
//! list, the create and edit forms, and the detail view. Output is written
//! to a caller-supplied writer; failures come back as [`CliError`] for the
//! binary to report.

use std::fmt::Write as _;
use std::io::{self, Write};

use chrono::NaiveDate;
use habit_proto::dates::{self, DateParseError};
use habit_proto::task::{Priority, PriorityFilter, TaskId};

use crate::api::TaskApi;
use crate::form::{TaskForm, ValidationFailure};
use crate::render::{self, Renderer};
use crate::store::{FetchError, OperationFailed, SyncSource, TaskStore};

/// Task tracker commands.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List tasks (the default).
    List {
        /// Only tasks of this priority (LOW, MEDIUM, HIGH or ALL).
        #[arg(long, conflicts_with_all = ["active", "sorted"])]
        priority: Option<String>,

        /// Only tasks active on DATE (today when no date is given).
        #[arg(long, value_name = "DATE", num_args = 0..=1, value_parser = parse_date, conflicts_with = "sorted")]
        active: Option<Option<NaiveDate>>,

        /// Order by priority, highest first.
        #[arg(long)]
        sorted: bool,
    },

    /// Create a task.
    Create {
        /// Task title (3 to 200 characters).
        #[arg(long)]
        title: String,

        /// Optional description.
        #[arg(long, default_value = "")]
        description: String,

        /// Amount to do each day.
        #[arg(long)]
        daily_target: String,

        /// LOW, MEDIUM or HIGH.
        #[arg(long, default_value = "MEDIUM")]
        priority: Priority,

        /// First day (YYYY-MM-DD, default today).
        #[arg(long)]
        start: Option<String>,

        /// Last day (YYYY-MM-DD).
        #[arg(long)]
        end: String,
    },

    /// Show a task with its statistics.
    Show {
        /// Task id.
        id: TaskId,
    },

    /// Edit a task; omitted fields keep their current value.
    Edit {
        /// Task id.
        id: TaskId,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description (empty clears it).
        #[arg(long)]
        description: Option<String>,
        /// New daily target.
        #[arg(long)]
        daily_target: Option<String>,
        /// New priority.
        #[arg(long)]
        priority: Option<Priority>,
        /// New first day.
        #[arg(long)]
        start: Option<String>,
        /// New last day.
        #[arg(long)]
        end: Option<String>,
    },

    /// Delete a task.
    Delete {
        /// Task id.
        id: TaskId,
    },

    /// Mark a task completed.
    Complete {
        /// Task id.
        id: TaskId,
        /// Day the completion counts for (default today).
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Run the daily rollover and show the updated tasks.
    Rollover,
}

impl Default for Command {
    fn default() -> Self {
        Self::List {
            priority: None,
            active: None,
            sorted: false,
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    dates::parse_iso_date(raw)
}

/// Why a command failed.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Loading the task list failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A single-task operation failed.
    #[error(transparent)]
    Operation(#[from] OperationFailed),

    /// The form input was rejected before anything was sent.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Writing output failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// A hint to show under the error, if retrying makes sense.
    #[must_use]
    pub const fn retry_hint(&self) -> Option<&'static str> {
        match self {
            Self::Fetch(_) => Some("Check that the task API is reachable and try again."),
            Self::Operation(_) => Some("Try again in a moment."),
            Self::Validation(_) | Self::Io(_) => None,
        }
    }

    /// User-facing rendering of the error.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Validation(failure) => render::validation_errors(failure),
            Self::Operation(failed) if !failed.field_errors.is_empty() => {
                let mut out = render::error_message(&failed.message, None);
                for (field, message) in &failed.field_errors {
                    let _ = writeln!(out, "  {field}: {message}");
                }
                out
            }
            other => render::error_message(&other.to_string(), self.retry_hint()),
        }
    }
}

/// Runs one command against the store and writes its output to `out`.
///
/// # Errors
///
/// Returns [`CliError`] when the command's request, validation, or output
/// fails.
#[allow(clippy::too_many_lines)]
pub async fn run<A: TaskApi>(
    command: Command,
    store: &TaskStore<A>,
    renderer: &Renderer,
    out: &mut impl Write,
) -> Result<(), CliError> {
    tracing::debug!(?command, "running command");
    match command {
        Command::List {
            priority,
            active,
            sorted,
        } => {
            let source = match (priority, active) {
                (Some(priority), _) => {
                    let filter = PriorityFilter::parse(&priority);
                    // The fallback filters the held tasks, so load them first.
                    if matches!(filter, PriorityFilter::Only(_)) {
                        load_held_tasks(store).await;
                    }
                    store.filter_by_priority(filter).await?
                }
                (None, Some(date)) => store.get_active_tasks(date).await?,
                (None, None) if sorted => store.sort_by_priority().await?,
                (None, None) => {
                    store.fetch_all().await?;
                    SyncSource::Server
                }
            };
            if source.is_degraded() {
                write!(out, "{}", render::degraded_notice("apply this view"))?;
            }
            write!(out, "{}", renderer.task_list(&store.tasks()))?;
        }

        Command::Create {
            title,
            description,
            daily_target,
            priority,
            start,
            end,
        } => {
            let defaults = TaskForm::default();
            let form = TaskForm {
                title,
                description,
                daily_target_value: daily_target,
                priority,
                start_date: start.unwrap_or(defaults.start_date),
                end_date: end,
            };
            let draft = form.validate()?;
            let task = store.create_task(&draft).await?;
            writeln!(out, "Created task #{}", task.id)?;
            write!(out, "{}", renderer.task_card(&task))?;
        }

        Command::Show { id } => {
            let task = store.task(id).await?;
            write!(out, "{}", renderer.task_details(&task))?;
            writeln!(out)?;
            match store.statistics(id).await {
                Ok(stats) => write!(out, "{}", renderer.statistics(&stats))?,
                Err(err) => write!(out, "{}", render::error_message(&err.message, None))?,
            }
        }

        Command::Edit {
            id,
            title,
            description,
            daily_target,
            priority,
            start,
            end,
        } => {
            let current = store.task(id).await?;
            let mut form = TaskForm::from_task(&current);
            if let Some(title) = title {
                form.title = title;
            }
            if let Some(description) = description {
                form.description = description;
            }
            if let Some(daily_target) = daily_target {
                form.daily_target_value = daily_target;
            }
            if let Some(priority) = priority {
                form.priority = priority;
            }
            if let Some(start) = start {
                form.start_date = start;
            }
            if let Some(end) = end {
                form.end_date = end;
            }
            let draft = form.validate()?;
            let task = store.update_task(id, &draft).await?;
            writeln!(out, "Updated task #{}", task.id)?;
            write!(out, "{}", renderer.task_card(&task))?;
        }

        Command::Delete { id } => {
            store.delete_task(id).await?;
            writeln!(out, "Deleted task #{id}")?;
        }

        Command::Complete { id, date } => {
            let date = date.unwrap_or_else(dates::today);
            store.complete_task(id, date).await?;
            writeln!(
                out,
                "Completed task #{id} for {}",
                dates::format_date_with(date, renderer.date_format())
            )?;
        }

        Command::Rollover => {
            load_held_tasks(store).await;
            let source = store.process_daily_rollover().await;
            if source.is_degraded() {
                write!(out, "{}", render::degraded_notice("run the daily rollover"))?;
            } else {
                writeln!(out, "Daily rollover processed")?;
            }
            write!(out, "{}", renderer.task_list(&store.tasks()))?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Loads the full list so a local fallback has tasks to work on.
///
/// A failure is only logged; the operation that follows still runs.
async fn load_held_tasks<A: TaskApi>(store: &TaskStore<A>) {
    if let Err(err) = store.fetch_all().await {
        tracing::warn!(error = %err, "initial task load failed, continuing without held tasks");
    }
}
