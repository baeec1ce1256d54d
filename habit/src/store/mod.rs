//! Task synchronization store.
//!
//! [`TaskStore`] owns the task collection for one view and keeps it in step
//! with the server. Three of its operations (priority filter, active-date
//! filter, priority sort) and the daily rollover have a second, degraded
//! path: when the preferred endpoint fails, a transform from [`fallback`]
//! produces an approximation instead. Degradations are logged as warnings
//! and never reported as errors.
//!
//! # Stale responses
//!
//! Every fetch-class operation takes a generation ticket when it starts.
//! Its result is written only if no newer fetch-class operation has started
//! since; otherwise the response is dropped. Two overlapping filters
//! therefore resolve to the one the user asked for last.

pub mod fallback;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use habit_proto::dates;
use habit_proto::statistics::CompletionStatistics;
use habit_proto::task::{CompletionRequest, PriorityFilter, Task, TaskDraft, TaskId};
use parking_lot::Mutex;

use crate::api::{ApiError, TaskApi};

const FETCH_TASKS_FAILED: &str = "Failed to fetch tasks";
const DELETE_TASK_FAILED: &str = "Failed to delete task";
const COMPLETE_TASK_FAILED: &str = "Failed to complete task";
const ACTIVE_TASKS_FAILED: &str = "Failed to fetch active tasks";
const SORT_TASKS_FAILED: &str = "Failed to sort tasks";
const SAVE_TASK_FAILED: &str = "Failed to save task";
const TASK_DETAILS_FAILED: &str = "Failed to fetch task details";
const STATISTICS_FAILED: &str = "Failed to fetch statistics";

/// Snapshot of what the view shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Tasks in display order.
    pub tasks: Vec<Task>,
    /// A fetch-class request is outstanding.
    pub loading: bool,
    /// Last error message, cleared when a fetch-class operation starts.
    pub error: Option<String>,
}

/// A full-list fetch failed. The previous collection is kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    /// Human-readable reason.
    pub message: String,
}

/// A single operation failed; carries text fit for the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct OperationFailed {
    /// Human-readable reason.
    pub message: String,
    /// Per-field messages from server-side validation, if any.
    pub field_errors: BTreeMap<String, String>,
}

impl OperationFailed {
    fn from_api(err: &ApiError, fallback: &str) -> Self {
        Self {
            message: err.message_or(fallback),
            field_errors: err.field_errors(),
        }
    }
}

/// Which path produced the current collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSource {
    /// The preferred server endpoint answered.
    Server,
    /// The endpoint failed and a local approximation was applied.
    LocalFallback,
}

impl SyncSource {
    /// Whether the result is a local approximation.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::LocalFallback)
    }
}

struct Inner {
    view: ViewState,
    generation: u64,
}

/// Owns the task collection for a view and reconciles it with the server.
///
/// All methods take `&self`; the view state sits behind a mutex that is
/// never held across an await.
pub struct TaskStore<A: TaskApi> {
    api: A,
    inner: Mutex<Inner>,
}

impl<A: TaskApi> TaskStore<A> {
    /// Creates an empty, idle store. Call [`fetch_all`](Self::fetch_all)
    /// to load.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            inner: Mutex::new(Inner {
                view: ViewState::default(),
                generation: 0,
            }),
        }
    }

    /// The underlying API.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Snapshot of the whole view state.
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.inner.lock().view.clone()
    }

    /// Tasks currently held, in display order.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.lock().view.tasks.clone()
    }

    /// Whether a fetch-class request is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.lock().view.loading
    }

    /// The last error message, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.inner.lock().view.error.clone()
    }

    // -----------------------------------------------------------------------
    // Fetch-class operations
    // -----------------------------------------------------------------------

    /// Replaces the collection with the server's full task list.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails. The error is also
    /// recorded in the view state and the previous collection is kept.
    pub async fn fetch_all(&self) -> Result<(), FetchError> {
        let ticket = self.begin();
        match self.api.list_all().await {
            Ok(tasks) => {
                self.finish(ticket, |view| view.tasks = tasks);
                Ok(())
            }
            Err(err) => Err(self.fail(ticket, &err, FETCH_TASKS_FAILED)),
        }
    }

    /// Shows only tasks of one priority.
    ///
    /// An empty or `ALL` selection is a plain [`fetch_all`](Self::fetch_all).
    /// If the filter endpoint fails, the tasks already held are filtered
    /// locally instead; no fresh list is fetched, so the result may be stale.
    ///
    /// # Errors
    ///
    /// Only the `ALL` path can fail, with the [`fetch_all`](Self::fetch_all)
    /// error.
    pub async fn filter_by_priority(
        &self,
        filter: impl Into<PriorityFilter>,
    ) -> Result<SyncSource, FetchError> {
        let PriorityFilter::Only(priority) = filter.into() else {
            return self.fetch_all().await.map(|()| SyncSource::Server);
        };

        let ticket = self.begin();
        match self.api.list_by_priority(&priority).await {
            Ok(tasks) => {
                self.finish(ticket, |view| view.tasks = tasks);
                Ok(SyncSource::Server)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    %priority,
                    "priority filter request failed, filtering held tasks locally"
                );
                self.finish(ticket, |view| {
                    let held = std::mem::take(&mut view.tasks);
                    view.tasks = fallback::filter_by_priority(held, &priority);
                });
                Ok(SyncSource::LocalFallback)
            }
        }
    }

    /// Shows tasks active on `date` (today when `None`).
    ///
    /// If the active-tasks endpoint fails, the full list is fetched fresh
    /// and filtered by date range locally.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if both the endpoint and the full-list
    /// fallback fetch fail.
    pub async fn get_active_tasks(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<SyncSource, FetchError> {
        let ticket = self.begin();
        let err = match self.api.list_active(date).await {
            Ok(tasks) => {
                self.finish(ticket, |view| view.tasks = tasks);
                return Ok(SyncSource::Server);
            }
            Err(err) => err,
        };

        tracing::warn!(error = %err, "active tasks request failed, filtering full list locally");
        let target = date.unwrap_or_else(dates::today);
        match self.api.list_all().await {
            Ok(all) => {
                self.finish(ticket, |view| view.tasks = fallback::active_on(all, target));
                Ok(SyncSource::LocalFallback)
            }
            Err(err) => Err(self.fail(ticket, &err, ACTIVE_TASKS_FAILED)),
        }
    }

    /// Shows every task ordered HIGH, MEDIUM, LOW.
    ///
    /// If the sorted endpoint fails, the full list is fetched fresh and
    /// stable-sorted locally.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if both the endpoint and the full-list
    /// fallback fetch fail.
    pub async fn sort_by_priority(&self) -> Result<SyncSource, FetchError> {
        let ticket = self.begin();
        let err = match self.api.list_sorted_by_priority().await {
            Ok(tasks) => {
                self.finish(ticket, |view| view.tasks = tasks);
                return Ok(SyncSource::Server);
            }
            Err(err) => err,
        };

        tracing::warn!(error = %err, "sorted tasks request failed, sorting full list locally");
        match self.api.list_all().await {
            Ok(all) => {
                self.finish(ticket, |view| view.tasks = fallback::sort_by_priority(all));
                Ok(SyncSource::LocalFallback)
            }
            Err(err) => Err(self.fail(ticket, &err, SORT_TASKS_FAILED)),
        }
    }

    /// Runs the daily rollover.
    ///
    /// On success the full list is reloaded to pick up the server's new
    /// accumulated values. If the rollover endpoint fails, every held task
    /// gets its daily target added locally; the returned
    /// [`SyncSource::LocalFallback`] tells the caller those numbers are an
    /// estimate that ignores the server's exclusions.
    pub async fn process_daily_rollover(&self) -> SyncSource {
        let ticket = self.begin();
        match self.api.process_daily_rollover().await {
            Ok(()) => {
                if let Err(err) = self.fetch_all().await {
                    tracing::debug!(error = %err, "reload after rollover failed");
                }
                SyncSource::Server
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "rollover request failed, applying local approximation to held tasks"
                );
                self.finish(ticket, |view| fallback::approximate_rollover(&mut view.tasks));
                SyncSource::LocalFallback
            }
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Deletes a task and drops it from the collection without refetching.
    ///
    /// # Errors
    ///
    /// Returns [`OperationFailed`] if the request fails; the collection is
    /// left untouched.
    pub async fn delete_task(&self, id: TaskId) -> Result<(), OperationFailed> {
        match self.api.delete(id).await {
            Ok(()) => {
                self.inner.lock().view.tasks.retain(|task| task.id != id);
                tracing::info!(%id, "task deleted");
                Ok(())
            }
            Err(err) => Err(self.record_failure(&err, DELETE_TASK_FAILED)),
        }
    }

    /// Marks a task completed for `completion_date`.
    ///
    /// Completing for today drops the task from the collection, since it no
    /// longer belongs in the default view. Any other date triggers a full
    /// reload so recomputed accumulated values show up.
    ///
    /// # Errors
    ///
    /// Returns [`OperationFailed`] if the completion request fails. A failed
    /// reload afterwards is recorded in the view state only.
    pub async fn complete_task(
        &self,
        id: TaskId,
        completion_date: NaiveDate,
    ) -> Result<(), OperationFailed> {
        let request = CompletionRequest {
            task_id: id,
            completion_date,
        };
        if let Err(err) = self.api.complete(&request).await {
            return Err(self.record_failure(&err, COMPLETE_TASK_FAILED));
        }

        tracing::info!(%id, date = %completion_date, "task completed");
        if dates::is_today(completion_date) {
            self.inner.lock().view.tasks.retain(|task| task.id != id);
        } else if let Err(err) = self.fetch_all().await {
            tracing::debug!(error = %err, "reload after completion failed");
        }
        Ok(())
    }

    /// Creates a task from a validated draft.
    ///
    /// The collection is not touched; the next fetch picks the task up.
    ///
    /// # Errors
    ///
    /// Returns [`OperationFailed`] with the server's message and field
    /// errors when the request fails.
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Task, OperationFailed> {
        self.api
            .create(draft)
            .await
            .inspect(|task| tracing::info!(id = %task.id, "task created"))
            .map_err(|err| OperationFailed::from_api(&err, SAVE_TASK_FAILED))
    }

    /// Replaces a task's fields with a validated draft.
    ///
    /// # Errors
    ///
    /// Returns [`OperationFailed`] with the server's message and field
    /// errors when the request fails.
    pub async fn update_task(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, OperationFailed> {
        self.api
            .update(id, draft)
            .await
            .inspect(|_| tracing::info!(%id, "task updated"))
            .map_err(|err| OperationFailed::from_api(&err, SAVE_TASK_FAILED))
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Loads one task's details.
    ///
    /// # Errors
    ///
    /// Returns [`OperationFailed`] if the request fails.
    pub async fn task(&self, id: TaskId) -> Result<Task, OperationFailed> {
        self.api
            .get(id)
            .await
            .map_err(|err| OperationFailed::from_api(&err, TASK_DETAILS_FAILED))
    }

    /// Loads one task's completion statistics.
    ///
    /// # Errors
    ///
    /// Returns [`OperationFailed`] if the request fails.
    pub async fn statistics(&self, id: TaskId) -> Result<CompletionStatistics, OperationFailed> {
        self.api
            .statistics(id)
            .await
            .map_err(|err| OperationFailed::from_api(&err, STATISTICS_FAILED))
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Starts a fetch-class operation and returns its ticket.
    fn begin(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.view.loading = true;
        inner.view.error = None;
        inner.generation
    }

    /// Applies a result if `ticket` is still the newest operation.
    fn finish(&self, ticket: u64, apply: impl FnOnce(&mut ViewState)) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != ticket {
            tracing::debug!(ticket, current = inner.generation, "discarding stale response");
            return false;
        }
        apply(&mut inner.view);
        inner.view.loading = false;
        true
    }

    /// Records a fetch-class failure, keeping the collection.
    fn fail(&self, ticket: u64, err: &ApiError, fallback: &str) -> FetchError {
        let message = err.message_or(fallback);
        tracing::error!(error = %err, reason = %message, "fetch failed");
        let recorded = message.clone();
        self.finish(ticket, |view| view.error = Some(recorded));
        FetchError { message }
    }

    /// Records a mutation failure in the view state.
    fn record_failure(&self, err: &ApiError, fallback: &str) -> OperationFailed {
        let failure = OperationFailed::from_api(err, fallback);
        tracing::error!(error = %err, reason = %failure.message, "operation failed");
        self.inner.lock().view.error = Some(failure.message.clone());
        failure
    }
}
