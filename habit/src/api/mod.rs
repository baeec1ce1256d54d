//! Task API abstraction.
//!
//! Defines the [`TaskApi`] trait the store is written against, and the
//! uniform [`ApiError`] every implementation reports. Implementations:
//! - [`http::HttpTaskApi`]: reqwest client for the REST endpoints

pub mod http;

use std::collections::BTreeMap;
use std::future::Future;

use chrono::NaiveDate;
use habit_proto::statistics::CompletionStatistics;
use habit_proto::task::{CompletionRequest, Priority, Task, TaskDraft, TaskId};

pub use http::HttpTaskApi;

/// Errors reported by a [`TaskApi`].
///
/// Transport-level failures and non-success HTTP responses are both
/// normalized here; callers that only need text use
/// [`ApiError::message_or`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, timeout...).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server responded with status {status}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, when the server sent one.
        message: Option<String>,
        /// Per-field validation messages from the error body.
        field_errors: BTreeMap<String, String>,
    },

    /// A success response whose body could not be decoded.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The configured base URL cannot be combined with an endpoint path.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Builds a server error carrying only a status and optional message.
    #[must_use]
    pub fn server(status: u16, message: Option<&str>) -> Self {
        Self::Server {
            status,
            message: message.map(str::to_string),
            field_errors: BTreeMap::new(),
        }
    }

    /// The server-supplied message, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// The server-supplied message, or `fallback` when there is none.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    /// HTTP status, for errors that got as far as a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Per-field validation messages (empty unless the server sent some).
    #[must_use]
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        match self {
            Self::Server { field_errors, .. } => field_errors.clone(),
            _ => BTreeMap::new(),
        }
    }
}

/// Async access to the remote task API.
///
/// One method per endpoint. Implementations perform no retries and no
/// caching; every call is exactly one request.
pub trait TaskApi: Send + Sync {
    /// `GET /tasks`
    fn list_all(&self) -> impl Future<Output = Result<Vec<Task>, ApiError>> + Send;

    /// `GET /tasks/sorted-by-priority`
    fn list_sorted_by_priority(&self) -> impl Future<Output = Result<Vec<Task>, ApiError>> + Send;

    /// `GET /tasks/active?date=YYYY-MM-DD`; without a date the server uses
    /// its own today.
    fn list_active(
        &self,
        date: Option<NaiveDate>,
    ) -> impl Future<Output = Result<Vec<Task>, ApiError>> + Send;

    /// `GET /tasks/by-priority?priority=P`
    fn list_by_priority(
        &self,
        priority: &Priority,
    ) -> impl Future<Output = Result<Vec<Task>, ApiError>> + Send;

    /// `GET /tasks/{id}`
    fn get(&self, id: TaskId) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// `POST /tasks`
    fn create(&self, draft: &TaskDraft) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// `PUT /tasks/{id}`
    fn update(
        &self,
        id: TaskId,
        draft: &TaskDraft,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// `DELETE /tasks/{id}`
    fn delete(&self, id: TaskId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `POST /tasks/complete`
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `GET /tasks/{id}/statistics`
    fn statistics(
        &self,
        id: TaskId,
    ) -> impl Future<Output = Result<CompletionStatistics, ApiError>> + Send;

    /// `POST /tasks/process-daily-rollover`
    fn process_daily_rollover(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}
