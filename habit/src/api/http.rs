//! HTTP implementation of [`TaskApi`] over reqwest.
//!
//! Every request is logged with its method and fully resolved URL. Requests
//! aimed at the configured backend host that miss the expected path prefix
//! (usually `/api/`) get an extra warning; this is purely diagnostic and
//! never changes what is sent.

use chrono::NaiveDate;
use habit_proto::dates::format_iso_date;
use habit_proto::error::ServerErrorBody;
use habit_proto::statistics::CompletionStatistics;
use habit_proto::task::{CompletionRequest, Priority, Task, TaskDraft, TaskId};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::{ApiError, TaskApi};
use crate::config::ApiSettings;

/// reqwest-backed task API client.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: Url,
    diagnostic_host: String,
    expected_path_prefix: String,
}

impl HttpTaskApi {
    /// Builds a client from resolved API settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the base URL does not parse, or
    /// [`ApiError::Transport`] if the underlying HTTP client cannot be built.
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", settings.base_url)))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            diagnostic_host: settings.diagnostic_host.clone(),
            expected_path_prefix: settings.expected_path_prefix.clone(),
        })
    }

    /// The base URL endpoint paths are appended to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an endpoint path against the base URL.
    ///
    /// The path is appended rather than joined, so a base of
    /// `http://host/api` yields `http://host/api/tasks`.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}{path}", self.base_url.as_str().trim_end_matches('/'));
        Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))
    }

    fn log_request(&self, method: &Method, url: &Url) {
        tracing::info!(method = %method, url = %url, "api request");
        if missing_path_prefix(url, &self.diagnostic_host, &self.expected_path_prefix) {
            tracing::warn!(
                url = %url,
                prefix = %self.expected_path_prefix,
                "request to backend missing expected path prefix"
            );
        }
    }

    /// Sends one request and turns non-success statuses into
    /// [`ApiError::Server`].
    async fn execute<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.log_request(&method, &url);

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.inspect_err(|e| {
            tracing::error!(error = %e, "api request failed");
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = ServerErrorBody::parse(&text).unwrap_or_default();
        log_error_response(status, &body, &text);

        Err(ApiError::Server {
            status: status.as_u16(),
            message: body.message().map(str::to_string),
            field_errors: body.field_errors.unwrap_or_default(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.execute::<()>(Method::GET, url, None).await?;
        decode(response).await
    }
}

/// Whether `url` targets `host` (as `host[:port]`) without `prefix` in its
/// path.
fn missing_path_prefix(url: &Url, host: &str, prefix: &str) -> bool {
    if host.is_empty() || prefix.is_empty() {
        return false;
    }
    let authority = match (url.host_str(), url.port()) {
        (Some(h), Some(p)) => format!("{h}:{p}"),
        (Some(h), None) => h.to_string(),
        (None, _) => return false,
    };
    authority.eq_ignore_ascii_case(host) && !url.path().contains(prefix)
}

fn log_error_response(status: StatusCode, body: &ServerErrorBody, raw: &str) {
    let detail = body.message().unwrap_or(raw);
    match status {
        StatusCode::NOT_FOUND => tracing::error!(%status, detail, "resource not found"),
        StatusCode::BAD_REQUEST => tracing::error!(
            %status,
            detail,
            fields = ?body.field_errors,
            "bad request"
        ),
        s if s.is_server_error() => tracing::error!(%status, detail, "server error"),
        _ => tracing::error!(%status, detail, "api error"),
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

impl TaskApi for HttpTaskApi {
    async fn list_all(&self) -> Result<Vec<Task>, ApiError> {
        self.get_json(self.endpoint("/tasks")?).await
    }

    async fn list_sorted_by_priority(&self) -> Result<Vec<Task>, ApiError> {
        self.get_json(self.endpoint("/tasks/sorted-by-priority")?)
            .await
    }

    async fn list_active(&self, date: Option<NaiveDate>) -> Result<Vec<Task>, ApiError> {
        let mut url = self.endpoint("/tasks/active")?;
        if let Some(date) = date {
            url.query_pairs_mut()
                .append_pair("date", &format_iso_date(date));
        }
        self.get_json(url).await
    }

    async fn list_by_priority(&self, priority: &Priority) -> Result<Vec<Task>, ApiError> {
        let mut url = self.endpoint("/tasks/by-priority")?;
        url.query_pairs_mut()
            .append_pair("priority", priority.as_str());
        self.get_json(url).await
    }

    async fn get(&self, id: TaskId) -> Result<Task, ApiError> {
        self.get_json(self.endpoint(&format!("/tasks/{id}"))?).await
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        let url = self.endpoint("/tasks")?;
        let response = self.execute(Method::POST, url, Some(draft)).await?;
        decode(response).await
    }

    async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, ApiError> {
        let url = self.endpoint(&format!("/tasks/{id}"))?;
        let response = self.execute(Method::PUT, url, Some(draft)).await?;
        decode(response).await
    }

    async fn delete(&self, id: TaskId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/tasks/{id}"))?;
        self.execute::<()>(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<(), ApiError> {
        let url = self.endpoint("/tasks/complete")?;
        self.execute(Method::POST, url, Some(request)).await?;
        Ok(())
    }

    async fn statistics(&self, id: TaskId) -> Result<CompletionStatistics, ApiError> {
        self.get_json(self.endpoint(&format!("/tasks/{id}/statistics"))?)
            .await
    }

    async fn process_daily_rollover(&self) -> Result<(), ApiError> {
        let url = self.endpoint("/tasks/process-daily-rollover")?;
        self.execute::<()>(Method::POST, url, None).await?;
        Ok(())
    }
}
