//! Integration tests for the task store over HTTP.
//!
//! Runs `TaskStore<HttpTaskApi>` against a wiremock server standing in for
//! the task API: full-list loads, deletion, completion, create/update with
//! server-side validation errors, and the CLI commands on top.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::too_many_lines)]

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use habit::api::{HttpTaskApi, TaskApi};
use habit::cli::{self, CliError, Command};
use habit::config::ApiSettings;
use habit::render::Renderer;
use habit::store::TaskStore;
use habit_proto::dates;
use habit_proto::task::{Priority, TaskDraft, TaskId};

// =============================================================================
// Helpers
// =============================================================================

fn settings(server: &MockServer) -> ApiSettings {
    ApiSettings {
        base_url: format!("{}/api", server.uri()),
        request_timeout: Some(Duration::from_secs(5)),
        ..ApiSettings::default()
    }
}

fn store_for(server: &MockServer) -> TaskStore<HttpTaskApi> {
    TaskStore::new(HttpTaskApi::new(&settings(server)).expect("client"))
}

fn task_json(id: i64, title: &str, priority: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": null,
        "dailyTargetValue": 2,
        "accumulatedValue": 4,
        "priority": priority,
        "startDate": "2026-01-01",
        "endDate": "2026-12-31",
        "lastProcessedDate": null,
        "active": true
    })
}

fn three_tasks() -> Value {
    json!([
        task_json(1, "Read", "LOW"),
        task_json(2, "Run", "HIGH"),
        task_json(3, "Write", "MEDIUM"),
    ])
}

fn ids(store: &TaskStore<HttpTaskApi>) -> Vec<i64> {
    store.tasks().iter().map(|t| t.id.get()).collect()
}

async fn mount_list(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn draft() -> TaskDraft {
    TaskDraft {
        title: "Meditate".to_string(),
        description: Some("Ten minutes".to_string()),
        daily_target_value: 10,
        priority: Priority::High,
        start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
    }
}

// =============================================================================
// fetch_all
// =============================================================================

#[tokio::test]
async fn fetch_all_loads_every_task_with_an_id() {
    let server = MockServer::start().await;
    mount_list(&server, three_tasks()).await;

    let store = store_for(&server);
    store.fetch_all().await.unwrap();

    let state = store.state();
    assert_eq!(ids(&store), vec![1, 2, 3]);
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(state.tasks[1].priority, Priority::High);
}

#[tokio::test]
async fn fetch_all_decodes_sparse_server_tasks() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([{ "id": 5, "title": "Sparse", "priority": "high", "accumulatedValue": null }]),
    )
    .await;

    let store = store_for(&server);
    store.fetch_all().await.unwrap();

    let task = &store.tasks()[0];
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.accumulated(), 0);
    assert_eq!(task.start_date, None);
}

#[tokio::test]
async fn fetch_all_server_error_sets_error_and_keeps_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_tasks()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.fetch_all().await.unwrap();
    let err = store.fetch_all().await.unwrap_err();

    assert_eq!(err.message, "Failed to fetch tasks");
    assert_eq!(ids(&store), vec![1, 2, 3]);
    assert_eq!(store.error().as_deref(), Some("Failed to fetch tasks"));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn unreachable_server_is_a_fetch_error() {
    let server = MockServer::start().await;
    let settings = settings(&server);
    drop(server);

    let store = TaskStore::new(HttpTaskApi::new(&settings).unwrap());
    let err = store.fetch_all().await.unwrap_err();
    assert_eq!(err.message, "Failed to fetch tasks");
}

#[tokio::test]
async fn server_message_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "status": 503,
            "message": "Database unavailable",
            "timestamp": "2026-03-01T10:00:00"
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.fetch_all().await.unwrap_err();
    assert_eq!(err.message, "Database unavailable");
}

// =============================================================================
// delete / complete
// =============================================================================

#[tokio::test]
async fn delete_removes_only_that_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_tasks()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.fetch_all().await.unwrap();
    store.delete_task(TaskId::new(2)).await.unwrap();

    assert_eq!(ids(&store), vec![1, 3]);
}

#[tokio::test]
async fn delete_not_found_keeps_collection() {
    let server = MockServer::start().await;
    mount_list(&server, three_tasks()).await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": 404,
            "message": "Task not found with id: 9"
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.fetch_all().await.unwrap();
    let err = store.delete_task(TaskId::new(9)).await.unwrap_err();

    assert_eq!(err.message, "Task not found with id: 9");
    assert_eq!(ids(&store), vec![1, 2, 3]);
}

#[tokio::test]
async fn complete_today_sends_body_and_removes_task() {
    let server = MockServer::start().await;
    let today = dates::today();
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_tasks()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/complete"))
        .and(body_json(json!({
            "taskId": 3,
            "completionDate": dates::format_iso_date(today)
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.fetch_all().await.unwrap();
    store.complete_task(TaskId::new(3), today).await.unwrap();

    assert_eq!(ids(&store), vec![1, 2]);
}

#[tokio::test]
async fn complete_past_day_reloads_from_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_tasks()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([task_json(1, "Read", "LOW"), task_json(2, "Run", "HIGH")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/complete"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.fetch_all().await.unwrap();
    let past = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
    store.complete_task(TaskId::new(1), past).await.unwrap();

    assert_eq!(ids(&store), vec![1, 2]);
}

#[tokio::test]
async fn complete_rejected_reports_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/complete"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": 400,
            "message": "Task already completed for this date"
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store
        .complete_task(TaskId::new(1), dates::today())
        .await
        .unwrap_err();
    assert_eq!(err.message, "Task already completed for this date");
    assert_eq!(store.error().as_deref(), Some("Task already completed for this date"));
}

// =============================================================================
// create / update / details
// =============================================================================

#[tokio::test]
async fn create_posts_camel_case_draft() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .and(body_json(json!({
            "title": "Meditate",
            "description": "Ten minutes",
            "dailyTargetValue": 10,
            "priority": "HIGH",
            "startDate": "2026-03-01",
            "endDate": "2026-03-31"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(task_json(40, "Meditate", "HIGH")))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let created = store.create_task(&draft()).await.unwrap();
    assert_eq!(created.id, TaskId::new(40));
    assert!(store.tasks().is_empty());
}

#[tokio::test]
async fn update_validation_error_keeps_field_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/tasks/7"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": 400,
            "message": "Validation failed",
            "fieldErrors": { "endDate": "End date must be after start date" }
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.update_task(TaskId::new(7), &draft()).await.unwrap_err();
    assert_eq!(err.message, "Validation failed");
    assert_eq!(
        err.field_errors.get("endDate").map(String::as_str),
        Some("End date must be after start date")
    );
}

#[tokio::test]
async fn statistics_are_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/2/statistics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "taskId": 2,
            "taskTitle": "Run",
            "totalCompletions": 3,
            "totalPossibleDays": 10,
            "completionRate": 30.0,
            "completedDates": ["2026-01-02", "2026-01-05", "2026-01-03"],
            "firstCompletion": "2026-01-02",
            "lastCompletion": "2026-01-05"
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let stats = store.statistics(TaskId::new(2)).await.unwrap();
    assert_eq!(stats.total_completions, 3);
    assert_eq!(stats.rate_label(), "30.0%");
    assert_eq!(
        stats.history()[0],
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    );
}

#[tokio::test]
async fn get_missing_task_uses_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/77"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": 404,
            "message": "Task not found with id: 77"
        })))
        .mount(&server)
        .await;

    let api = HttpTaskApi::new(&settings(&server)).unwrap();
    let err = api.get(TaskId::new(77)).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.server_message(), Some("Task not found with id: 77"));
}

#[tokio::test]
async fn malformed_success_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.fetch_all().await.unwrap_err();
    assert_eq!(err.message, "Failed to fetch tasks");
}

// =============================================================================
// CLI commands
// =============================================================================

async fn run(store: &TaskStore<HttpTaskApi>, command: Command) -> Result<String, CliError> {
    let mut out = Vec::new();
    cli::run(command, store, &Renderer::new(dates::DISPLAY_DATE_FORMAT), &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn list_command_renders_tasks() {
    let server = MockServer::start().await;
    mount_list(&server, three_tasks()).await;

    let store = store_for(&server);
    let out = run(&store, Command::default()).await.unwrap();
    assert!(out.contains("#1 Read"));
    assert!(out.contains("#2 Run"));
    assert!(out.contains("High Priority | Active"));
    assert!(out.contains("Jan 1, 2026 -> Dec 31, 2026"));
}

#[tokio::test]
async fn list_command_empty_state() {
    let server = MockServer::start().await;
    mount_list(&server, json!([])).await;

    let store = store_for(&server);
    let out = run(&store, Command::default()).await.unwrap();
    assert!(out.contains("No tasks found"));
}

#[tokio::test]
async fn create_command_rejects_invalid_form_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = run(
        &store,
        Command::Create {
            title: "ab".to_string(),
            description: String::new(),
            daily_target: "0".to_string(),
            priority: Priority::Low,
            start: Some("2026-02-01".to_string()),
            end: "2026-01-01".to_string(),
        },
    )
    .await
    .unwrap_err();

    let CliError::Validation(failure) = &err else {
        panic!("expected validation failure, got {err:?}");
    };
    assert_eq!(failure.errors.len(), 3);
    assert!(err.render().contains("Title must be at least 3 characters"));
}

#[tokio::test]
async fn show_command_renders_details_and_statistics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(2, "Run", "HIGH")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/2/statistics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "taskId": 2,
            "taskTitle": "Run",
            "totalCompletions": 0,
            "totalPossibleDays": 4,
            "completionRate": 0.0,
            "completedDates": []
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let out = run(&store, Command::Show { id: TaskId::new(2) }).await.unwrap();
    assert!(out.contains("Priority:       High Priority"));
    assert!(out.contains("Completion rate:   0.0%"));
    assert!(out.contains("No completions yet."));
}

#[tokio::test]
async fn edit_command_merges_current_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(3, "Write", "MEDIUM")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/tasks/3"))
        .and(body_json(json!({
            "title": "Write more",
            "description": null,
            "dailyTargetValue": 2,
            "priority": "MEDIUM",
            "startDate": "2026-01-01",
            "endDate": "2026-12-31"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(3, "Write more", "MEDIUM")))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let out = run(
        &store,
        Command::Edit {
            id: TaskId::new(3),
            title: Some("Write more".to_string()),
            description: None,
            daily_target: None,
            priority: None,
            start: None,
            end: None,
        },
    )
    .await
    .unwrap();
    assert!(out.starts_with("Updated task #3"));
}

/// Accepts writes but fails every flush.
struct BrokenPipe(Vec<u8>);

impl std::io::Write for BrokenPipe {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
    }
}

#[tokio::test]
async fn flush_failure_is_reported_as_io_error() {
    let server = MockServer::start().await;
    mount_list(&server, three_tasks()).await;

    let store = store_for(&server);
    let mut out = BrokenPipe(Vec::new());
    let err = cli::run(
        Command::default(),
        &store,
        &Renderer::new(dates::DISPLAY_DATE_FORMAT),
        &mut out,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CliError::Io(_)));
    assert!(String::from_utf8_lossy(&out.0).contains("#1 Read"));
}
