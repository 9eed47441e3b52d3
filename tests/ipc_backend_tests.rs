//! Integration tests for the socket backend.
//!
//! A fake planner listens on a temporary Unix socket and answers every
//! command, so the app's open/close/history calls go over the wire:
//! - Opening a session and cancelling it
//! - Session token and request ids on every call
//! - Rejected calls turning into notices

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;

use study_pomodoro::app::{AppOptions, NoticeKind, PomodoroApp};
use study_pomodoro::backend::{IpcBackend, PomodoroBackend};
use study_pomodoro::sound::{MockAudioOutput, MockSoundFetcher};
use study_pomodoro::timer::StartOutcome;
use study_pomodoro::types::{PomodoroConfig, PomodoroStatus, SessionId, TimerState};

// ============================================================================
// Fake planner
// ============================================================================

type Requests = Arc<Mutex<Vec<Value>>>;

/// Creates a temporary socket path for testing.
fn create_temp_socket_path() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planner.sock");
    (dir, path)
}

fn record_json(id: i64, status: &str, duration_minutes: u32) -> Value {
    json!({
        "id": id,
        "subject_id": null,
        "subject_name": null,
        "task_id": null,
        "start_time": chrono::Utc::now().to_rfc3339(),
        "end_time": null,
        "duration_minutes": duration_minutes,
        "status": status
    })
}

fn respond(request: &Value, reject_cancel: bool) -> Value {
    match request["command"].as_str() {
        Some("start_pomodoro") => json!({
            "status": "success",
            "message": "",
            "data": record_json(41, "running", 25)
        }),
        Some("cancel_pomodoro") if reject_cancel => json!({
            "status": "error",
            "message": "pomodoro already closed"
        }),
        Some("complete_pomodoro" | "cancel_pomodoro") => json!({
            "status": "success",
            "message": ""
        }),
        Some("get_pomodoro_history") => json!({
            "status": "success",
            "message": "",
            "data": [record_json(41, "cancelled", 0)]
        }),
        _ => json!({"status": "error", "message": "unknown command"}),
    }
}

/// Answers connections until the test ends, recording every request.
fn spawn_planner(listener: UnixListener, reject_cancel: bool) -> Requests {
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let mut buffer = Vec::new();
            if stream.read_to_end(&mut buffer).await.is_err() {
                continue;
            }
            let request: Value = serde_json::from_slice(&buffer).unwrap();
            let response = respond(&request, reject_cancel);
            seen.lock().unwrap().push(request);
            let _ = stream.write_all(&serde_json::to_vec(&response).unwrap()).await;
            let _ = stream.shutdown().await;
        }
    });

    requests
}

fn create_app(path: PathBuf) -> PomodoroApp<IpcBackend, MockSoundFetcher, MockAudioOutput> {
    let backend = IpcBackend::new(path)
        .with_timeout(Duration::from_secs(2))
        .with_session_token(Some("token-1".to_string()));
    PomodoroApp::new(
        PomodoroConfig::default(),
        Arc::new(backend),
        Arc::new(MockSoundFetcher::new()),
        MockAudioOutput::new(),
        AppOptions::default(),
    )
}

fn commands(requests: &Requests) -> Vec<String> {
    requests
        .lock()
        .unwrap()
        .iter()
        .map(|r| r["command"].as_str().unwrap_or_default().to_string())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_open_and_cancel_over_socket() {
    let (_dir, path) = create_temp_socket_path();
    let requests = spawn_planner(UnixListener::bind(&path).unwrap(), false);
    let mut app = create_app(path);

    assert_eq!(app.start(), Ok(StartOutcome::AwaitingSession));
    app.step().await;
    assert_eq!(app.timer_snapshot().state, TimerState::Running);
    assert_eq!(
        app.engine().session().backend_session_id,
        Some(SessionId(41))
    );

    app.cancel().unwrap();
    assert!(app.flush(Duration::from_secs(5)).await);

    assert_eq!(
        commands(&requests),
        vec!["start_pomodoro", "cancel_pomodoro", "get_pomodoro_history"]
    );
    assert_eq!(app.history().len(), 1);
    assert_eq!(app.history()[0].status, PomodoroStatus::Cancelled);
    assert_eq!(app.summary().today_count, 0);

    let requests = requests.lock().unwrap();
    assert_eq!(requests[0]["duration_minutes"], 25);
    assert_eq!(requests[1]["pomodoro_id"], 41);
    assert_eq!(requests[1]["duration_minutes"], 0);
    for request in requests.iter() {
        assert_eq!(request["session_token"], "token-1");
        assert!(request["request_id"].is_string());
    }
}

#[tokio::test]
async fn test_rejected_cancel_becomes_notice() {
    let (_dir, path) = create_temp_socket_path();
    let requests = spawn_planner(UnixListener::bind(&path).unwrap(), true);
    let mut app = create_app(path);

    app.start().unwrap();
    app.step().await;
    app.cancel().unwrap();
    assert!(app.flush(Duration::from_secs(5)).await);

    let notice = app.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::CancelFailed);
    assert!(notice.message.contains("pomodoro already closed"));
    assert_eq!(app.timer_snapshot().state, TimerState::Idle);
    assert_eq!(commands(&requests), vec!["start_pomodoro", "cancel_pomodoro"]);
}

#[tokio::test]
async fn test_unreachable_backend_keeps_timer_idle() {
    let (_dir, path) = create_temp_socket_path();
    let mut app = create_app(path);

    app.start().unwrap();
    app.step().await;

    assert_eq!(app.timer_snapshot().state, TimerState::Idle);
    assert!(!app.engine().is_opening());
    assert_eq!(app.notice().unwrap().kind, NoticeKind::StartFailed);
}

#[tokio::test]
async fn test_history_direct_call() {
    let (_dir, path) = create_temp_socket_path();
    let requests = spawn_planner(UnixListener::bind(&path).unwrap(), false);
    let backend = IpcBackend::new(path);

    let records = backend.get_pomodoro_history(5).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, SessionId(41));
    assert_eq!(requests.lock().unwrap()[0]["limit"], 5);
}
