//! Socket client for the session backend.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request envelope with request id and session token
//! - Timeout handling
//!
//! Calls are never retried here; a failed close is reported once and the
//! session id is already gone from the engine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::types::{PomodoroRecord, SessionId};

use super::error::BackendError;
use super::protocol::{BackendRequest, BackendResponse, RequestEnvelope};
use super::{PomodoroBackend, StartRequest};

// ============================================================================
// Constants
// ============================================================================

/// Socket path relative to the home directory
const DEFAULT_SOCKET_PATH: &str = ".study-pomodoro/backend.sock";

/// Default connect/read/write timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (1MB)
const MAX_RESPONSE_SIZE: u64 = 1024 * 1024;

// ============================================================================
// IpcBackend
// ============================================================================

/// Backend reached over a Unix socket.
#[derive(Debug, Clone)]
pub struct IpcBackend {
    /// Socket path
    socket_path: PathBuf,
    /// Per-step timeout
    timeout: Duration,
    /// Credential passed with every call
    session_token: Option<String>,
}

impl IpcBackend {
    /// Creates a backend client for the given socket.
    pub fn new(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_token: None,
        }
    }

    /// Sets the per-step timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the session token sent with each request.
    pub fn with_session_token(mut self, token: Option<String>) -> Self {
        self.session_token = token;
        self
    }

    /// Returns the default socket path under the home directory.
    pub fn default_socket_path() -> Result<PathBuf, BackendError> {
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_SOCKET_PATH))
            .ok_or_else(|| BackendError::Connection("home directory not found".to_string()))
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Sends one request and decodes its payload.
    async fn call<T: DeserializeOwned>(&self, request: BackendRequest) -> Result<T, BackendError> {
        let command = request.command();
        let response = self.send_request(request).await?;
        let data = response.data.ok_or_else(|| {
            BackendError::Protocol(format!("{command} response carried no data"))
        })?;
        serde_json::from_value(data)
            .map_err(|e| BackendError::Protocol(format!("{command} payload: {e}")))
    }

    /// Sends one request and only checks its status.
    async fn call_unit(&self, request: BackendRequest) -> Result<(), BackendError> {
        self.send_request(request).await.map(|_| ())
    }

    /// Sends a single request to the backend.
    async fn send_request(&self, request: BackendRequest) -> Result<BackendResponse, BackendError> {
        let command = request.command();
        let envelope = RequestEnvelope::new(request, self.session_token.clone());
        debug!(command, request_id = %envelope.request_id, "sending backend request");

        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .map_err(|_| BackendError::Timeout("connect"))?
            .map_err(|e| {
                BackendError::Connection(format!("{}: {}", self.socket_path.display(), e))
            })?;

        let request_json = serde_json::to_vec(&envelope)
            .map_err(|e| BackendError::Protocol(format!("encode {command}: {e}")))?;

        timeout(self.timeout, stream.write_all(&request_json))
            .await
            .map_err(|_| BackendError::Timeout("write"))?
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        // Shutdown write side to signal end of request
        timeout(self.timeout, stream.shutdown())
            .await
            .map_err(|_| BackendError::Timeout("write"))?
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        let mut buffer = Vec::new();
        timeout(
            self.timeout,
            (&mut stream).take(MAX_RESPONSE_SIZE).read_to_end(&mut buffer),
        )
        .await
        .map_err(|_| BackendError::Timeout("read"))?
        .map_err(|e| BackendError::Connection(e.to_string()))?;

        if buffer.is_empty() {
            return Err(BackendError::Protocol(format!(
                "empty response to {command}"
            )));
        }

        let response: BackendResponse = serde_json::from_slice(&buffer)
            .map_err(|e| BackendError::Protocol(format!("decode {command} response: {e}")))?;

        if response.is_error() {
            warn!(command, message = %response.message, "backend rejected request");
            return Err(BackendError::Rejected(response.message));
        }

        Ok(response)
    }
}

impl PomodoroBackend for IpcBackend {
    async fn start_pomodoro(&self, request: StartRequest) -> Result<PomodoroRecord, BackendError> {
        self.call(BackendRequest::StartPomodoro {
            subject_id: request.subject_id,
            task_id: request.task_id,
            duration_minutes: request.duration_minutes,
        })
        .await
    }

    async fn complete_pomodoro(
        &self,
        session_id: SessionId,
        duration_minutes: u32,
    ) -> Result<(), BackendError> {
        self.call_unit(BackendRequest::CompletePomodoro {
            pomodoro_id: session_id,
            duration_minutes,
        })
        .await
    }

    async fn cancel_pomodoro(
        &self,
        session_id: SessionId,
        duration_minutes: u32,
    ) -> Result<(), BackendError> {
        self.call_unit(BackendRequest::CancelPomodoro {
            pomodoro_id: session_id,
            duration_minutes,
        })
        .await
    }

    async fn get_pomodoro_history(&self, limit: u32) -> Result<Vec<PomodoroRecord>, BackendError> {
        self.call(BackendRequest::GetPomodoroHistory { limit }).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PomodoroStatus, TaskId};
    use tokio::net::UnixListener;

    fn create_temp_socket_path() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backend.sock");
        (dir, path)
    }

    /// Serves one connection, returning the raw request JSON.
    async fn serve_once(
        listener: UnixListener,
        response: serde_json::Value,
    ) -> serde_json::Value {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await.unwrap();
        let json = serde_json::to_vec(&response).unwrap();
        stream.write_all(&json).await.unwrap();
        stream.flush().await.unwrap();
        serde_json::from_slice(&buffer).unwrap()
    }

    #[test]
    fn test_builders() {
        let backend = IpcBackend::new(PathBuf::from("/tmp/test.sock"))
            .with_timeout(Duration::from_secs(1))
            .with_session_token(Some("abc".to_string()));
        assert_eq!(backend.socket_path(), Path::new("/tmp/test.sock"));
        assert_eq!(backend.timeout, Duration::from_secs(1));
        assert_eq!(backend.session_token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let (_dir, path) = create_temp_socket_path();
        let backend = IpcBackend::new(path);

        let result = backend.get_pomodoro_history(5).await;
        assert!(matches!(result, Err(BackendError::Connection(_))));
    }

    #[tokio::test]
    async fn test_start_pomodoro_round_trip() {
        let (_dir, path) = create_temp_socket_path();
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(serve_once(
            listener,
            serde_json::json!({
                "status": "success",
                "message": "",
                "data": {
                    "id": 12,
                    "subject_id": null,
                    "subject_name": null,
                    "task_id": 4,
                    "start_time": "2026-10-16T09:00:00Z",
                    "end_time": null,
                    "duration_minutes": 25,
                    "status": "running"
                }
            }),
        ));

        let backend = IpcBackend::new(path).with_session_token(Some("secret".to_string()));
        let record = backend
            .start_pomodoro(StartRequest {
                subject_id: None,
                task_id: Some(TaskId(4)),
                duration_minutes: Some(25),
            })
            .await
            .unwrap();

        assert_eq!(record.id, SessionId(12));
        assert_eq!(record.status, PomodoroStatus::Pending);

        let request = server.await.unwrap();
        assert_eq!(request["command"], "start_pomodoro");
        assert_eq!(request["task_id"], 4);
        assert_eq!(request["duration_minutes"], 25);
        assert_eq!(request["session_token"], "secret");
    }

    #[tokio::test]
    async fn test_complete_sends_id_and_duration() {
        let (_dir, path) = create_temp_socket_path();
        let listener = UnixListener::bind(&path).unwrap();
        let server = tokio::spawn(serve_once(
            listener,
            serde_json::json!({"status": "success", "message": ""}),
        ));

        let backend = IpcBackend::new(path);
        backend.complete_pomodoro(SessionId(7), 25).await.unwrap();

        let request = server.await.unwrap();
        assert_eq!(request["command"], "complete_pomodoro");
        assert_eq!(request["pomodoro_id"], 7);
        assert_eq!(request["duration_minutes"], 25);
        assert!(request.get("session_token").is_none());
    }

    #[tokio::test]
    async fn test_error_response_is_rejected() {
        let (_dir, path) = create_temp_socket_path();
        let listener = UnixListener::bind(&path).unwrap();
        let server = tokio::spawn(serve_once(
            listener,
            serde_json::json!({"status": "error", "message": "pomodoro not found"}),
        ));

        let backend = IpcBackend::new(path);
        let err = backend.cancel_pomodoro(SessionId(9), 1).await.unwrap_err();
        assert_eq!(err, BackendError::Rejected("pomodoro not found".to_string()));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_data_is_protocol_error() {
        let (_dir, path) = create_temp_socket_path();
        let listener = UnixListener::bind(&path).unwrap();
        let server = tokio::spawn(serve_once(
            listener,
            serde_json::json!({"status": "success", "message": ""}),
        ));

        let backend = IpcBackend::new(path);
        let err = backend.get_pomodoro_history(20).await.unwrap_err();
        assert!(matches!(err, BackendError::Protocol(_)));

        let request = server.await.unwrap();
        assert_eq!(request["limit"], 20);
    }
}
