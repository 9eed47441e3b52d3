//! Wire types for the socket backend.
//!
//! One JSON request per connection, one JSON response back:
//!
//! ```text
//! → {"request_id":"…","session_token":"…","command":"complete_pomodoro","pomodoro_id":3,"duration_minutes":25}
//! ← {"status":"success","message":"","data":null}
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{SessionId, SubjectId, TaskId};

/// Logical backend operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum BackendRequest {
    StartPomodoro {
        subject_id: Option<SubjectId>,
        task_id: Option<TaskId>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        duration_minutes: Option<u32>,
    },
    CompletePomodoro {
        pomodoro_id: SessionId,
        duration_minutes: u32,
    },
    CancelPomodoro {
        pomodoro_id: SessionId,
        duration_minutes: u32,
    },
    GetPomodoroHistory {
        limit: u32,
    },
}

impl BackendRequest {
    /// Returns the command name sent on the wire.
    pub fn command(&self) -> &'static str {
        match self {
            BackendRequest::StartPomodoro { .. } => "start_pomodoro",
            BackendRequest::CompletePomodoro { .. } => "complete_pomodoro",
            BackendRequest::CancelPomodoro { .. } => "cancel_pomodoro",
            BackendRequest::GetPomodoroHistory { .. } => "get_pomodoro_history",
        }
    }
}

/// A request plus its routing metadata.
///
/// `request_id` is unique per call so a backend can drop duplicate
/// deliveries of the same close.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    pub request_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(flatten)]
    pub request: BackendRequest,
}

impl RequestEnvelope {
    /// Wraps a request with a fresh request id.
    pub fn new(request: BackendRequest, session_token: Option<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            session_token,
            request,
        }
    }
}

/// Backend reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendResponse {
    /// "success" or "error"
    pub status: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// Operation payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl BackendResponse {
    /// Creates a success response.
    pub fn success(data: Option<serde_json::Value>) -> Self {
        Self {
            status: "success".to_string(),
            message: String::new(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true if the backend reported an error.
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}
