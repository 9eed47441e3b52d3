//! Session backend for the Pomodoro core.
//!
//! This module provides:
//! - `PomodoroBackend`: the four logical session operations
//! - `IpcBackend`: JSON over a Unix socket
//! - `MemoryBackend`: in-process store for offline use and tests
//! - `protocol`: wire types shared with the socket backend

pub mod error;
pub mod ipc;
pub mod memory;
pub mod protocol;

use std::future::Future;

use crate::types::{PomodoroRecord, SessionId, SubjectId, TaskId};

pub use error::BackendError;
pub use ipc::IpcBackend;
pub use memory::{BackendCall, MemoryBackend};
pub use protocol::{BackendRequest, BackendResponse, RequestEnvelope};

/// Parameters of a session open call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartRequest {
    pub subject_id: Option<SubjectId>,
    pub task_id: Option<TaskId>,
    pub duration_minutes: Option<u32>,
}

/// Remote persistence of study sessions.
///
/// Implementations are shared across spawned tasks, so each call must be
/// independent of the others.
pub trait PomodoroBackend: Send + Sync + 'static {
    /// Opens a session and returns the stored record.
    fn start_pomodoro(
        &self,
        request: StartRequest,
    ) -> impl Future<Output = Result<PomodoroRecord, BackendError>> + Send;

    /// Marks a session completed with the given duration.
    fn complete_pomodoro(
        &self,
        session_id: SessionId,
        duration_minutes: u32,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Marks a session cancelled with the minutes actually spent.
    fn cancel_pomodoro(
        &self,
        session_id: SessionId,
        duration_minutes: u32,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Returns up to `limit` records, most recent first.
    fn get_pomodoro_history(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<PomodoroRecord>, BackendError>> + Send;
}
