//! Session recorder.
//!
//! Turns engine requests into backend calls. Every call runs on its own
//! task and reports exactly one [`RecorderOutcome`] back over a channel,
//! so the timer keeps ticking while the backend is slow.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, PomodoroBackend, StartRequest};
use crate::types::{PomodoroRecord, SessionId};

// ============================================================================
// RecorderOutcome
// ============================================================================

/// How an open session was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    Complete,
    Cancel,
}

impl CloseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseKind::Complete => "complete",
            CloseKind::Cancel => "cancel",
        }
    }
}

/// Result of one backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderOutcome {
    /// A session open call finished
    Opened(Result<PomodoroRecord, BackendError>),
    /// A complete or cancel call finished
    Closed {
        kind: CloseKind,
        session_id: SessionId,
        result: Result<(), BackendError>,
    },
    /// A history fetch finished
    History(Result<Vec<PomodoroRecord>, BackendError>),
}

// ============================================================================
// SessionRecorder
// ============================================================================

/// Issues backend calls for the timer and tracks the ones in flight.
pub struct SessionRecorder<B> {
    backend: Arc<B>,
    history_limit: u32,
    in_flight: usize,
    outcome_tx: mpsc::UnboundedSender<RecorderOutcome>,
}

impl<B: PomodoroBackend> SessionRecorder<B> {
    pub fn new(
        backend: Arc<B>,
        history_limit: u32,
        outcome_tx: mpsc::UnboundedSender<RecorderOutcome>,
    ) -> Self {
        Self {
            backend,
            history_limit,
            in_flight: 0,
            outcome_tx,
        }
    }

    /// Opens a backend session.
    pub fn open(&mut self, request: StartRequest) {
        info!(
            subject = ?request.subject_id,
            task = ?request.task_id,
            minutes = ?request.duration_minutes,
            "opening session"
        );
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = backend.start_pomodoro(request).await;
            if let Err(e) = &result {
                warn!(error = %e, "failed to open session");
            }
            RecorderOutcome::Opened(result)
        });
    }

    /// Marks a session completed.
    pub fn complete(&mut self, session_id: SessionId, duration_minutes: u32) {
        self.close(CloseKind::Complete, session_id, duration_minutes);
    }

    /// Marks a session cancelled with the minutes spent.
    pub fn cancel(&mut self, session_id: SessionId, duration_minutes: u32) {
        self.close(CloseKind::Cancel, session_id, duration_minutes);
    }

    fn close(&mut self, kind: CloseKind, session_id: SessionId, duration_minutes: u32) {
        info!(%session_id, duration_minutes, kind = kind.as_str(), "closing session");
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = match kind {
                CloseKind::Complete => backend.complete_pomodoro(session_id, duration_minutes).await,
                CloseKind::Cancel => backend.cancel_pomodoro(session_id, duration_minutes).await,
            };
            if let Err(e) = &result {
                warn!(%session_id, kind = kind.as_str(), error = %e, "failed to close session");
            }
            RecorderOutcome::Closed {
                kind,
                session_id,
                result,
            }
        });
    }

    /// Fetches the most recent sessions.
    pub fn refresh_history(&mut self) {
        let limit = self.history_limit;
        debug!(limit, "refreshing history");
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = backend.get_pomodoro_history(limit).await;
            if let Err(e) = &result {
                warn!(error = %e, "failed to load history");
            }
            RecorderOutcome::History(result)
        });
    }

    /// Marks one outcome as received.
    pub fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Returns the number of calls whose outcome has not been received.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Returns the shared backend.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn spawn<Fut>(&mut self, call: Fut)
    where
        Fut: std::future::Future<Output = RecorderOutcome> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let outcome = call.await;
            if tx.send(outcome).is_err() {
                debug!("recorder outcome dropped, receiver closed");
            }
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
