//! Timer engine error types.
//!
//! Every variant describes a rejected transition; a rejected transition
//! never mutates the engine.

use thiserror::Error;

/// Errors returned by [`TimerEngine`](super::TimerEngine) transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// `start` called while running or paused.
    #[error("timer is already running")]
    AlreadyActive,

    /// `start` or a configuration change while a session open call is in flight.
    #[error("a session is already being opened")]
    SessionPending,

    /// `pause` called while not running.
    #[error("timer is not running")]
    NotRunning,

    /// `resume` called while not paused.
    #[error("timer is not paused")]
    NotPaused,

    /// `cancel` called while idle.
    #[error("no interval in progress")]
    NotActive,

    /// Configuration change attempted while an interval is in progress.
    #[error("durations can only be changed while the timer is idle")]
    NotIdle,

    /// Work duration outside 1-120 minutes.
    #[error("work duration must be between 1 and 120 minutes (got {0})")]
    InvalidWorkMinutes(u32),

    /// Break duration outside 1-60 minutes.
    #[error("break duration must be between 1 and 60 minutes (got {0})")]
    InvalidBreakMinutes(u32),

    /// A session id arrived with no open call outstanding.
    #[error("no session open call is outstanding")]
    NoPendingOpen,

    /// The event receiver was dropped.
    #[error("timer event channel closed")]
    EventChannelClosed,
}

impl TimerError {
    /// Returns true if this error comes from rejected duration input.
    ///
    /// These are swallowed silently at the input boundary.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidWorkMinutes(_) | Self::InvalidBreakMinutes(_)
        )
    }

    /// Returns true if the action simply did not apply to the current state.
    #[must_use]
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyActive
                | Self::SessionPending
                | Self::NotRunning
                | Self::NotPaused
                | Self::NotActive
                | Self::NotIdle
        )
    }
}
