//! Timer engine for the Pomodoro core.
//!
//! This module provides the work/break state machine:
//! - State transitions (Idle → Running ⇄ Paused → Idle)
//! - Countdown driven by an external one-second tick
//! - Backend session bookkeeping (open → complete/cancel)
//! - Event firing for the recorder, audio and the render loop
//!
//! The engine never awaits anything. Backend work is requested through
//! [`TimerEvent`]s and its results are fed back through
//! [`TimerEngine::session_opened`] / [`TimerEngine::session_open_failed`].

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::types::{
    PomodoroConfig, SessionId, SubjectId, TaskId, TimerMode, TimerSession, TimerSnapshot,
    TimerState,
};

use super::error::TimerError;

// ============================================================================
// TimerEvent
// ============================================================================

/// Events emitted by the engine, in transition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Run state changed
    StateChanged {
        /// Previous state
        from: TimerState,
        /// New state
        to: TimerState,
    },
    /// One second elapsed
    Tick {
        /// Remaining seconds
        remaining_seconds: u32,
    },
    /// A work session must be opened on the backend
    OpenRequested {
        subject_id: Option<SubjectId>,
        task_id: Option<TaskId>,
        duration_minutes: u32,
    },
    /// The open work session ran to completion
    CompleteRequested {
        session_id: SessionId,
        duration_minutes: u32,
    },
    /// The open work session was cancelled by the user
    CancelRequested {
        session_id: SessionId,
        duration_minutes: u32,
    },
    /// An interval reached zero
    IntervalCompleted {
        /// Mode that just finished
        mode: TimerMode,
    },
    /// The user cancelled an interval
    Cancelled {
        /// Mode that was cancelled
        mode: TimerMode,
        /// Whole minutes counted before cancelling
        elapsed_minutes: u32,
    },
    /// Countdown reset to a full interval
    Rearmed {
        mode: TimerMode,
        total_seconds: u32,
    },
}

/// Result of a successful [`TimerEngine::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The countdown is running
    Running,
    /// A backend session is being opened; the engine runs once it arrives
    AwaitingSession,
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Work/break state machine.
pub struct TimerEngine {
    /// Current interval
    session: TimerSession,
    /// Configured durations
    config: PomodoroConfig,
    /// Subject to attach to the next work session
    subject_choice: Option<SubjectId>,
    /// Open call in flight
    opening: bool,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an idle engine armed for a work interval.
    pub fn new(config: PomodoroConfig, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            session: TimerSession::new(&config),
            config,
            subject_choice: None,
            opening: false,
            event_tx,
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Starts the armed interval.
    ///
    /// A work interval without an open backend session first requests one
    /// and stays idle until [`session_opened`](Self::session_opened).
    ///
    /// # Errors
    ///
    /// Returns an error if an interval is already in progress or an open
    /// call is still outstanding.
    pub fn start(&mut self, task_id: Option<TaskId>) -> Result<StartOutcome, TimerError> {
        if self.session.state.is_active() {
            return Err(TimerError::AlreadyActive);
        }
        if self.opening {
            return Err(TimerError::SessionPending);
        }

        if self.session.mode == TimerMode::Work && self.session.backend_session_id.is_none() {
            self.opening = true;
            self.session.selected_subject_id = self.subject_choice;
            info!(subject = ?self.subject_choice, "requesting backend session");
            self.emit(TimerEvent::OpenRequested {
                subject_id: self.subject_choice,
                task_id,
                duration_minutes: self.config.work_minutes,
            })?;
            return Ok(StartOutcome::AwaitingSession);
        }

        self.set_state(TimerState::Running)?;
        Ok(StartOutcome::Running)
    }

    /// Records the session id returned by the backend and starts counting.
    ///
    /// # Errors
    ///
    /// Returns `NoPendingOpen` if no open call was outstanding.
    pub fn session_opened(&mut self, session_id: SessionId) -> Result<(), TimerError> {
        if !self.opening {
            warn!(%session_id, "session id arrived with no open call outstanding");
            return Err(TimerError::NoPendingOpen);
        }
        self.opening = false;
        self.session.backend_session_id = Some(session_id);
        info!(%session_id, "backend session opened");
        self.set_state(TimerState::Running)
    }

    /// Abandons the outstanding open call; the engine stays idle.
    pub fn session_open_failed(&mut self) {
        if self.opening {
            self.opening = false;
            self.session.selected_subject_id = None;
        }
    }

    /// Advances the countdown by one second.
    ///
    /// Returns true if this tick finished the interval. Ticks outside the
    /// running state are ignored.
    pub fn tick(&mut self) -> Result<bool, TimerError> {
        if self.session.state != TimerState::Running {
            return Ok(false);
        }

        self.session.remaining_seconds = self.session.remaining_seconds.saturating_sub(1);
        self.emit(TimerEvent::Tick {
            remaining_seconds: self.session.remaining_seconds,
        })?;

        if self.session.remaining_seconds > 0 {
            return Ok(false);
        }

        self.handle_expiry()?;
        Ok(true)
    }

    /// Handles an interval reaching zero.
    fn handle_expiry(&mut self) -> Result<(), TimerError> {
        let finished = self.session.mode;

        if let Some(session_id) = self.session.backend_session_id.take() {
            self.emit(TimerEvent::CompleteRequested {
                session_id,
                duration_minutes: self.session.total_seconds / 60,
            })?;
        }
        self.session.selected_subject_id = None;

        info!(mode = finished.as_str(), "interval completed");
        self.emit(TimerEvent::IntervalCompleted { mode: finished })?;

        self.set_state(TimerState::Idle)?;
        self.rearm(finished.flipped())
    }

    /// Pauses the countdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer is not running.
    pub fn pause(&mut self) -> Result<(), TimerError> {
        if self.session.state != TimerState::Running {
            return Err(TimerError::NotRunning);
        }
        self.set_state(TimerState::Paused)
    }

    /// Resumes a paused countdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer is not paused.
    pub fn resume(&mut self) -> Result<(), TimerError> {
        if self.session.state != TimerState::Paused {
            return Err(TimerError::NotPaused);
        }
        self.set_state(TimerState::Running)
    }

    /// Cancels the interval in progress and re-arms a work interval.
    ///
    /// # Errors
    ///
    /// Returns `NotActive` if the timer is idle; nothing is emitted then.
    pub fn cancel(&mut self) -> Result<(), TimerError> {
        if !self.session.state.is_active() {
            return Err(TimerError::NotActive);
        }

        let mode = self.session.mode;
        let elapsed_minutes = self.session.elapsed_minutes();

        if let Some(session_id) = self.session.backend_session_id.take() {
            self.emit(TimerEvent::CancelRequested {
                session_id,
                duration_minutes: elapsed_minutes,
            })?;
        }
        self.session.selected_subject_id = None;

        info!(mode = mode.as_str(), elapsed_minutes, "interval cancelled");
        self.emit(TimerEvent::Cancelled {
            mode,
            elapsed_minutes,
        })?;

        self.set_state(TimerState::Idle)?;
        self.rearm(TimerMode::Work)
    }

    // ------------------------------------------------------------------------
    // Configuration (idle only)
    // ------------------------------------------------------------------------

    /// Sets the work duration in minutes.
    ///
    /// # Errors
    ///
    /// Rejects values outside 1-120 and any change while not idle.
    pub fn set_work_minutes(&mut self, minutes: u32) -> Result<(), TimerError> {
        self.ensure_editable()?;
        let config = self.config.with_work_minutes(minutes);
        config.validate()?;
        self.config = config;
        debug!(minutes, "work duration changed");
        if self.session.mode == TimerMode::Work {
            self.rearm(TimerMode::Work)?;
        }
        Ok(())
    }

    /// Sets the break duration in minutes.
    ///
    /// # Errors
    ///
    /// Rejects values outside 1-60 and any change while not idle.
    pub fn set_break_minutes(&mut self, minutes: u32) -> Result<(), TimerError> {
        self.ensure_editable()?;
        let config = self.config.with_break_minutes(minutes);
        config.validate()?;
        self.config = config;
        debug!(minutes, "break duration changed");
        if self.session.mode == TimerMode::Break {
            self.rearm(TimerMode::Break)?;
        }
        Ok(())
    }

    /// Switches the armed mode while idle.
    pub fn select_mode(&mut self, mode: TimerMode) -> Result<(), TimerError> {
        self.ensure_editable()?;
        self.rearm(mode)
    }

    /// Chooses the subject recorded with the next work session.
    pub fn select_subject(&mut self, subject_id: Option<SubjectId>) -> Result<(), TimerError> {
        self.ensure_editable()?;
        self.subject_choice = subject_id;
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), TimerError> {
        if self.session.state != TimerState::Idle {
            return Err(TimerError::NotIdle);
        }
        if self.opening {
            return Err(TimerError::SessionPending);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn set_state(&mut self, to: TimerState) -> Result<(), TimerError> {
        let from = self.session.state;
        if from == to {
            return Ok(());
        }
        self.session.state = to;
        debug!(from = from.as_str(), to = to.as_str(), "timer state changed");
        self.emit(TimerEvent::StateChanged { from, to })
    }

    fn rearm(&mut self, mode: TimerMode) -> Result<(), TimerError> {
        self.session.rearm(mode, &self.config);
        self.emit(TimerEvent::Rearmed {
            mode,
            total_seconds: self.session.total_seconds,
        })
    }

    fn emit(&self, event: TimerEvent) -> Result<(), TimerError> {
        self.event_tx
            .send(event)
            .map_err(|_| TimerError::EventChannelClosed)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Returns the current interval record.
    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    /// Returns the render-facing view of the interval.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.session.snapshot()
    }

    /// Returns the configured durations.
    pub fn config(&self) -> &PomodoroConfig {
        &self.config
    }

    /// Returns the current run state.
    pub fn state(&self) -> TimerState {
        self.session.state
    }

    /// Returns the subject chosen for the next work session.
    pub fn subject_choice(&self) -> Option<SubjectId> {
        self.subject_choice
    }

    /// Returns true while an open call is outstanding.
    pub fn is_opening(&self) -> bool {
        self.opening
    }

    /// Returns a mutable reference to the session (for testing).
    #[cfg(test)]
    pub fn session_mut(&mut self) -> &mut TimerSession {
        &mut self.session
    }
}

// ============================================================================
// Tests
// ============================================================================
