//! Core data types for the Pomodoro core.
//!
//! This module defines the data structures used for:
//! - Timer mode/state and the in-memory session record
//! - Duration configuration with validation
//! - Backend session records and the daily history summary

use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerError;

/// Accepted work durations in minutes.
pub const WORK_MINUTES_RANGE: RangeInclusive<u32> = 1..=120;

/// Accepted break durations in minutes.
pub const BREAK_MINUTES_RANGE: RangeInclusive<u32> = 1..=60;

/// Work durations offered as one-key choices.
pub const WORK_PRESETS: [u32; 5] = [15, 25, 30, 45, 60];

/// Break durations offered as one-key choices.
pub const BREAK_PRESETS: [u32; 4] = [5, 10, 15, 20];

// ============================================================================
// Identifiers
// ============================================================================

/// Backend identifier of an opened pomodoro session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i64);

/// Reference to a study subject owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub i64);

/// Reference to a study task owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// TimerMode / TimerState
// ============================================================================

/// Which kind of interval the timer is counting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Focus interval
    #[default]
    Work,
    /// Rest interval following a completed work interval
    Break,
}

impl TimerMode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::Break => "break",
        }
    }

    /// Returns the other mode.
    pub fn flipped(&self) -> Self {
        match self {
            TimerMode::Work => TimerMode::Break,
            TimerMode::Break => TimerMode::Work,
        }
    }
}

/// Run state of the timer, orthogonal to [`TimerMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    /// Not counting; waiting for start
    #[default]
    Idle,
    /// Counting down once per second
    Running,
    /// Countdown suspended
    Paused,
}

impl TimerState {
    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
        }
    }

    /// Returns true if an interval is in progress (running or paused).
    pub fn is_active(&self) -> bool {
        matches!(self, TimerState::Running | TimerState::Paused)
    }
}

// ============================================================================
// PomodoroConfig
// ============================================================================

/// Work and break durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    /// Work duration in minutes (1-120)
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    /// Break duration in minutes (1-60)
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
}

fn default_work_minutes() -> u32 {
    25
}

fn default_break_minutes() -> u32 {
    5
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
        }
    }
}

impl PomodoroConfig {
    /// Creates a new configuration with the specified work duration.
    pub fn with_work_minutes(mut self, minutes: u32) -> Self {
        self.work_minutes = minutes;
        self
    }

    /// Creates a new configuration with the specified break duration.
    pub fn with_break_minutes(mut self, minutes: u32) -> Self {
        self.break_minutes = minutes;
        self
    }

    /// Validates both durations against their accepted ranges.
    pub fn validate(&self) -> Result<(), TimerError> {
        if !WORK_MINUTES_RANGE.contains(&self.work_minutes) {
            return Err(TimerError::InvalidWorkMinutes(self.work_minutes));
        }
        if !BREAK_MINUTES_RANGE.contains(&self.break_minutes) {
            return Err(TimerError::InvalidBreakMinutes(self.break_minutes));
        }
        Ok(())
    }

    /// Returns the configured length of the given mode in seconds.
    pub fn seconds_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Work => self.work_minutes * 60,
            TimerMode::Break => self.break_minutes * 60,
        }
    }
}

// ============================================================================
// TimerSession
// ============================================================================

/// In-memory record of the current interval.
///
/// Owned by the timer engine and only mutated through its transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSession {
    /// Active mode
    pub mode: TimerMode,
    /// Run state
    pub state: TimerState,
    /// Seconds left in the interval, within `0..=total_seconds`
    pub remaining_seconds: u32,
    /// Length of the interval when it started
    pub total_seconds: u32,
    /// Open backend session, work mode only
    pub backend_session_id: Option<SessionId>,
    /// Subject captured when the work session started
    pub selected_subject_id: Option<SubjectId>,
}

impl TimerSession {
    /// Creates an idle work session armed with the configured work duration.
    pub fn new(config: &PomodoroConfig) -> Self {
        let total = config.seconds_for(TimerMode::Work);
        Self {
            mode: TimerMode::Work,
            state: TimerState::Idle,
            remaining_seconds: total,
            total_seconds: total,
            backend_session_id: None,
            selected_subject_id: None,
        }
    }

    /// Re-arms the countdown for `mode` using the configured duration.
    pub fn rearm(&mut self, mode: TimerMode, config: &PomodoroConfig) {
        let total = config.seconds_for(mode);
        self.mode = mode;
        self.total_seconds = total;
        self.remaining_seconds = total;
    }

    /// Whole minutes actually counted down so far.
    pub fn elapsed_minutes(&self) -> u32 {
        (self.total_seconds - self.remaining_seconds) / 60
    }

    /// Returns the render-facing view of the session.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            state: self.state,
            remaining_seconds: self.remaining_seconds,
            total_seconds: self.total_seconds,
        }
    }
}

/// What the shell needs to draw the progress ring and digital time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub state: TimerState,
    pub remaining_seconds: u32,
    pub total_seconds: u32,
}

impl TimerSnapshot {
    /// Fraction of the interval already elapsed, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        f64::from(self.total_seconds - self.remaining_seconds) / f64::from(self.total_seconds)
    }
}

// ============================================================================
// Backend records
// ============================================================================

/// Lifecycle status of a backend session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PomodoroStatus {
    /// Ran to completion
    Completed,
    /// Cancelled before expiry
    Cancelled,
    /// Opened and not yet closed
    #[serde(alias = "running")]
    Pending,
}

impl PomodoroStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PomodoroStatus::Completed => "completed",
            PomodoroStatus::Cancelled => "cancelled",
            PomodoroStatus::Pending => "pending",
        }
    }
}

/// A session record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroRecord {
    pub id: SessionId,
    #[serde(default)]
    pub subject_id: Option<SubjectId>,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub status: PomodoroStatus,
}

/// Today's completed pomodoros and focused minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub today_count: u32,
    pub today_minutes: u32,
}

impl HistorySummary {
    /// Summarises the completed records that started on `today` (UTC).
    pub fn from_records(records: &[PomodoroRecord], today: NaiveDate) -> Self {
        records
            .iter()
            .filter(|r| r.status == PomodoroStatus::Completed)
            .filter(|r| r.start_time.date_naive() == today)
            .fold(Self::default(), |acc, r| Self {
                today_count: acc.today_count + 1,
                today_minutes: acc.today_minutes + r.duration_minutes,
            })
    }
}

// ============================================================================
// Tests
// ============================================================================
