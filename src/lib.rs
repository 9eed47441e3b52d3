//! Study Pomodoro Library
//!
//! This library provides the core of the study planner's Pomodoro timer.
//! It includes:
//! - Timer engine driving work/break intervals
//! - Session recorder reporting intervals to the planner backend
//! - Ambient sound playback tied to the timer
//! - Keyboard shortcuts gated by input focus
//! - Configuration loading, CLI parsing and display utilities

pub mod app;
pub mod backend;
pub mod cli;
pub mod config;
pub mod keyboard;
pub mod recorder;
pub mod sound;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use app::{AppEvent, AppOptions, Notice, NoticeKind, PomodoroApp};
pub use backend::{BackendError, IpcBackend, MemoryBackend, PomodoroBackend, StartRequest};
pub use config::{AppConfig, ConfigError};
pub use keyboard::{FocusTarget, KeyAction, KeyCode, KeyDispatch, KeyEvent, KeyboardController};
pub use recorder::{CloseKind, RecorderOutcome, SessionRecorder};
pub use sound::{
    AudioController, PlaybackStatus, SoundCatalog, SoundError, SoundId, SoundSnapshot, SoundSource,
};
pub use timer::{StartOutcome, TimerEngine, TimerError, TimerEvent};
pub use types::{
    HistorySummary, PomodoroConfig, PomodoroRecord, PomodoroStatus, SessionId, SubjectId, TaskId,
    TimerMode, TimerSnapshot, TimerState,
};
