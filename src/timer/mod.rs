//! Timer engine for the Pomodoro core.
//!
//! - `engine`: work/break state machine with backend session bookkeeping
//! - `error`: rejected-transition errors

pub mod engine;
pub mod error;

pub use engine::{StartOutcome, TimerEngine, TimerEvent};
pub use error::TimerError;
