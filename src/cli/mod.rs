//! CLI module for study-pomodoro.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic
//! - `terminal`: Raw-mode interactive shell for `run`

pub mod commands;
pub mod display;
pub mod terminal;

pub use commands::{Cli, Commands, HistoryArgs, RunArgs};
pub use display::Display;
pub use terminal::TerminalShell;
