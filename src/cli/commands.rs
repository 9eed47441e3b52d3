//! Command definitions for the study-pomodoro CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::sound::SoundId;

// ============================================================================
// CLI Structure
// ============================================================================

/// Study Pomodoro - focus timer with session recording and ambient sound
#[derive(Parser, Debug)]
#[command(
    name = "study-pomodoro",
    version,
    about = "Pomodoro focus timer for the study planner",
    long_about = "Interactive work/break timer. Work sessions are recorded on the study \
                  planner backend, and an optional ambient sound loops while the timer runs.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to <config_dir>/study-pomodoro/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the interactive timer
    Run(RunArgs),

    /// Show recent sessions and today's totals
    History(HistoryArgs),

    /// List the ambient sounds
    Sounds,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Work duration in minutes (1-120)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=120))]
    pub work: Option<u32>,

    /// Break duration in minutes (1-60)
    #[arg(
        short,
        long = "break",
        value_name = "BREAK",
        value_parser = clap::value_parser!(u32).range(1..=60)
    )]
    pub break_time: Option<u32>,

    /// Subject recorded with work sessions
    #[arg(long)]
    pub subject: Option<i64>,

    /// Task recorded with work sessions
    #[arg(short, long)]
    pub task: Option<i64>,

    /// Ambient sound chosen at startup (none, rain, forest, ocean, fire, wind, stream, thunder)
    #[arg(short, long, value_parser = parse_sound_id)]
    pub sound: Option<SoundId>,

    /// Initial volume (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: Option<u8>,

    /// Backend socket path
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Keep sessions in memory instead of calling the backend
    #[arg(long)]
    pub offline: bool,
}

/// Arguments for the history command
#[derive(Args, Debug, Clone, Default)]
pub struct HistoryArgs {
    /// Number of records to show
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=500))]
    pub limit: Option<u32>,

    /// Backend socket path
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Validation Functions
// ============================================================================

fn parse_sound_id(s: &str) -> Result<SoundId, String> {
    s.parse::<SoundId>().map_err(|e| e.to_string())
}

// ============================================================================
// Tests
// ============================================================================
