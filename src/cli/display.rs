//! Display utilities for the study-pomodoro CLI.
//!
//! This module provides formatted output for:
//! - The interactive status line
//! - Session history and today's totals
//! - The sound catalog
//! - Error messages

use crate::sound::{PlaybackStatus, SoundCatalog, SoundId, SoundSnapshot};
use crate::types::{HistorySummary, PomodoroRecord, TimerMode, TimerSnapshot, TimerState};

/// Width of the progress bar in the status line.
const PROGRESS_WIDTH: usize = 20;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Builds the single status line shown by `run`.
    pub fn status_line(
        timer: &TimerSnapshot,
        sound: &SoundSnapshot,
        summary: &HistorySummary,
        notice: Option<&str>,
        prompt: Option<&str>,
    ) -> String {
        let mut line = format!(
            "{} {} {} [{}]",
            Self::mode_label(timer.mode),
            Self::state_marker(timer.state),
            Self::format_time(timer.remaining_seconds),
            Self::progress_bar(timer.progress(), PROGRESS_WIDTH),
        );

        line.push_str(&format!(
            " | sound: {}",
            Self::sound_label(sound)
        ));
        line.push_str(&format!(
            " | today: {} ({} min)",
            summary.today_count, summary.today_minutes
        ));

        if let Some(prompt) = prompt {
            line.push_str(&format!(" | {prompt}"));
        } else if let Some(notice) = notice {
            line.push_str(&format!(" | ! {notice} (x to dismiss)"));
        }
        line
    }

    /// Prints the key bindings shown before the timer starts.
    pub fn show_key_help() {
        println!("study-pomodoro");
        println!("─────────────────────────────");
        println!("  Space  start / pause / resume");
        println!("  Esc    cancel");
        println!("  w / b  edit work / break minutes (Enter applies)");
        println!("  W / B  next work / break preset");
        println!("  m      switch work / break");
        println!("  0-7    choose ambient sound");
        println!("  + / -  volume");
        println!("  p      preview sound   s  stop sound");
        println!("  x      dismiss notice  q  quit");
        println!();
    }

    /// Shows recent sessions and today's totals.
    pub fn show_history(records: &[PomodoroRecord], summary: &HistorySummary) {
        println!("Today: {} pomodoros, {} min", summary.today_count, summary.today_minutes);
        println!("─────────────────────────────");

        if records.is_empty() {
            println!("No sessions recorded yet");
            return;
        }

        for record in records {
            println!("{}", Self::history_row(record));
        }
    }

    /// Shows the ambient sound catalog.
    pub fn show_sounds(catalog: &SoundCatalog, current: SoundId) {
        for (index, (id, source)) in catalog.entries().enumerate() {
            let marker = if id == current { "*" } else { " " };
            let location = source.map(ToString::to_string).unwrap_or_default();
            println!(
                "{marker} {index}  {:<8} {:<13} {location}",
                id.as_str(),
                id.label()
            );
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }

    fn history_row(record: &PomodoroRecord) -> String {
        let subject = record.subject_name.as_deref().unwrap_or("-");
        format!(
            "{:<6} {}  {:>3} min  {:<9}  {}",
            record.id.to_string(),
            record.start_time.format("%Y-%m-%d %H:%M"),
            record.duration_minutes,
            record.status.as_str(),
            subject
        )
    }

    fn mode_label(mode: TimerMode) -> &'static str {
        match mode {
            TimerMode::Work => "WORK ",
            TimerMode::Break => "BREAK",
        }
    }

    fn state_marker(state: TimerState) -> &'static str {
        match state {
            TimerState::Idle => "[]",
            TimerState::Running => "> ",
            TimerState::Paused => "||",
        }
    }

    fn sound_label(sound: &SoundSnapshot) -> String {
        if sound.sound_id.is_none() {
            return "off".to_string();
        }
        let name = sound.sound_id.label();
        match sound.status {
            PlaybackStatus::Stopped => format!("{name} (vol {})", sound.volume),
            PlaybackStatus::Loading => format!("{name} loading..."),
            PlaybackStatus::Playing => format!("{name} playing (vol {})", sound.volume),
            PlaybackStatus::Error => format!(
                "{name} - {}",
                sound.error.as_deref().unwrap_or("unavailable")
            ),
        }
    }

    /// Formats seconds as `MM:SS`.
    fn format_time(total_seconds: u32) -> String {
        format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
    }

    fn progress_bar(progress: f64, width: usize) -> String {
        let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
        format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
    }
}

// ============================================================================
// Tests
// ============================================================================
