//! Interactive terminal shell for `study-pomodoro run`.
//!
//! Puts the terminal in raw mode, reads keys on a blocking thread and
//! redraws one status line after every key or app event.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode as TermKey, KeyEvent as TermKeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::queue;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::PomodoroApp;
use crate::backend::PomodoroBackend;
use crate::keyboard::{FocusTarget, KeyCode, KeyEvent};
use crate::sound::{AudioOutput, SoundFetcher, SoundId, MAX_VOLUME};
use crate::types::{BREAK_PRESETS, WORK_PRESETS};

use super::display::Display;

/// How long quitting waits for outstanding backend calls.
const SHUTDOWN_FLUSH: Duration = Duration::from_secs(3);

/// Volume change per `+`/`-` press.
const VOLUME_STEP: u8 = 10;

/// Longest accepted minutes entry.
const MAX_ENTRY_DIGITS: usize = 3;

// ============================================================================
// Raw mode
// ============================================================================

/// Restores the terminal when dropped, including on early return.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("failed to enable raw terminal mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!(error = %e, "failed to restore terminal mode");
        }
    }
}

fn spawn_input_thread(tx: mpsc::UnboundedSender<Event>) {
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(event) => {
                if tx.send(event).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "terminal input closed");
                break;
            }
        }
    });
}

// ============================================================================
// Input modes
// ============================================================================

/// Duration being edited from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DurationField {
    Work,
    Break,
}

impl DurationField {
    fn label(self) -> &'static str {
        match self {
            DurationField::Work => "work",
            DurationField::Break => "break",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputMode {
    Normal,
    Editing { field: DurationField, buffer: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Continue,
    Quit,
}

// ============================================================================
// TerminalShell
// ============================================================================

/// Keyboard-driven front end over [`PomodoroApp`].
pub struct TerminalShell<B, F, O: AudioOutput> {
    app: PomodoroApp<B, F, O>,
    mode: InputMode,
}

impl<B, F, O> TerminalShell<B, F, O>
where
    B: PomodoroBackend,
    F: SoundFetcher,
    O: AudioOutput,
{
    pub fn new(app: PomodoroApp<B, F, O>) -> Self {
        Self {
            app,
            mode: InputMode::Normal,
        }
    }

    /// Runs until the user quits, then closes any open session.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be switched to raw mode or
    /// written to.
    pub async fn run(mut self) -> Result<()> {
        Display::show_key_help();

        let guard = RawModeGuard::enable()?;
        let (input_tx, mut input_rx) = mpsc::unbounded_channel();
        spawn_input_thread(input_tx);

        self.app.refresh_history();
        let mut stdout = io::stdout();
        self.render(&mut stdout)?;

        loop {
            tokio::select! {
                input = input_rx.recv() => match input {
                    Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if self.on_key(key) == Control::Quit {
                            break;
                        }
                    }
                    Some(_) => {}
                    None => break,
                },
                event = self.app.next_event() => self.app.handle(event),
            }
            self.render(&mut stdout)?;
        }

        self.shutdown().await;
        self.render(&mut stdout)?;
        drop(guard);
        println!();
        Ok(())
    }

    /// Cancels an active interval and waits for the backend to settle.
    async fn shutdown(&mut self) {
        // A pending open may still turn into a running session.
        self.app.flush(SHUTDOWN_FLUSH).await;
        if self.app.timer_snapshot().state.is_active() {
            info!("quitting with an active interval, cancelling it");
            if let Err(e) = self.app.cancel() {
                debug!(error = %e, "cancel on quit did not apply");
            }
        }
        self.app.flush(SHUTDOWN_FLUSH).await;
    }

    fn render(&self, out: &mut impl Write) -> io::Result<()> {
        let prompt = self.prompt();
        let line = Display::status_line(
            &self.app.timer_snapshot(),
            &self.app.sound_snapshot(),
            &self.app.summary(),
            self.app.notice().map(|notice| notice.message.as_str()),
            prompt.as_deref(),
        );
        queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line))?;
        out.flush()
    }

    fn prompt(&self) -> Option<String> {
        match &self.mode {
            InputMode::Normal => None,
            InputMode::Editing { field, buffer } => {
                Some(format!("{} minutes: {buffer}_", field.label()))
            }
        }
    }

    // ------------------------------------------------------------------------
    // Key handling
    // ------------------------------------------------------------------------

    fn on_key(&mut self, key: TermKeyEvent) -> Control {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == TermKey::Char('c') {
            return Control::Quit;
        }

        let focus = match self.mode {
            InputMode::Normal => FocusTarget::Elsewhere,
            InputMode::Editing { .. } => FocusTarget::TextInput,
        };
        if self.app.handle_key(&KeyEvent::new(map_key(key.code), focus)).is_handled() {
            return Control::Continue;
        }

        match self.mode {
            InputMode::Normal => self.on_normal_key(key.code),
            InputMode::Editing { .. } => {
                self.on_editing_key(key.code);
                Control::Continue
            }
        }
    }

    fn on_normal_key(&mut self, code: TermKey) -> Control {
        let TermKey::Char(c) = code else {
            return Control::Continue;
        };

        match c {
            'q' => return Control::Quit,
            'w' => self.begin_edit(DurationField::Work),
            'b' => self.begin_edit(DurationField::Break),
            'W' => {
                let next = next_preset(&WORK_PRESETS, self.app.engine().config().work_minutes);
                self.set_minutes(DurationField::Work, next);
            }
            'B' => {
                let next = next_preset(&BREAK_PRESETS, self.app.engine().config().break_minutes);
                self.set_minutes(DurationField::Break, next);
            }
            'm' => {
                let mode = self.app.timer_snapshot().mode.flipped();
                if let Err(e) = self.app.select_mode(mode) {
                    debug!(error = %e, "mode switch ignored");
                }
            }
            '+' | '=' => {
                let volume = self.app.sound_snapshot().volume;
                self.app.set_volume(volume.saturating_add(VOLUME_STEP).min(MAX_VOLUME));
            }
            '-' => {
                let volume = self.app.sound_snapshot().volume;
                self.app.set_volume(volume.saturating_sub(VOLUME_STEP));
            }
            'p' => self.app.preview_sound(),
            's' => self.app.stop_sound(),
            'x' => self.app.dismiss_notice(),
            digit => {
                if let Some(sound_id) = SoundId::from_digit(digit) {
                    self.app.select_sound(sound_id);
                }
            }
        }
        Control::Continue
    }

    fn begin_edit(&mut self, field: DurationField) {
        self.mode = InputMode::Editing {
            field,
            buffer: String::new(),
        };
    }

    fn on_editing_key(&mut self, code: TermKey) {
        let InputMode::Editing { field, buffer } = &mut self.mode else {
            return;
        };
        match code {
            TermKey::Char(c) if c.is_ascii_digit() && buffer.len() < MAX_ENTRY_DIGITS => {
                buffer.push(c);
            }
            TermKey::Backspace => {
                buffer.pop();
            }
            TermKey::Enter => {
                let field = *field;
                let entry = std::mem::take(buffer);
                self.mode = InputMode::Normal;
                self.apply_duration(field, &entry);
            }
            TermKey::Esc => self.mode = InputMode::Normal,
            _ => {}
        }
    }

    /// Out-of-range or unparsable entries leave the duration unchanged.
    fn apply_duration(&mut self, field: DurationField, entry: &str) {
        let Ok(minutes) = entry.parse::<u32>() else {
            debug!(entry, "ignoring non-numeric duration");
            return;
        };
        self.set_minutes(field, minutes);
    }

    fn set_minutes(&mut self, field: DurationField, minutes: u32) {
        let result = match field {
            DurationField::Work => self.app.set_work_duration(minutes),
            DurationField::Break => self.app.set_break_duration(minutes),
        };
        if let Err(e) = result {
            debug!(field = field.label(), minutes, error = %e, "duration rejected");
        }
    }
}

/// Returns the first preset above `current`, wrapping to the smallest.
fn next_preset(presets: &[u32], current: u32) -> u32 {
    presets
        .iter()
        .copied()
        .find(|&minutes| minutes > current)
        .or_else(|| presets.first().copied())
        .unwrap_or(current)
}

fn map_key(code: TermKey) -> KeyCode {
    match code {
        TermKey::Char(' ') => KeyCode::Space,
        TermKey::Esc => KeyCode::Escape,
        TermKey::Char(c) => KeyCode::Char(c),
        _ => KeyCode::Other,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppOptions;
    use crate::backend::MemoryBackend;
    use crate::sound::{MockAudioOutput, MockSoundFetcher, PlaybackStatus};
    use crate::types::{PomodoroConfig, TimerMode, TimerState};
    use std::sync::Arc;

    type TestShell = TerminalShell<MemoryBackend, MockSoundFetcher, MockAudioOutput>;

    fn create_shell() -> (TestShell, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let app = PomodoroApp::new(
            PomodoroConfig::default(),
            Arc::clone(&backend),
            Arc::new(MockSoundFetcher::new()),
            MockAudioOutput::new(),
            AppOptions::default(),
        );
        (TerminalShell::new(app), backend)
    }

    fn press(shell: &mut TestShell, code: TermKey) -> Control {
        shell.on_key(TermKeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(shell: &mut TestShell, text: &str) {
        for c in text.chars() {
            press(shell, TermKey::Char(c));
        }
    }

    #[test]
    fn test_next_preset() {
        assert_eq!(next_preset(&WORK_PRESETS, 25), 30);
        assert_eq!(next_preset(&WORK_PRESETS, 27), 30);
        assert_eq!(next_preset(&WORK_PRESETS, 60), 15);
        assert_eq!(next_preset(&WORK_PRESETS, 120), 15);
        assert_eq!(next_preset(&BREAK_PRESETS, 5), 10);
        assert_eq!(next_preset(&[], 7), 7);
    }

    #[test]
    fn test_map_key() {
        assert_eq!(map_key(TermKey::Char(' ')), KeyCode::Space);
        assert_eq!(map_key(TermKey::Esc), KeyCode::Escape);
        assert_eq!(map_key(TermKey::Char('w')), KeyCode::Char('w'));
        assert_eq!(map_key(TermKey::Tab), KeyCode::Other);
    }

    mod quit_tests {
        use super::*;

        #[tokio::test]
        async fn test_q_and_ctrl_c_quit() {
            let (mut shell, _) = create_shell();
            assert_eq!(press(&mut shell, TermKey::Char('q')), Control::Quit);

            let ctrl_c = TermKeyEvent::new(TermKey::Char('c'), KeyModifiers::CONTROL);
            assert_eq!(shell.on_key(ctrl_c), Control::Quit);
        }

        #[tokio::test]
        async fn test_q_while_editing_is_text() {
            let (mut shell, _) = create_shell();
            press(&mut shell, TermKey::Char('w'));
            assert_eq!(press(&mut shell, TermKey::Char('q')), Control::Continue);
        }

        #[tokio::test(start_paused = true)]
        async fn test_shutdown_cancels_active_interval() {
            let (mut shell, backend) = create_shell();
            press(&mut shell, TermKey::Char(' '));
            shell.app.step().await;
            assert_eq!(shell.app.timer_snapshot().state, TimerState::Running);

            shell.shutdown().await;

            assert_eq!(shell.app.timer_snapshot().state, TimerState::Idle);
            assert_eq!(backend.cancel_count(), 1);
            assert_eq!(shell.app.in_flight(), 0);
        }
    }

    mod editing_tests {
        use super::*;

        #[tokio::test]
        async fn test_edit_work_duration() {
            let (mut shell, _) = create_shell();
            press(&mut shell, TermKey::Char('w'));
            type_str(&mut shell, "45");
            assert_eq!(shell.prompt().as_deref(), Some("work minutes: 45_"));

            press(&mut shell, TermKey::Enter);
            assert_eq!(shell.mode, InputMode::Normal);
            assert_eq!(shell.app.engine().config().work_minutes, 45);
            assert_eq!(shell.app.timer_snapshot().remaining_seconds, 45 * 60);
        }

        #[tokio::test]
        async fn test_out_of_range_entry_is_ignored() {
            let (mut shell, _) = create_shell();
            press(&mut shell, TermKey::Char('b'));
            type_str(&mut shell, "999");
            press(&mut shell, TermKey::Enter);
            assert_eq!(shell.app.engine().config().break_minutes, 5);

            press(&mut shell, TermKey::Char('b'));
            press(&mut shell, TermKey::Enter);
            assert_eq!(shell.app.engine().config().break_minutes, 5);
        }

        #[tokio::test]
        async fn test_entry_is_limited_and_editable() {
            let (mut shell, _) = create_shell();
            press(&mut shell, TermKey::Char('w'));
            type_str(&mut shell, "1234x");
            assert_eq!(shell.prompt().as_deref(), Some("work minutes: 123_"));
            press(&mut shell, TermKey::Backspace);
            assert_eq!(shell.prompt().as_deref(), Some("work minutes: 12_"));
        }

        #[tokio::test]
        async fn test_shortcuts_ignored_while_editing() {
            let (mut shell, backend) = create_shell();
            press(&mut shell, TermKey::Char('w'));
            press(&mut shell, TermKey::Char(' '));

            assert_eq!(shell.app.timer_snapshot().state, TimerState::Idle);
            assert!(!shell.app.engine().is_opening());
            assert_eq!(backend.start_count(), 0);

            press(&mut shell, TermKey::Esc);
            assert_eq!(shell.mode, InputMode::Normal);
            assert_eq!(shell.app.engine().config().work_minutes, 25);
        }
    }

    mod normal_key_tests {
        use super::*;

        #[tokio::test]
        async fn test_mode_toggle() {
            let (mut shell, _) = create_shell();
            press(&mut shell, TermKey::Char('m'));
            assert_eq!(shell.app.timer_snapshot().mode, TimerMode::Break);
            assert_eq!(shell.app.timer_snapshot().remaining_seconds, 5 * 60);
            press(&mut shell, TermKey::Char('m'));
            assert_eq!(shell.app.timer_snapshot().mode, TimerMode::Work);
        }

        #[tokio::test]
        async fn test_volume_keys_clamp() {
            let (mut shell, _) = create_shell();
            for _ in 0..8 {
                press(&mut shell, TermKey::Char('+'));
            }
            assert_eq!(shell.app.sound_snapshot().volume, 100);
            for _ in 0..12 {
                press(&mut shell, TermKey::Char('-'));
            }
            assert_eq!(shell.app.sound_snapshot().volume, 0);
        }

        #[tokio::test]
        async fn test_digit_chooses_sound_while_idle() {
            let (mut shell, _) = create_shell();
            press(&mut shell, TermKey::Char('1'));
            let sound = shell.app.sound_snapshot();
            assert_eq!(sound.sound_id, SoundId::Rain);
            assert_eq!(sound.status, PlaybackStatus::Stopped);

            press(&mut shell, TermKey::Char('9'));
            assert_eq!(shell.app.sound_snapshot().sound_id, SoundId::Rain);

            press(&mut shell, TermKey::Char('s'));
            assert_eq!(shell.app.sound_snapshot().sound_id, SoundId::None);
        }

        #[tokio::test]
        async fn test_preview_is_ignored_while_idle() {
            let (mut shell, _) = create_shell();
            press(&mut shell, TermKey::Char('2'));
            press(&mut shell, TermKey::Char('p'));
            assert_eq!(shell.app.sound_snapshot().status, PlaybackStatus::Stopped);
            assert_eq!(shell.app.audio().output().play_count(), 0);
        }

        #[tokio::test]
        async fn test_preset_keys_cycle_durations() {
            let (mut shell, _) = create_shell();

            press(&mut shell, TermKey::Char('W'));
            assert_eq!(shell.app.engine().config().work_minutes, 30);
            assert_eq!(shell.app.timer_snapshot().remaining_seconds, 30 * 60);
            press(&mut shell, TermKey::Char('W'));
            press(&mut shell, TermKey::Char('W'));
            assert_eq!(shell.app.engine().config().work_minutes, 60);
            press(&mut shell, TermKey::Char('W'));
            assert_eq!(shell.app.engine().config().work_minutes, 15);

            press(&mut shell, TermKey::Char('B'));
            assert_eq!(shell.app.engine().config().break_minutes, 10);
        }

        #[tokio::test(start_paused = true)]
        async fn test_dismiss_notice() {
            let (mut shell, backend) = create_shell();
            backend.set_should_fail_start(true);
            press(&mut shell, TermKey::Char(' '));
            shell.app.step().await;
            assert!(shell.app.notice().is_some());

            press(&mut shell, TermKey::Char('x'));
            assert!(shell.app.notice().is_none());
        }
    }

    #[tokio::test]
    async fn test_render_writes_status_line() {
        let (shell, _) = create_shell();
        let mut out = Vec::new();
        shell.render(&mut out).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("WORK"));
        assert!(text.contains("25:00"));
    }
}
