//! Pomodoro application core.
//!
//! `PomodoroApp` wires the timer engine to the session recorder, the
//! ambient sound controller and the keyboard shortcuts, and owns the
//! one-second ticker. A shell drives it by calling actions and by
//! awaiting [`PomodoroApp::next_event`] / [`PomodoroApp::handle`].
//!
//! ```text
//!  actions ──▶ TimerEngine ──TimerEvent──▶ dispatch ──▶ SessionRecorder ─┐
//!                  ▲                          │                         │
//!                  │ tick                     └──▶ AudioController ─┐   │
//!              Interval                                             │   │
//!                  ▲                                                ▼   ▼
//!                  └──────────── next_event (ticker / loads / backend outcomes)
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::backend::{PomodoroBackend, StartRequest};
use crate::keyboard::{KeyAction, KeyDispatch, KeyEvent, KeyboardController};
use crate::recorder::{CloseKind, RecorderOutcome, SessionRecorder};
use crate::sound::{
    AudioController, AudioEvent, AudioOutput, SoundCatalog, SoundFetcher, SoundId, SoundSnapshot,
};
use crate::timer::{StartOutcome, TimerEngine, TimerError, TimerEvent};
use crate::types::{
    HistorySummary, PomodoroConfig, PomodoroRecord, SubjectId, TaskId, TimerMode, TimerSnapshot,
    TimerState,
};

/// Countdown resolution.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

// ============================================================================
// Notice
// ============================================================================

/// Which backend call a notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    StartFailed,
    CompleteFailed,
    CancelFailed,
}

/// A dismissible message about a failed backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn new(kind: NoticeKind, detail: impl std::fmt::Display) -> Self {
        let prefix = match kind {
            NoticeKind::StartFailed => "Could not start the session",
            NoticeKind::CompleteFailed => "Could not record the completed session",
            NoticeKind::CancelFailed => "Could not record the cancelled session",
        };
        Self {
            kind,
            message: format!("{prefix}: {detail}"),
        }
    }
}

// ============================================================================
// AppOptions / AppEvent
// ============================================================================

/// Startup settings for [`PomodoroApp`].
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Records requested per history refresh
    pub history_limit: u32,
    /// Playable tracks
    pub catalog: SoundCatalog,
    /// Initial volume (0-100)
    pub volume: u8,
    /// Initially chosen sound
    pub sound: SoundId,
    /// Subject for the first work session
    pub subject_id: Option<SubjectId>,
    /// Task attached to every work session
    pub task_id: Option<TaskId>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            history_limit: 20,
            catalog: SoundCatalog::builtin(),
            volume: 50,
            sound: SoundId::None,
            subject_id: None,
            task_id: None,
        }
    }
}

/// Something the app must react to.
#[derive(Debug)]
pub enum AppEvent {
    /// One second elapsed while running
    Tick,
    /// A backend call finished
    Recorder(RecorderOutcome),
    /// A track load finished
    Audio(AudioEvent),
}

// ============================================================================
// PomodoroApp
// ============================================================================

/// Timer, recorder, sound and shortcuts behind one set of actions.
pub struct PomodoroApp<B, F, O: AudioOutput> {
    engine: TimerEngine,
    timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    recorder: SessionRecorder<B>,
    recorder_rx: mpsc::UnboundedReceiver<RecorderOutcome>,
    audio: AudioController<F, O>,
    audio_rx: mpsc::UnboundedReceiver<AudioEvent>,
    keyboard: KeyboardController,
    ticker: Option<Interval>,
    task_id: Option<TaskId>,
    notice: Option<Notice>,
    history: Vec<PomodoroRecord>,
    summary: HistorySummary,
}

impl<B, F, O> PomodoroApp<B, F, O>
where
    B: PomodoroBackend,
    F: SoundFetcher,
    O: AudioOutput,
{
    pub fn new(
        config: PomodoroConfig,
        backend: Arc<B>,
        fetcher: Arc<F>,
        output: O,
        options: AppOptions,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (recorder_tx, recorder_rx) = mpsc::unbounded_channel();
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();

        let mut engine = TimerEngine::new(config, timer_tx);
        let _ = engine.select_subject(options.subject_id);

        let mut audio = AudioController::new(options.catalog, fetcher, output, options.volume, audio_tx);
        audio.choose(options.sound);

        let mut app = Self {
            engine,
            timer_rx,
            recorder: SessionRecorder::new(backend, options.history_limit, recorder_tx),
            recorder_rx,
            audio,
            audio_rx,
            keyboard: KeyboardController::new(),
            ticker: None,
            task_id: options.task_id,
            notice: None,
            history: Vec::new(),
            summary: HistorySummary::default(),
        };
        app.drain_timer_events();
        app
    }

    // ------------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------------

    /// Waits for the next tick, load or backend outcome.
    ///
    /// Backend outcomes and loads are taken before ticks, so a session id
    /// that arrived in the same instant as a tick is applied first.
    pub async fn next_event(&mut self) -> AppEvent {
        tokio::select! {
            biased;
            Some(outcome) = self.recorder_rx.recv() => AppEvent::Recorder(outcome),
            Some(event) = self.audio_rx.recv() => AppEvent::Audio(event),
            () = next_tick(&mut self.ticker) => AppEvent::Tick,
        }
    }

    /// Applies one event.
    pub fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tick => {
                if let Err(e) = self.engine.tick() {
                    warn!(error = %e, "tick failed");
                }
            }
            AppEvent::Recorder(outcome) => {
                self.recorder.settle();
                self.apply_outcome(outcome);
            }
            AppEvent::Audio(event) => self.audio.on_loaded(event),
        }
        self.drain_timer_events();
    }

    /// Waits for and applies one event.
    pub async fn step(&mut self) {
        let event = self.next_event().await;
        self.handle(event);
    }

    /// Processes events until no backend call is outstanding.
    ///
    /// Returns false if calls were still outstanding after `limit`.
    pub async fn flush(&mut self, limit: Duration) -> bool {
        let drained = tokio::time::timeout(limit, async {
            while self.recorder.in_flight() > 0 {
                self.step().await;
            }
        })
        .await;

        match drained {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    in_flight = self.recorder.in_flight(),
                    "backend calls still outstanding at exit"
                );
                false
            }
        }
    }

    fn apply_outcome(&mut self, outcome: RecorderOutcome) {
        match outcome {
            RecorderOutcome::Opened(Ok(record)) => {
                if let Err(e) = self.engine.session_opened(record.id) {
                    warn!(session_id = %record.id, error = %e, "ignoring session id");
                }
            }
            RecorderOutcome::Opened(Err(e)) => {
                self.engine.session_open_failed();
                self.notice = Some(Notice::new(NoticeKind::StartFailed, e));
            }
            RecorderOutcome::Closed { result: Ok(()), .. } => self.refresh_history(),
            RecorderOutcome::Closed {
                kind,
                result: Err(e),
                ..
            } => {
                let kind = match kind {
                    CloseKind::Complete => NoticeKind::CompleteFailed,
                    CloseKind::Cancel => NoticeKind::CancelFailed,
                };
                self.notice = Some(Notice::new(kind, e));
            }
            RecorderOutcome::History(Ok(records)) => {
                self.summary = HistorySummary::from_records(&records, Utc::now().date_naive());
                self.history = records;
            }
            RecorderOutcome::History(Err(_)) => {}
        }
    }

    fn drain_timer_events(&mut self) {
        while let Ok(event) = self.timer_rx.try_recv() {
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::OpenRequested {
                subject_id,
                task_id,
                duration_minutes,
            } => self.recorder.open(StartRequest {
                subject_id,
                task_id,
                duration_minutes: Some(duration_minutes),
            }),
            TimerEvent::CompleteRequested {
                session_id,
                duration_minutes,
            } => self.recorder.complete(session_id, duration_minutes),
            TimerEvent::CancelRequested {
                session_id,
                duration_minutes,
            } => self.recorder.cancel(session_id, duration_minutes),
            TimerEvent::StateChanged { from, to } => self.on_state_changed(from, to),
            TimerEvent::IntervalCompleted { mode } => {
                info!(mode = mode.as_str(), "interval finished");
            }
            TimerEvent::Cancelled {
                mode,
                elapsed_minutes,
            } => debug!(mode = mode.as_str(), elapsed_minutes, "interval cancelled"),
            TimerEvent::Tick { .. } | TimerEvent::Rearmed { .. } => {}
        }
    }

    fn on_state_changed(&mut self, from: TimerState, to: TimerState) {
        match to {
            TimerState::Running => {
                self.arm_ticker();
                if from == TimerState::Idle {
                    self.audio.play_selected();
                }
            }
            TimerState::Paused => self.ticker = None,
            TimerState::Idle => {
                self.ticker = None;
                self.audio.halt();
            }
        }
    }

    fn arm_ticker(&mut self) {
        let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(ticker);
    }

    // ------------------------------------------------------------------------
    // Timer actions
    // ------------------------------------------------------------------------

    /// Starts the armed interval.
    pub fn start(&mut self) -> Result<StartOutcome, TimerError> {
        let outcome = self.engine.start(self.task_id);
        self.drain_timer_events();
        outcome
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        let result = self.engine.pause();
        self.drain_timer_events();
        result
    }

    pub fn resume(&mut self) -> Result<(), TimerError> {
        let result = self.engine.resume();
        self.drain_timer_events();
        result
    }

    pub fn cancel(&mut self) -> Result<(), TimerError> {
        let result = self.engine.cancel();
        self.drain_timer_events();
        result
    }

    pub fn set_work_duration(&mut self, minutes: u32) -> Result<(), TimerError> {
        let result = self.engine.set_work_minutes(minutes);
        self.drain_timer_events();
        result
    }

    pub fn set_break_duration(&mut self, minutes: u32) -> Result<(), TimerError> {
        let result = self.engine.set_break_minutes(minutes);
        self.drain_timer_events();
        result
    }

    pub fn select_mode(&mut self, mode: TimerMode) -> Result<(), TimerError> {
        let result = self.engine.select_mode(mode);
        self.drain_timer_events();
        result
    }

    pub fn select_subject(&mut self, subject_id: Option<SubjectId>) -> Result<(), TimerError> {
        self.engine.select_subject(subject_id)
    }

    // ------------------------------------------------------------------------
    // Sound actions
    // ------------------------------------------------------------------------

    /// Plays `sound_id` now, or only records it while idle.
    pub fn select_sound(&mut self, sound_id: SoundId) {
        if self.engine.state() == TimerState::Idle {
            self.audio.choose(sound_id);
        } else {
            self.audio.select(sound_id);
        }
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.audio.set_volume(volume);
    }

    /// Stops the ambient track and clears the choice.
    pub fn stop_sound(&mut self) {
        self.audio.clear();
    }

    /// Restarts the chosen sound. Ignored while idle, when nothing may play.
    pub fn preview_sound(&mut self) {
        if self.engine.state() == TimerState::Idle {
            debug!("preview ignored while idle");
            return;
        }
        self.audio.preview();
    }

    // ------------------------------------------------------------------------
    // Keyboard / notices / history
    // ------------------------------------------------------------------------

    /// Runs the shortcut bound to `event`, if any.
    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyDispatch {
        let dispatch = self.keyboard.handle(event, self.engine.state());
        if let Some(action) = dispatch.action {
            let result = match action {
                KeyAction::Start => self.start().map(|_| ()),
                KeyAction::Pause => self.pause(),
                KeyAction::Resume => self.resume(),
                KeyAction::Cancel => self.cancel(),
            };
            if let Err(e) = result {
                debug!(%action, error = %e, "shortcut did not apply");
            }
        }
        dispatch
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Requests a fresh history page.
    pub fn refresh_history(&mut self) {
        self.recorder.refresh_history();
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn timer_snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot()
    }

    pub fn sound_snapshot(&self) -> SoundSnapshot {
        self.audio.snapshot()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn history(&self) -> &[PomodoroRecord] {
        &self.history
    }

    pub fn summary(&self) -> HistorySummary {
        self.summary
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn audio(&self) -> &AudioController<F, O> {
        &self.audio
    }

    pub fn in_flight(&self) -> usize {
        self.recorder.in_flight()
    }

    /// Returns true while the one-second ticker is armed.
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
