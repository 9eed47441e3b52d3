//! Ambient sound controller.
//!
//! Owns the single active track. Loads run on spawned tasks and report
//! back through [`AudioEvent`]; every new selection or stop bumps a
//! generation counter so a late load for an older selection is dropped
//! instead of starting a second track.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::catalog::{SoundCatalog, SoundId};
use super::error::SoundError;
use super::fetch::SoundFetcher;
use super::player::{AmbientTrack, AudioOutput};

/// Highest accepted volume.
pub const MAX_VOLUME: u8 = 100;

/// Playback state of the ambient track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Loading,
    Playing,
    Error,
}

impl PlaybackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackStatus::Stopped => "stopped",
            PlaybackStatus::Loading => "loading",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Error => "error",
        }
    }
}

/// Render-facing view of the sound session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundSnapshot {
    pub sound_id: SoundId,
    pub volume: u8,
    pub status: PlaybackStatus,
    /// Advisory shown while `status` is `Error`
    pub error: Option<String>,
}

/// A finished track load.
#[derive(Debug)]
pub struct AudioEvent {
    generation: u64,
    sound_id: SoundId,
    result: Result<Vec<u8>, SoundError>,
}

impl AudioEvent {
    pub fn sound_id(&self) -> SoundId {
        self.sound_id
    }
}

/// Drives the one ambient track.
pub struct AudioController<F, O: AudioOutput> {
    catalog: SoundCatalog,
    fetcher: Arc<F>,
    output: O,
    sound_id: SoundId,
    volume: u8,
    status: PlaybackStatus,
    error: Option<String>,
    track: Option<O::Track>,
    generation: u64,
    event_tx: mpsc::UnboundedSender<AudioEvent>,
}

impl<F: SoundFetcher, O: AudioOutput> AudioController<F, O> {
    pub fn new(
        catalog: SoundCatalog,
        fetcher: Arc<F>,
        output: O,
        volume: u8,
        event_tx: mpsc::UnboundedSender<AudioEvent>,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            output,
            sound_id: SoundId::None,
            volume: volume.min(MAX_VOLUME),
            status: PlaybackStatus::Stopped,
            error: None,
            track: None,
            generation: 0,
            event_tx,
        }
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    /// Records a choice without playing it.
    ///
    /// Choosing `none` stops playback.
    pub fn choose(&mut self, sound_id: SoundId) {
        if self.sound_id != sound_id {
            self.halt();
        }
        self.sound_id = sound_id;
        self.error = None;
        debug!(sound = sound_id.as_str(), "ambient sound chosen");
    }

    /// Selects a sound and starts playing it.
    ///
    /// Selecting `none` stops playback and clears the choice.
    pub fn select(&mut self, sound_id: SoundId) {
        if sound_id.is_none() {
            self.clear();
            return;
        }

        self.release();
        self.generation += 1;
        self.sound_id = sound_id;
        self.error = None;

        let Some(source) = self.catalog.source(sound_id).cloned() else {
            let err = SoundError::UnknownSound(sound_id.to_string());
            self.fail(&err);
            return;
        };

        info!(sound = sound_id.as_str(), %source, "loading ambient sound");
        self.status = PlaybackStatus::Loading;

        let generation = self.generation;
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch(&source).await;
            let _ = tx.send(AudioEvent {
                generation,
                sound_id,
                result,
            });
        });
    }

    /// Plays the current choice unless it is already loading or playing.
    pub fn play_selected(&mut self) {
        if self.sound_id.is_none() {
            return;
        }
        if matches!(self.status, PlaybackStatus::Loading | PlaybackStatus::Playing) {
            return;
        }
        self.select(self.sound_id);
    }

    /// Restarts the current choice from the beginning.
    pub fn preview(&mut self) {
        if !self.sound_id.is_none() {
            self.select(self.sound_id);
        }
    }

    /// Applies a finished load.
    pub fn on_loaded(&mut self, event: AudioEvent) {
        if event.generation != self.generation || self.status != PlaybackStatus::Loading {
            debug!(
                sound = event.sound_id.as_str(),
                "dropping superseded track load"
            );
            return;
        }

        let played = event
            .result
            .and_then(|data| self.output.play_looped(data, self.gain()));

        match played {
            Ok(track) => {
                self.track = Some(track);
                self.status = PlaybackStatus::Playing;
                info!(sound = event.sound_id.as_str(), "ambient sound playing");
            }
            Err(e) => self.fail(&e),
        }
    }

    // ------------------------------------------------------------------------
    // Volume / stop
    // ------------------------------------------------------------------------

    /// Sets the volume, clamped to 0-100.
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(MAX_VOLUME);
        if let Some(track) = &self.track {
            track.set_volume(self.gain());
        }
    }

    /// Stops playback and keeps the choice.
    pub fn halt(&mut self) {
        self.release();
        self.generation += 1;
        self.status = PlaybackStatus::Stopped;
        self.error = None;
    }

    /// Stops playback and clears the choice.
    pub fn clear(&mut self) {
        self.halt();
        self.sound_id = SoundId::None;
    }

    fn release(&mut self) {
        if let Some(track) = self.track.take() {
            track.stop();
            debug!(sound = self.sound_id.as_str(), "ambient track released");
        }
    }

    fn fail(&mut self, err: &SoundError) {
        warn!(sound = self.sound_id.as_str(), error = %err, "ambient sound failed");
        self.status = PlaybackStatus::Error;
        self.error = Some(err.advisory().to_string());
    }

    fn gain(&self) -> f32 {
        f32::from(self.volume) / f32::from(MAX_VOLUME)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> SoundSnapshot {
        SoundSnapshot {
            sound_id: self.sound_id,
            volume: self.volume,
            status: self.status,
            error: self.error.clone(),
        }
    }

    pub fn sound_id(&self) -> SoundId {
        self.sound_id
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn catalog(&self) -> &SoundCatalog {
        &self.catalog
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}

// ============================================================================
// Tests
// ============================================================================
