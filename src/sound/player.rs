//! Looping playback using rodio.
//!
//! This module provides the `AudioOutput` seam used by the ambient
//! controller, the rodio v0.20 implementation, and a mock for tests.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::error::SoundError;

// ============================================================================
// Traits
// ============================================================================

/// A track that is currently playing.
pub trait AmbientTrack {
    /// Changes the gain (0.0 - 1.0).
    fn set_volume(&self, volume: f32);

    /// Stops playback; the track cannot be restarted.
    fn stop(&self);
}

/// Something that can play a track on a loop.
pub trait AudioOutput {
    type Track: AmbientTrack;

    /// Decodes `data` and starts playing it on a loop at `volume`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be decoded or no output is open.
    fn play_looped(&self, data: Vec<u8>, volume: f32) -> Result<Self::Track, SoundError>;
}

// ============================================================================
// RodioOutput
// ============================================================================

/// Output on the default audio device.
///
/// Creating one without a device succeeds; every later play then fails
/// with `DeviceNotAvailable`, which surfaces as a playback advisory.
pub struct RodioOutput {
    /// The audio output stream (must be kept alive for playback).
    stream: Option<(OutputStream, OutputStreamHandle)>,
}

impl RodioOutput {
    /// Opens the default output device.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new() -> Result<Self, SoundError> {
        let stream = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;
        debug!("audio output stream initialized");
        Ok(Self {
            stream: Some(stream),
        })
    }

    /// Opens the default device, or an output that always fails.
    #[must_use]
    pub fn open_or_unavailable() -> Self {
        match Self::new() {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "audio not available, ambient sound disabled");
                Self::unavailable()
            }
        }
    }

    /// Creates an output with no device behind it.
    #[must_use]
    pub fn unavailable() -> Self {
        Self { stream: None }
    }

    /// Returns true if a device is open.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.stream.is_some()
    }
}

impl std::fmt::Debug for RodioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioOutput")
            .field("available", &self.is_available())
            .finish_non_exhaustive()
    }
}

impl AudioOutput for RodioOutput {
    type Track = RodioTrack;

    fn play_looped(&self, data: Vec<u8>, volume: f32) -> Result<RodioTrack, SoundError> {
        let (_, handle) = self.stream.as_ref().ok_or_else(|| {
            SoundError::DeviceNotAvailable("no audio output device".to_string())
        })?;

        let source =
            Decoder::new_looped(Cursor::new(data)).map_err(|e| SoundError::DecodeError(e.to_string()))?;
        let sink = Sink::try_new(handle).map_err(|e| SoundError::StreamError(e.to_string()))?;
        sink.set_volume(volume);
        sink.append(source);

        debug!(volume, "looped playback started");
        Ok(RodioTrack { sink })
    }
}

/// A looping rodio sink. Dropping it stops playback.
pub struct RodioTrack {
    sink: Sink,
}

impl AmbientTrack for RodioTrack {
    fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn stop(&self) {
        self.sink.stop();
    }
}

// ============================================================================
// Mock
// ============================================================================

#[derive(Debug, Default)]
struct MockTrackState {
    volume: Mutex<f32>,
    stopped: AtomicBool,
}

/// Mock output for testing.
#[derive(Debug, Default)]
pub struct MockAudioOutput {
    tracks: Mutex<Vec<Arc<MockTrackState>>>,
    should_fail: AtomicBool,
}

impl MockAudioOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Returns how many tracks were started.
    pub fn play_count(&self) -> usize {
        self.tracks.lock().unwrap().len()
    }

    /// Returns how many started tracks are still playing.
    pub fn playing_count(&self) -> usize {
        self.tracks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| !t.stopped.load(Ordering::SeqCst))
            .count()
    }

    /// Returns the gain of the most recently started track.
    pub fn last_volume(&self) -> Option<f32> {
        self.tracks
            .lock()
            .unwrap()
            .last()
            .map(|t| *t.volume.lock().unwrap())
    }
}

impl AudioOutput for MockAudioOutput {
    type Track = MockTrack;

    fn play_looped(&self, _data: Vec<u8>, volume: f32) -> Result<MockTrack, SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::StreamError("mock playback failure".to_string()));
        }
        let state = Arc::new(MockTrackState {
            volume: Mutex::new(volume),
            stopped: AtomicBool::new(false),
        });
        self.tracks.lock().unwrap().push(Arc::clone(&state));
        Ok(MockTrack { state })
    }
}

/// Track handed out by [`MockAudioOutput`].
#[derive(Debug)]
pub struct MockTrack {
    state: Arc<MockTrackState>,
}

impl AmbientTrack for MockTrack {
    fn set_volume(&self, volume: f32) {
        *self.state.volume.lock().unwrap() = volume;
    }

    fn stop(&self) {
        self.state.stopped.store(true, Ordering::SeqCst);
    }
}

impl Drop for MockTrack {
    fn drop(&mut self) {
        self.stop();
    }
}
