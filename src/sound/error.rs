//! Sound system error types.
//!
//! Errors split into two families: the track could not be obtained
//! (fetch, missing file, unsupported or undecodable data) or it could not
//! be played (device, stream). Each family maps to one advisory shown to
//! the user.

use thiserror::Error;

/// Errors that can occur while loading or playing an ambient track.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SoundError {
    /// Audio device is not available (e.g., no speakers connected).
    #[error("audio device not available: {0}")]
    DeviceNotAvailable(String),

    /// Sound file was not found at the specified path.
    #[error("sound file not found: {0}")]
    FileNotFound(String),

    /// Remote track could not be downloaded.
    #[error("failed to fetch sound: {0}")]
    FetchError(String),

    /// The source does not look like a playable track.
    #[error("unsupported sound source: {0}")]
    Unsupported(String),

    /// Failed to decode the audio data.
    #[error("failed to decode sound: {0}")]
    DecodeError(String),

    /// Failed to create the audio output stream.
    #[error("failed to open audio stream: {0}")]
    StreamError(String),

    /// Unknown sound identifier.
    #[error("unknown sound '{0}'")]
    UnknownSound(String),
}

impl SoundError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }

    /// Returns true if the track itself could not be obtained.
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::FetchError(_) | Self::Unsupported(_) | Self::DecodeError(_)
        )
    }

    /// Returns the advisory shown next to the sound picker.
    #[must_use]
    pub fn advisory(&self) -> &'static str {
        if self.is_load_error() {
            "Could not load this sound, try another one"
        } else {
            "Playback failed, please try again"
        }
    }
}
