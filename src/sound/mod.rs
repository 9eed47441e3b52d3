//! Ambient sound for focus sessions.
//!
//! This module provides:
//!
//! - A catalog of looping ambient tracks with a "none" sentinel
//! - Async track loading from HTTP(S) or disk
//! - Looping playback with live volume control
//! - A controller that keeps at most one track playing
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   select/halt   ┌──────────────────┐
//! │   PomodoroApp    │ ──────────────▶ │ AudioController  │
//! └──────────────────┘                 └───┬──────────┬───┘
//!          ▲                               │          │
//!          │ AudioEvent                    ▼          ▼
//!          │                     ┌──────────────┐ ┌──────────────┐
//!          └──────────────────── │ SoundFetcher │ │ AudioOutput  │
//!                                │ (reqwest/fs) │ │   (rodio)    │
//!                                └──────────────┘ └──────────────┘
//! ```

mod catalog;
mod controller;
mod error;
mod fetch;
mod player;
mod source;

pub use catalog::{SoundCatalog, SoundId};
pub use controller::{AudioController, AudioEvent, PlaybackStatus, SoundSnapshot, MAX_VOLUME};
pub use error::SoundError;
pub use fetch::{HttpSoundFetcher, MockSoundFetcher, SoundFetcher};
pub use player::{AmbientTrack, AudioOutput, MockAudioOutput, MockTrack, RodioOutput, RodioTrack};
pub use source::SoundSource;
