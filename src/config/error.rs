//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::sound::SoundError;
use crate::timer::TimerError;

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A duration is out of range.
    #[error("invalid [timer] setting: {0}")]
    Timer(#[from] TimerError),

    /// A sound setting is unusable.
    #[error("invalid [sound] setting: {0}")]
    Sound(#[from] SoundError),

    /// Any other out-of-range value.
    #[error("invalid setting: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns true if the file could not be parsed or read.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Parse { .. })
    }

    /// Returns a hint for fixing the error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Read { .. } => "check the --config path and its permissions",
            Self::Parse { .. } => "fix the TOML syntax or remove the file to use defaults",
            Self::Timer(_) => "work must be 1-120 minutes and break 1-60 minutes",
            Self::Sound(_) => "sound overrides must be http(s) URLs or audio file paths",
            Self::Invalid(_) => "remove the setting to use its default",
        }
    }
}
