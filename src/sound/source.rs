//! Sound source management.
//!
//! An ambient track is either a remote URL or a local file. Local files
//! are checked for a playable extension up front; remote URLs are checked
//! when fetched.

use std::fmt;
use std::path::{Path, PathBuf};

use super::error::SoundError;

/// Supported audio file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a"];

/// Where an ambient track is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// Streamed over HTTP(S)
    Url(String),
    /// Read from disk
    File(PathBuf),
}

impl SoundSource {
    /// Creates a remote source.
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Creates a local file source.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Parses a configured location.
    ///
    /// Anything starting with `http://` or `https://` is a URL; everything
    /// else is a path, with `~/` expanded to the home directory.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::Unsupported` for an empty value or a file
    /// without a playable extension.
    pub fn parse(location: &str) -> Result<Self, SoundError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(SoundError::Unsupported("empty location".to_string()));
        }

        if location.starts_with("http://") || location.starts_with("https://") {
            return Ok(Self::Url(location.to_string()));
        }

        let path = match location.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(location)),
            None => PathBuf::from(location),
        };
        validate_extension(&path)?;
        Ok(Self::File(path))
    }

    /// Returns true if this is a remote track.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }

    /// Returns the file path if this is a local track.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Url(_) => None,
        }
    }
}

impl fmt::Display for SoundSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn validate_extension(path: &Path) -> Result<(), SoundError> {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(SoundError::Unsupported(format!(
            "'{}' is not one of: {}",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        )))
    }
}
