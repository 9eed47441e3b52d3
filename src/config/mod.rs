//! Application configuration.
//!
//! Loaded from `<config_dir>/study-pomodoro/config.toml`. Every field has
//! a default, so a missing file or a partial file is fine:
//!
//! ```toml
//! [timer]
//! work_minutes = 50
//! break_minutes = 10
//!
//! [backend]
//! socket_path = "/run/user/1000/study-planner.sock"
//! session_token = "…"
//! timeout_seconds = 5
//! history_limit = 20
//!
//! [sound]
//! default_sound = "rain"
//! volume = 40
//!
//! [sound.overrides]
//! rain = "~/sounds/rain.ogg"
//! ```

mod error;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sound::{SoundCatalog, SoundId, MAX_VOLUME};
use crate::types::PomodoroConfig;

pub use error::ConfigError;

const APP_DIR: &str = "study-pomodoro";
const CONFIG_FILE: &str = "config.toml";

// ============================================================================
// Sections
// ============================================================================

/// `[backend]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Socket of the session backend (defaults to `~/.study-pomodoro/backend.sock`)
    #[serde(default)]
    pub socket_path: Option<PathBuf>,
    /// Credential sent with every call
    #[serde(default)]
    pub session_token: Option<String>,
    /// Connect and I/O timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Records fetched per history refresh
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

fn default_timeout_seconds() -> u64 {
    5
}

fn default_history_limit() -> u32 {
    20
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            session_token: None,
            timeout_seconds: default_timeout_seconds(),
            history_limit: default_history_limit(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// `[sound]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundConfig {
    /// Sound chosen at startup
    #[serde(default)]
    pub default_sound: SoundId,
    /// Initial volume (0-100)
    #[serde(default = "default_volume")]
    pub volume: u8,
    /// Replacement locations for catalog entries
    #[serde(default)]
    pub overrides: HashMap<SoundId, String>,
}

fn default_volume() -> u8 {
    50
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            default_sound: SoundId::None,
            volume: default_volume(),
            overrides: HashMap::new(),
        }
    }
}

// ============================================================================
// AppConfig
// ============================================================================

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub timer: PomodoroConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub sound: SoundConfig,
}

impl AppConfig {
    /// Returns the default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if present and defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds
    /// out-of-range values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: Self = toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
        config.validate()?;

        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Checks every range-limited value.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timer.validate()?;
        if self.sound.volume > MAX_VOLUME {
            return Err(ConfigError::Invalid(format!(
                "volume must be 0-{MAX_VOLUME} (got {})",
                self.sound.volume
            )));
        }
        if self.backend.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "history_limit must be at least 1".to_string(),
            ));
        }
        if self.backend.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "timeout_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the sound catalog with configured overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if an override is not a usable location.
    pub fn catalog(&self) -> Result<SoundCatalog, ConfigError> {
        Ok(SoundCatalog::builtin().with_overrides(&self.sound.overrides)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::SoundSource;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.timer, PomodoroConfig::default());
        assert_eq!(config.backend.timeout_seconds, 5);
        assert_eq!(config.backend.history_limit, 20);
        assert_eq!(config.sound.default_sound, SoundId::None);
        assert_eq!(config.sound.volume, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config(
            r#"
            [timer]
            work_minutes = 50

            [sound]
            default_sound = "rain"

            [sound.overrides]
            forest = "/srv/forest.ogg"
            "#,
        );

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.timer.work_minutes, 50);
        assert_eq!(config.timer.break_minutes, 5);
        assert_eq!(config.sound.default_sound, SoundId::Rain);
        assert_eq!(config.sound.volume, 50);

        let catalog = config.catalog().unwrap();
        assert_eq!(
            catalog.source(SoundId::Forest),
            Some(&SoundSource::file("/srv/forest.ogg"))
        );
    }

    #[test]
    fn test_load_backend_section() {
        let file = write_config(
            r#"
            [backend]
            socket_path = "/tmp/planner.sock"
            session_token = "abc"
            timeout_seconds = 2
            "#,
        );

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(
            config.backend.socket_path,
            Some(PathBuf::from("/tmp/planner.sock"))
        );
        assert_eq!(config.backend.session_token.as_deref(), Some("abc"));
        assert_eq!(config.backend.timeout(), Duration::from_secs(2));
        assert_eq!(config.backend.history_limit, 20);
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let file = write_config("[timer]\nwork_minutes = 0\n");
        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Timer(_)));
    }

    #[test]
    fn test_invalid_volume_is_rejected() {
        let file = write_config("[sound]\nvolume = 140\n");
        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_sound_is_parse_error() {
        let file = write_config("[sound]\ndefault_sound = \"jazz\"\n");
        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_bad_override_fails_catalog() {
        let mut config = AppConfig::default();
        config
            .sound
            .overrides
            .insert(SoundId::Rain, "/srv/rain.txt".to_string());
        assert!(matches!(config.catalog(), Err(ConfigError::Sound(_))));
    }
}
