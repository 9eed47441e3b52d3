//! Ambient sound catalog.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::SoundError;
use super::source::SoundSource;

/// Catalog entry identifier. `None` is the "no sound" sentinel.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SoundId {
    #[default]
    None,
    Rain,
    Forest,
    Ocean,
    Fire,
    Wind,
    Stream,
    Thunder,
}

impl SoundId {
    /// Every id in picker order.
    pub const ALL: [SoundId; 8] = [
        SoundId::None,
        SoundId::Rain,
        SoundId::Forest,
        SoundId::Ocean,
        SoundId::Fire,
        SoundId::Wind,
        SoundId::Stream,
        SoundId::Thunder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundId::None => "none",
            SoundId::Rain => "rain",
            SoundId::Forest => "forest",
            SoundId::Ocean => "ocean",
            SoundId::Fire => "fire",
            SoundId::Wind => "wind",
            SoundId::Stream => "stream",
            SoundId::Thunder => "thunder",
        }
    }

    /// Returns the label shown in the picker.
    pub fn label(&self) -> &'static str {
        match self {
            SoundId::None => "Off",
            SoundId::Rain => "Rain",
            SoundId::Forest => "Forest",
            SoundId::Ocean => "Ocean waves",
            SoundId::Fire => "Campfire",
            SoundId::Wind => "Breeze",
            SoundId::Stream => "Stream",
            SoundId::Thunder => "Thunderstorm",
        }
    }

    /// Returns the id bound to a picker digit (`0`-`7`).
    pub fn from_digit(digit: char) -> Option<Self> {
        let index = digit.to_digit(10)? as usize;
        Self::ALL.get(index).copied()
    }

    pub fn is_none(&self) -> bool {
        *self == SoundId::None
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundId {
    type Err = SoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SoundError::UnknownSound(s.to_string()))
    }
}

/// Built-in remote tracks.
const BUILTIN_TRACKS: &[(SoundId, &str)] = &[
    (
        SoundId::Rain,
        "https://soundbible.com/mp3/Rain-SoundBible.com-2065240612.mp3",
    ),
    (
        SoundId::Forest,
        "https://soundbible.com/mp3/meadowlark_daniel-simion.mp3",
    ),
    (
        SoundId::Ocean,
        "https://soundbible.com/mp3/Ocean_Waves-Mike_Koenig-980635527.mp3",
    ),
    (
        SoundId::Fire,
        "https://soundbible.com/mp3/Campfire-SoundBible.com-1933587658.mp3",
    ),
    (
        SoundId::Wind,
        "https://soundbible.com/mp3/Wind-Mark_DiAngelo-1940285615.mp3",
    ),
    (
        SoundId::Stream,
        "https://soundbible.com/mp3/Small_Waterfall-Stephan_Schutze-1811758364.mp3",
    ),
    (
        SoundId::Thunder,
        "https://soundbible.com/mp3/Thunder_Crack-Stickinthemud-1910420960.mp3",
    ),
];

/// Maps sound ids to playable sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundCatalog {
    sources: HashMap<SoundId, SoundSource>,
}

impl SoundCatalog {
    /// Returns the catalog of built-in tracks.
    pub fn builtin() -> Self {
        let sources = BUILTIN_TRACKS
            .iter()
            .map(|(id, url)| (*id, SoundSource::url(*url)))
            .collect();
        Self { sources }
    }

    /// Replaces built-in locations with configured ones.
    ///
    /// # Errors
    ///
    /// Returns an error if a location cannot be used as a track, or if an
    /// override targets the `none` sentinel.
    pub fn with_overrides(mut self, overrides: &HashMap<SoundId, String>) -> Result<Self, SoundError> {
        for (id, location) in overrides {
            if id.is_none() {
                return Err(SoundError::Unsupported(
                    "'none' cannot have a track".to_string(),
                ));
            }
            self.sources.insert(*id, SoundSource::parse(location)?);
        }
        Ok(self)
    }

    /// Returns the source for an id; `None` for the sentinel.
    pub fn source(&self, id: SoundId) -> Option<&SoundSource> {
        self.sources.get(&id)
    }

    /// Iterates entries in picker order, sentinel included.
    pub fn entries(&self) -> impl Iterator<Item = (SoundId, Option<&SoundSource>)> + '_ {
        SoundId::ALL.into_iter().map(|id| (id, self.source(id)))
    }
}

impl Default for SoundCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod sound_id_tests {
        use super::*;

        #[test]
        fn test_default_is_none() {
            assert_eq!(SoundId::default(), SoundId::None);
            assert!(SoundId::None.is_none());
            assert!(!SoundId::Rain.is_none());
        }

        #[test]
        fn test_from_str() {
            assert_eq!("rain".parse::<SoundId>().unwrap(), SoundId::Rain);
            assert_eq!("Thunder".parse::<SoundId>().unwrap(), SoundId::Thunder);
            assert!(matches!(
                "jazz".parse::<SoundId>(),
                Err(SoundError::UnknownSound(_))
            ));
        }

        #[test]
        fn test_from_digit() {
            assert_eq!(SoundId::from_digit('0'), Some(SoundId::None));
            assert_eq!(SoundId::from_digit('1'), Some(SoundId::Rain));
            assert_eq!(SoundId::from_digit('7'), Some(SoundId::Thunder));
            assert_eq!(SoundId::from_digit('8'), None);
            assert_eq!(SoundId::from_digit('x'), None);
        }

        #[test]
        fn test_serde_lowercase() {
            let json = serde_json::to_string(&SoundId::Ocean).unwrap();
            assert_eq!(json, "\"ocean\"");
            let id: SoundId = serde_json::from_str("\"fire\"").unwrap();
            assert_eq!(id, SoundId::Fire);
        }
    }

    mod catalog_tests {
        use super::*;

        #[test]
        fn test_builtin_covers_every_track() {
            let catalog = SoundCatalog::builtin();
            assert!(catalog.source(SoundId::None).is_none());
            for id in SoundId::ALL.iter().skip(1) {
                let source = catalog.source(*id).unwrap();
                assert!(source.is_remote(), "{id} should be remote");
            }
        }

        #[test]
        fn test_overrides_replace_location() {
            let overrides = HashMap::from([(SoundId::Rain, "/srv/rain.ogg".to_string())]);
            let catalog = SoundCatalog::builtin().with_overrides(&overrides).unwrap();

            assert_eq!(
                catalog.source(SoundId::Rain),
                Some(&SoundSource::file("/srv/rain.ogg"))
            );
            assert!(catalog.source(SoundId::Forest).unwrap().is_remote());
        }

        #[test]
        fn test_overrides_reject_bad_entries() {
            let overrides = HashMap::from([(SoundId::Rain, "/srv/rain.txt".to_string())]);
            assert!(SoundCatalog::builtin().with_overrides(&overrides).is_err());

            let overrides = HashMap::from([(SoundId::None, "/srv/x.mp3".to_string())]);
            assert!(SoundCatalog::builtin().with_overrides(&overrides).is_err());
        }

        #[test]
        fn test_entries_in_picker_order() {
            let catalog = SoundCatalog::builtin();
            let ids: Vec<SoundId> = catalog.entries().map(|(id, _)| id).collect();
            assert_eq!(ids, SoundId::ALL.to_vec());
        }
    }
}
