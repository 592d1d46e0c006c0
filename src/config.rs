use std::{
    io,
    ops::Not,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use eframe::egui;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{scale, selection::AssetSelection, sources::COMPONENT};

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Not for Theme {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl From<Theme> for egui::Visuals {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("couldn't parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Startup settings. The clock only ever reads this file, changes made while
/// it runs are not saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scale: f32,
    pub topmost: bool,
    pub theme: Theme,
    pub show_alarm_panel: bool,
    /// prefills the alarm time field
    pub alarm: Option<String>,
    /// where the site of origin assets live, defaults to the data dir
    pub origin: Option<PathBuf>,
    #[serde(flatten)]
    pub selection: AssetSelection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scale: 1.0,
            topmost: false,
            theme: Theme::Dark,
            show_alarm_panel: false,
            alarm: None,
            origin: None,
            selection: AssetSelection::default(),
        }
    }
}

impl Config {
    /// Reads the config at `path`, a missing file gives the defaults.
    ///
    /// # Errors
    /// if the file exists but can't be read or isn't valid toml
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// # Errors
    /// if `text` isn't a valid config
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Self>(text).map(Self::normalized)
    }

    /// Snaps the scale to a preset and clamps the asset indices.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            scale: scale::nearest_preset(self.scale),
            selection: self.selection.sanitized(),
            ..self
        }
    }

    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", COMPONENT).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// the default site of origin: the per user data dir
    #[must_use]
    pub fn default_origin() -> Option<PathBuf> {
        ProjectDirs::from("", "", COMPONENT).map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// the site of origin to use, the configured one wins
    #[must_use]
    pub fn origin(&self) -> Option<PathBuf> {
        self.origin.clone().or_else(Self::default_origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn parses_every_key() {
        let config = Config::from_toml(
            r#"
            scale = 1.25
            topmost = true
            theme = "light"
            show_alarm_panel = true
            alarm = "06:45"
            origin = "/srv/clock"
            face = 2
            hour_hand = 1
            minute_hand = 0
            alarm_sound = 2
            "#,
        )
        .unwrap();
        assert!((config.scale - 1.25).abs() < f32::EPSILON);
        assert!(config.topmost);
        assert_eq!(config.theme, Theme::Light);
        assert!(config.show_alarm_panel);
        assert_eq!(config.alarm.as_deref(), Some("06:45"));
        assert_eq!(config.origin, Some(PathBuf::from("/srv/clock")));
        assert_eq!(
            config.selection,
            AssetSelection {
                face: 2,
                hour_hand: 1,
                minute_hand: 0,
                alarm_sound: 2,
            }
        );
    }

    #[test]
    fn out_of_range_values_are_normalized() {
        let config = Config::from_toml("scale = 0.8\nface = 9").unwrap();
        assert!((config.scale - 0.75).abs() < f32::EPSILON);
        assert_eq!(config.selection.face, 0);
    }

    #[test]
    fn bad_theme_is_an_error() {
        assert!(Config::from_toml("theme = \"sepia\"").is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn invalid_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scale = \"big\"").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn theme_toggles() {
        assert_eq!(!Theme::Dark, Theme::Light);
        assert_eq!(!!Theme::Dark, Theme::Dark);
    }
}
