//! Benchmark settings
//!
//! Loaded from a JSON file given on the command line, or from
//! `<config dir>/packed-transcode/bench.json` when present. Command line
//! flags override whatever the file says.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::telemetry::LogConfig;

/// Errors raised while loading or saving settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("settings parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("could not find config directory")]
    NoConfigDir,
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
}

/// Persistent benchmark driver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BenchSettings {
    /// Directory searched for `bench.<format>` input files
    pub input_dir: PathBuf,
    /// Directory receiving plane dumps and the statistics CSV
    pub output_dir: PathBuf,
    /// Stop after this many frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_frames: Option<u64>,
    /// Write the last converted frame's planes
    pub write_planes: bool,
    /// Default log filter when no environment override is set
    pub log_level: String,
    pub log_json: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for BenchSettings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            max_frames: None,
            write_planes: true,
            log_level: "info".to_string(),
            log_json: false,
            log_file: None,
        }
    }
}

impl BenchSettings {
    /// Load settings from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&contents)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Save settings to a JSON file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Default settings file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("packed-transcode");
            p.push("bench.json");
            p
        })
    }

    /// Loads `path` if given, otherwise the default file if it exists,
    /// otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Some(default) if default.exists() => Self::load_from_file(&default),
            _ => Ok(Self::default()),
        }
    }

    /// Save to a JSON file that must not exist yet.
    pub fn save_new_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(self)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => SettingsError::AlreadyExists(path.to_path_buf()),
                _ => SettingsError::Io(e),
            })?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    /// Create the settings file at the default location, returning its path.
    /// An existing file is left alone.
    pub fn save_new(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::default_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_new_to_file(&path)?;
        Ok(path)
    }

    /// Normalizes values a hand-edited file may get wrong.
    fn sanitize(&mut self) {
        if self.max_frames == Some(0) {
            self.max_frames = None;
        }
        if self.log_level.trim().is_empty() {
            self.log_level = "info".to_string();
        }
    }

    /// Logging configuration derived from these settings.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            file_enabled: self.log_file.is_some(),
            file_path: self.log_file.clone(),
            json_format: self.log_json,
            default_level: self.log_level.clone(),
            ..LogConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = BenchSettings::default();
        assert!(settings.write_planes);
        assert_eq!(settings.max_frames, None);
        assert_eq!(settings.log_config().default_level, "info");
    }

    #[test]
    fn test_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bench.json");
        let settings = BenchSettings {
            output_dir: PathBuf::from("/tmp/out"),
            max_frames: Some(30),
            log_json: true,
            ..BenchSettings::default()
        };
        settings.save_to_file(&path).unwrap();
        assert_eq!(BenchSettings::load_from_file(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");
        fs::write(&path, r#"{ "maxFrames": 0, "logLevel": " " }"#).unwrap();
        let settings = BenchSettings::load_from_file(&path).unwrap();
        assert_eq!(settings.max_frames, None);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.input_dir, PathBuf::from("."));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            BenchSettings::load_from_file(&path),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_save_new_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("bench.json");
        let first = BenchSettings {
            max_frames: Some(7),
            ..BenchSettings::default()
        };
        first.save_new_to_file(&path).unwrap();

        let err = BenchSettings::default().save_new_to_file(&path).unwrap_err();
        assert!(matches!(err, SettingsError::AlreadyExists(ref p) if *p == path));
        assert_eq!(BenchSettings::load_from_file(&path).unwrap(), first);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let missing = Path::new("/nonexistent/bench.json");
        assert!(matches!(
            BenchSettings::load(Some(missing)),
            Err(SettingsError::Io(_))
        ));
    }
}
