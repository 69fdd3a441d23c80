//! Engine settings.
//!
//! Settings are plain data: construct them directly, or deserialize them
//! from a TOML file with [`EngineSettings::from_file`]. All fields have
//! defaults so a minimal file only needs `root_dir`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default batch window for coalescing file-change events, in milliseconds.
pub const DEFAULT_BATCH_DELAY_MS: u64 = 500;

/// Default minimum spacing between consecutive reloads, in milliseconds.
pub const DEFAULT_COOLDOWN_MS: u64 = 300;

/// Settings for a [`ConfigEngine`](crate::ConfigEngine).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Root directory scanned for config source files.
    pub root_dir: PathBuf,

    /// Batch window: change events arriving within this many milliseconds
    /// of each other are coalesced into a single reload.
    pub batch_delay_ms: u64,

    /// Cooldown: a reload fires at most once per this many milliseconds;
    /// batches arriving sooner are delayed, never dropped.
    pub cooldown_ms: u64,

    /// Exact file names to skip while scanning (lock files, scratch data).
    pub exclude_files: Vec<String>,

    /// When set, every successful load writes the affected configs as
    /// pretty-printed JSON into this directory. Inspection only; no read
    /// path consults these files.
    pub export_dir: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::new(),
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            exclude_files: Vec::new(),
            export_dir: None,
        }
    }
}

impl EngineSettings {
    /// Settings with the given root directory and default timing.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    /// Loads settings from a TOML file and validates them.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = toml::from_str(&text).map_err(|err| SettingsError::Parse {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Semantic checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(SettingsError::Invalid("root_dir must not be empty".into()));
        }
        if self.batch_delay_ms == 0 {
            return Err(SettingsError::Invalid(
                "batch_delay_ms must be greater than zero".into(),
            ));
        }
        if self.cooldown_ms == 0 {
            return Err(SettingsError::Invalid(
                "cooldown_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// Errors from reading or validating engine settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let settings = EngineSettings::default();
        assert_eq!(settings.batch_delay_ms, DEFAULT_BATCH_DELAY_MS);
        assert_eq!(settings.cooldown_ms, DEFAULT_COOLDOWN_MS);
        assert!(settings.exclude_files.is_empty());
        assert!(settings.export_dir.is_none());
    }

    #[test]
    fn from_file_parses_minimal_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "root_dir = \"/data/configs\"").unwrap();
        writeln!(file, "batch_delay_ms = 200").unwrap();
        file.flush().unwrap();

        let settings = EngineSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.root_dir, PathBuf::from("/data/configs"));
        assert_eq!(settings.batch_delay_ms, 200);
        assert_eq!(settings.cooldown_ms, DEFAULT_COOLDOWN_MS);
    }

    #[test]
    fn from_file_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "root_dir = [not toml").unwrap();
        file.flush().unwrap();

        let err = EngineSettings::from_file(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn validate_rejects_empty_root_and_zero_delays() {
        let empty_root = EngineSettings::default();
        assert!(matches!(
            empty_root.validate(),
            Err(SettingsError::Invalid(_))
        ));

        let mut zero_delay = EngineSettings::new("/data/configs");
        zero_delay.batch_delay_ms = 0;
        assert!(matches!(
            zero_delay.validate(),
            Err(SettingsError::Invalid(_))
        ));

        let mut zero_cooldown = EngineSettings::new("/data/configs");
        zero_cooldown.cooldown_ms = 0;
        assert!(matches!(
            zero_cooldown.validate(),
            Err(SettingsError::Invalid(_))
        ));
    }
}
