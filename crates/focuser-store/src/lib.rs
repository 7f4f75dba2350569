//! Persisted motor configuration.
//!
//! The controller keeps one small TOML record on disk: format version,
//! steps-per-revolution and microstep divisor. A missing record is created
//! with defaults on first load; a damaged one is reported as
//! [`ConfigError::Corrupt`] so the shell can decide to reset it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use focuser_proto::MicrostepDivisor;

/// Record layout version written into every file.
pub const FORMAT_VERSION: u32 = 1;

/// Full-step count of a common 1.8-degree motor.
pub const DEFAULT_STEPS_PER_REVOLUTION: u32 = 200;

/// Motor constants the operator can change from the shell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorConfig {
    pub version: u32,
    pub steps_per_revolution: u32,
    pub microstep_divisor: MicrostepDivisor,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            steps_per_revolution: DEFAULT_STEPS_PER_REVOLUTION,
            microstep_divisor: MicrostepDivisor::ThirtySecond,
        }
    }
}

impl MotorConfig {
    /// Microsteps in one full mechanical revolution.
    #[must_use]
    pub fn microsteps_per_revolution(&self) -> u32 {
        self.steps_per_revolution * u32::from(self.microstep_divisor.code())
    }

    /// Dial angle covered by a single microstep.
    #[must_use]
    pub fn degrees_per_microstep(&self) -> f64 {
        360.0 / f64::from(self.microsteps_per_revolution())
    }

    fn validate(&self) -> Result<(), String> {
        if self.version != FORMAT_VERSION {
            return Err(format!("unknown format version {}", self.version));
        }
        if self.steps_per_revolution == 0 {
            return Err("steps_per_revolution must be positive".to_owned());
        }
        Ok(())
    }
}

/// Errors from loading or persisting the record.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Persisted record is unreadable or violates the schema.
    #[error("corrupt motor config at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    /// The record could not be serialized.
    #[error("encode motor config")]
    Encode(#[from] toml::ser::Error),
    /// Filesystem failure; the in-memory config stays authoritative.
    #[error("motor config I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Load/save access to the record at a fixed path.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the record, creating it with defaults on first run.
    ///
    /// # Errors
    /// [`ConfigError::Corrupt`] when the file exists but cannot be parsed
    /// into a valid [`MotorConfig`]; [`ConfigError::Io`] on filesystem
    /// failure.
    pub fn load(&self) -> Result<MotorConfig, ConfigError> {
        if !self.path.exists() {
            let config = MotorConfig::default();
            self.save(&config)?;
            info!(path = %self.path.display(), "initialized motor config with defaults");
            return Ok(config);
        }

        let raw = fs::read_to_string(&self.path)?;
        let config: MotorConfig = toml::from_str(&raw).map_err(|e| self.corrupt(e.to_string()))?;
        config.validate().map_err(|reason| self.corrupt(reason))?;
        Ok(config)
    }

    /// Writes the record, fully replacing prior content.
    ///
    /// # Errors
    /// [`ConfigError::Corrupt`] when the config itself is invalid,
    /// [`ConfigError::Io`] on write failure.
    pub fn save(&self, config: &MotorConfig) -> Result<(), ConfigError> {
        config.validate().map_err(|reason| self.corrupt(reason))?;
        let body = toml::to_string_pretty(config)?;
        fs::write(&self.path, body)?;
        Ok(())
    }

    /// [`load`], but a corrupt record falls back to defaults and is
    /// rewritten so the shell keeps running.
    ///
    /// # Errors
    /// [`ConfigError::Io`] when reading or rewriting the file fails.
    ///
    /// [`load`]: ConfigStore::load
    pub fn load_or_reset(&self) -> Result<MotorConfig, ConfigError> {
        match self.load() {
            Err(ConfigError::Corrupt { path, reason }) => {
                warn!(path = %path.display(), %reason, "motor config corrupt, resetting to defaults");
                let config = MotorConfig::default();
                self.save(&config)?;
                Ok(config)
            }
            other => other,
        }
    }

    fn corrupt(&self, reason: String) -> ConfigError {
        ConfigError::Corrupt {
            path: self.path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("focuser.toml"))
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let config = store.load().unwrap();
        assert_eq!(config, MotorConfig::default());
        assert_eq!(config.steps_per_revolution, 200);
        assert_eq!(config.microstep_divisor, MicrostepDivisor::ThirtySecond);

        // The file left behind parses back to the same defaults.
        let reread = store.load().unwrap();
        assert_eq!(reread, config);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let config = MotorConfig {
            version: FORMAT_VERSION,
            steps_per_revolution: 400,
            microstep_divisor: MicrostepDivisor::Eighth,
        };
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_save_of_loaded_config_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.load().unwrap();
        let first = fs::read_to_string(store.path()).unwrap();

        let config = store.load().unwrap();
        store.save(&config).unwrap();
        let second = fs::read_to_string(store.path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_unsupported_divisor_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            "version = 1\nsteps_per_revolution = 200\nmicrostep_divisor = 7\n",
        )
        .unwrap();

        assert!(matches!(store.load(), Err(ConfigError::Corrupt { .. })));
    }

    #[test]
    fn test_missing_field_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "version = 1\nmicrostep_divisor = 32\n").unwrap();

        assert!(matches!(store.load(), Err(ConfigError::Corrupt { .. })));
    }

    #[test]
    fn test_unknown_version_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            "version = 9\nsteps_per_revolution = 200\nmicrostep_divisor = 32\n",
        )
        .unwrap();

        assert!(matches!(store.load(), Err(ConfigError::Corrupt { .. })));
    }

    #[test]
    fn test_load_or_reset_recovers_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "not toml at all").unwrap();

        let config = store.load_or_reset().unwrap();
        assert_eq!(config, MotorConfig::default());
        // Record was rewritten; a plain load now succeeds.
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_derived_values() {
        let config = MotorConfig::default();
        assert_eq!(config.microsteps_per_revolution(), 6400);
        assert!((config.degrees_per_microstep() - 0.05625).abs() < 1e-12);
    }
}
