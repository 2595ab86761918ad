//! Application configuration.
//!
//! [`Settings`] is loaded in layers with figment: struct defaults, then an
//! optional TOML file, then `MCA_`-prefixed environment variables. After
//! extraction the settings are validated semantically; values that parse
//! but are logically invalid (zero baud rate, negative timeout) are
//! rejected with [`McaError::Configuration`].
//!
//! ```toml
//! # mca_daq.toml
//! port = "/dev/ttyACM0"
//! baud_rate = 9600
//! timeout_secs = 5.0
//! window_size = 20
//! blank_leading = 10
//! storage_dir = "."
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{AppResult, McaError};

/// Environment variable prefix for configuration overrides
/// (e.g. `MCA_BAUD_RATE=115200`).
const ENV_PREFIX: &str = "MCA_";

/// Acquisition and persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Serial endpoint to acquire from.
    pub port: String,
    /// Baud rate for the serial link. Must be positive.
    pub baud_rate: u32,
    /// Per-read timeout in seconds. Must be non-negative and finite.
    pub timeout_secs: f64,
    /// Smoothing window width in channels. Clamped to a minimum of 1.
    pub window_size: usize,
    /// Number of leading channels zeroed after acquisition (hardware
    /// artifact suppression). 0 disables.
    pub blank_leading: usize,
    /// Directory for timestamped spectrum CSV files.
    pub storage_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: 9600,
            timeout_secs: 5.0,
            window_size: 20,
            blank_leading: 10,
            storage_dir: PathBuf::from("."),
        }
    }
}

/// Platform default endpoint: COM identifiers on Windows, a device file
/// everywhere else.
fn default_port() -> String {
    if cfg!(windows) {
        "COM3".to_string()
    } else {
        "/dev/ttyACM0".to_string()
    }
}

impl Settings {
    /// Load settings from defaults, an optional TOML file, and the
    /// environment, then validate.
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }
        let settings: Settings = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| McaError::Configuration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check semantic constraints on the current values.
    pub fn validate(&self) -> AppResult<()> {
        if self.baud_rate == 0 {
            return Err(McaError::Configuration(
                "Baud rate must be a positive integer".to_string(),
            ));
        }
        if !self.timeout_secs.is_finite() || self.timeout_secs < 0.0 {
            return Err(McaError::Configuration(
                "Timeout must be a non-negative number".to_string(),
            ));
        }
        if self.window_size == 0 {
            return Err(McaError::Configuration(
                "Smoothing window size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the baud rate, rejecting non-positive values.
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> AppResult<()> {
        if baud_rate == 0 {
            return Err(McaError::Configuration(
                "Baud rate must be a positive integer".to_string(),
            ));
        }
        self.baud_rate = baud_rate;
        Ok(())
    }

    /// Set the per-read timeout in seconds, rejecting negative or
    /// non-finite values.
    pub fn set_timeout(&mut self, timeout_secs: f64) -> AppResult<()> {
        if !timeout_secs.is_finite() || timeout_secs < 0.0 {
            return Err(McaError::Configuration(
                "Timeout must be a non-negative number".to_string(),
            ));
        }
        self.timeout_secs = timeout_secs;
        Ok(())
    }

    /// The per-read timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.window_size, 20);
    }

    #[test]
    fn test_default_port_per_platform() {
        let settings = Settings::default();
        if cfg!(windows) {
            assert_eq!(settings.port, "COM3");
        } else {
            assert_eq!(settings.port, "/dev/ttyACM0");
        }
    }

    #[test]
    fn test_zero_baud_rejected() {
        let mut settings = Settings::default();
        assert!(settings.set_baud_rate(0).is_err());
        assert!(settings.set_baud_rate(115200).is_ok());
        assert_eq!(settings.baud_rate, 115200);
    }

    #[test]
    fn test_negative_timeout_rejected() {
        let mut settings = Settings::default();
        assert!(settings.set_timeout(-1.0).is_err());
        assert!(settings.set_timeout(f64::NAN).is_err());
        assert!(settings.set_timeout(0.0).is_ok());
        assert!(settings.set_timeout(2.5).is_ok());
        assert_eq!(settings.timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let settings = Settings {
            window_size: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.baud_rate, 9600);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mca_daq.toml");
        std::fs::write(&path, "baud_rate = 115200\nwindow_size = 5\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.baud_rate, 115200);
        assert_eq!(settings.window_size, 5);
        // Unspecified keys keep their defaults.
        assert_eq!(settings.blank_leading, 10);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mca_daq.toml");
        std::fs::write(&path, "baud_rate = 0\n").unwrap();
        assert!(Settings::load(Some(&path)).is_err());
    }
}
