//! Session controller owning the current spectrum pair.
//!
//! The shell layers (CLI and GUI) hold a [`SpectrumSession`] and route
//! every operation through it: acquisition, smoothing, persistence, and
//! access for rendering. The (raw, smoothed) pair is explicit session
//! state passed by reference to collaborators, never process-global.

use std::path::{Path, PathBuf};

use log::info;

use crate::acquisition;
use crate::config::Settings;
use crate::error::{AppResult, McaError};
use crate::smoothing;
use crate::storage;

/// A raw spectrum and its smoothed counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrumPair {
    /// Raw channel counts as acquired.
    pub raw: Vec<u32>,
    /// Windowed moving average of `raw`.
    pub smoothed: Vec<u32>,
}

/// Controller for one user-facing spectrum workflow.
pub struct SpectrumSession {
    settings: Settings,
    current: Option<SpectrumPair>,
}

impl SpectrumSession {
    /// Create a session with the given settings and no spectrum loaded.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            current: None,
        }
    }

    /// The session's settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access for shell-layer overrides (validated setters live
    /// on [`Settings`]).
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// The current (raw, smoothed) pair, if any.
    pub fn current(&self) -> Option<&SpectrumPair> {
        self.current.as_ref()
    }

    /// Acquire a spectrum from the configured port, smooth it, blank the
    /// leading channels, and store the pair as the session's current data.
    pub fn acquire(&mut self) -> AppResult<&SpectrumPair> {
        let raw = acquisition::acquire_spectrum(&self.settings)?;
        let smoothed = smoothing::smooth(&raw, self.settings.window_size);
        let mut pair = SpectrumPair { raw, smoothed };
        blank_leading(&mut pair, self.settings.blank_leading);
        info!(
            "Acquired spectrum from '{}' ({} channels)",
            self.settings.port,
            pair.raw.len()
        );
        Ok(self.current.insert(pair))
    }

    /// Save the current pair to `path`.
    pub fn save_csv(&self, path: &Path) -> AppResult<()> {
        let pair = self.current.as_ref().ok_or(McaError::NoSpectrum)?;
        storage::save(&pair.raw, &pair.smoothed, path)
    }

    /// Save the current pair to a timestamped file in the configured
    /// storage directory, returning the path written.
    pub fn save_timestamped(&self) -> AppResult<PathBuf> {
        let path = storage::timestamped_path(&self.settings.storage_dir);
        self.save_csv(&path)?;
        Ok(path)
    }

    /// Load a previously saved pair from `path` as the session's current
    /// data.
    pub fn load_csv(&mut self, path: &Path) -> AppResult<&SpectrumPair> {
        let (raw, smoothed) = storage::load(path)?;
        Ok(self.current.insert(SpectrumPair { raw, smoothed }))
    }
}

/// Zero the first `count` channels of both series. The first few channels
/// of the analyzer carry switching noise, not signal.
fn blank_leading(pair: &mut SpectrumPair, count: usize) {
    for value in pair.raw.iter_mut().take(count) {
        *value = 0;
    }
    for value in pair.smoothed.iter_mut().take(count) {
        *value = 0;
    }
}
