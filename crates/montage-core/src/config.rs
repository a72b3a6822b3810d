//! Editor configuration.
//!
//! Every section falls back to its defaults when omitted, so a config file
//! only needs to name the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{MontageError, Result};

/// Top-level editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas: CanvasConfig,
    pub snapping: SnapConfig,
    pub persistence: PersistenceConfig,
    pub audio: AudioConfig,
    pub media: MediaConfig,
    pub history: HistoryConfig,
}

impl EditorConfig {
    /// Parse a configuration from JSON bytes.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|e| MontageError::Config(format!("Invalid editor config: {}", e)))
    }

    /// Load a configuration file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }
}

/// Output canvas dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Snap-to behaviour for drag and resize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    pub enabled: bool,
    /// Capture radius in seconds. The timeline origin and the playhead use
    /// twice this radius.
    pub threshold: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.1,
        }
    }
}

/// Write-through timing towards the project store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub segment_debounce_ms: u64,
    pub filter_debounce_ms: u64,
    pub transition_debounce_ms: u64,
    pub snapshot_retry_attempts: u32,
    pub snapshot_retry_backoff_ms: u64,
}

impl PersistenceConfig {
    pub fn segment_debounce(&self) -> Duration {
        Duration::from_millis(self.segment_debounce_ms)
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }

    pub fn transition_debounce(&self) -> Duration {
        Duration::from_millis(self.transition_debounce_ms)
    }

    pub fn snapshot_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.snapshot_retry_backoff_ms)
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            segment_debounce_ms: 800,
            filter_debounce_ms: 500,
            transition_debounce_ms: 1000,
            snapshot_retry_attempts: 3,
            snapshot_retry_backoff_ms: 150,
        }
    }
}

/// Audio transport settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Seconds of drift tolerated before the transport is force-seeked.
    pub drift_tolerance: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            drift_tolerance: 0.5,
        }
    }
}

/// Where media assets are served from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub base_url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cdn.montage.local/media".to_string(),
        }
    }
}

/// Undo history limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}
