//! Application configuration.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::decode::LocationCodeDecoder;
use crate::domain::WingMembership;
use crate::tracker::DEFAULT_OFFLINE_THRESHOLD_MS;

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid JSON or holds invalid values
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Wings whose id is the leading digit pair of a location code.
    pub wings: WingMembership,

    /// Heartbeat age (milliseconds) after which a device counts as offline.
    pub offline_threshold_ms: u64,
}

impl AppConfig {
    /// Load configuration from a JSON file.
    ///
    /// Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Set the two-digit wing membership.
    pub fn with_wings(mut self, wings: WingMembership) -> Self {
        self.wings = wings;
        self
    }

    /// Set the offline threshold in milliseconds.
    pub fn with_offline_threshold_ms(mut self, ms: u64) -> Self {
        self.offline_threshold_ms = ms;
        self
    }

    /// Returns the offline threshold as a Duration.
    pub fn offline_threshold(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.offline_threshold_ms).unwrap_or(i64::MAX))
    }

    /// A decoder for the configured wings.
    pub fn decoder(&self) -> LocationCodeDecoder {
        LocationCodeDecoder::new(self.wings.clone())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            wings: WingMembership::default(),
            offline_threshold_ms: DEFAULT_OFFLINE_THRESHOLD_MS.unsigned_abs(),
        }
    }
}
