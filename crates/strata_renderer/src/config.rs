//! Render configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RenderOrder;

/// Errors from loading or validating a [`RenderConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse render settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Render configuration.
///
/// Deserializes from the `camelCase` keys used in scene files; missing keys
/// take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Samples per pixel
    pub sample_count: u32,
    /// Number of worker threads
    pub thread_count: usize,
    /// Tile width in pixels, clamped to the image
    pub tile_width: u32,
    /// Tile height in pixels, clamped to the image
    pub tile_height: u32,
    /// Order tiles are handed out in
    pub tile_order: RenderOrder,
    /// Base seed for the per-thread random streams and the random tile order
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_count: 25,
            thread_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            tile_width: 32,
            tile_height: 32,
            tile_order: RenderOrder::default(),
            seed: 0,
        }
    }
}

impl RenderConfig {
    /// Parse and validate settings from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce an image.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_count == 0 {
            return Err(ConfigError::Invalid("sampleCount must be at least 1".into()));
        }
        if self.thread_count == 0 {
            return Err(ConfigError::Invalid("threadCount must be at least 1".into()));
        }
        Ok(())
    }
}
