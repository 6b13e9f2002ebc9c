use crate::{PlayerError, Result};
use log::debug;
use serde::Deserialize;
use std::path::Path;

/// Sleep between input polls while paused, in milliseconds
pub const DEFAULT_PAUSE_POLL_MS: u64 = 50;

/// Settings loaded from a JSON configuration file.
///
/// Every field is optional; command line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Render truecolor blocks instead of grayscale glyphs
    pub color: bool,
    /// Fixed delay between frames in whole seconds
    pub delay_secs: Option<u64>,
    /// Custom glyph ramp, least to most dense
    pub ramp: Option<String>,
    /// Sleep while paused; 0 re-polls immediately
    pub pause_poll_ms: u64,
    /// Clear the screen before each frame
    pub clear_screen: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            color: false,
            delay_secs: None,
            ramp: None,
            pause_poll_ms: DEFAULT_PAUSE_POLL_MS,
            clear_screen: true,
        }
    }
}

impl PlayerConfig {
    /// Read and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PlayerError::Config(format!("cannot read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_json(&contents)?;
        debug!("Loaded configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.delay_secs == Some(0) {
            return Err(PlayerError::Config(
                "delay_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(ref ramp) = self.ramp {
            if ramp.chars().count() < 2 {
                return Err(PlayerError::Config(
                    "ramp must contain at least 2 characters".to_string(),
                ));
            }
        }

        Ok(())
    }
}
