//! User configuration and preferences

use crate::domain::{DEFAULT_PREFETCH_PERCENT, DEFAULT_SWIPE_THRESHOLD};
use crate::error::{Result, TriageError};
use crate::feedback::FeedbackDurations;
use crate::source::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Items requested per page
    pub page_size: usize,
    /// Share of the loaded queue, in percent, after which the next page is requested
    pub prefetch_percent: u8,
    /// Horizontal drag, in terminal columns, that commits a swipe
    pub swipe_threshold: f32,
    /// Ask before sending the deletion batch to the trash
    pub confirm_finish: bool,
    pub feedback_ms: u64,
    pub finish_feedback_ms: u64,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            prefetch_percent: DEFAULT_PREFETCH_PERCENT,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            confirm_finish: true,
            feedback_ms: 1000,
            finish_feedback_ms: 2000,
        }
    }
}

impl UserConfig {
    /// Get the config file path (~/.config/mswp/config.json)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mswp").join("config.json"))
    }

    /// Load config from the default location, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok_or_else(|| {
            TriageError::ConfigError("Could not determine config directory".to_string())
        })?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            TriageError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            TriageError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or_else(|| {
            TriageError::ConfigError("Could not determine config directory".to_string())
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                TriageError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            TriageError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, contents).map_err(|e| {
            TriageError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(TriageError::ConfigError(
                "page_size must be at least 1".to_string(),
            ));
        }
        if self.prefetch_percent > 100 {
            return Err(TriageError::ConfigError(format!(
                "prefetch_percent must be between 0 and 100, got {}",
                self.prefetch_percent
            )));
        }
        if !(self.swipe_threshold.is_finite() && self.swipe_threshold > 0.0) {
            return Err(TriageError::ConfigError(format!(
                "swipe_threshold must be a positive number, got {}",
                self.swipe_threshold
            )));
        }
        Ok(())
    }

    pub fn feedback_durations(&self) -> FeedbackDurations {
        FeedbackDurations {
            decision: Duration::from_millis(self.feedback_ms),
            finish: Duration::from_millis(self.finish_feedback_ms),
        }
    }
}
