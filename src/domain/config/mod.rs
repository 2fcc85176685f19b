// Engine configuration - Values shared by the editor, CLI and adapters

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::model::{DEFAULT_EXTERNAL_MEDIA_DURATION, DEFAULT_NUDGE_STEP};
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::subtitles::SubtitleRenderProfile;

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(DomainError::BadArgs(format!(
                "Invalid log level: {}. Must be trace, debug, info, warn or error",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(DomainError::BadArgs(format!(
                "Invalid log format: {}. Must be pretty or json",
                other
            ))),
        }
    }
}

/// Engine configuration
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub log_level: LogLevel,
    pub log_format: LogFormat,
    /// Maximum undo depth; 0 keeps every step
    pub history_limit: usize,
    pub zoom_commit_debounce_ms: u64,
    /// Seconds moved per nudge
    pub nudge_step: f64,
    /// Length given to external media that arrives without one
    pub default_external_duration: f64,
    pub subtitles: SubtitleRenderProfile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Pretty,
            history_limit: DEFAULT_HISTORY_LIMIT,
            zoom_commit_debounce_ms: 250,
            nudge_step: DEFAULT_NUDGE_STEP,
            default_external_duration: DEFAULT_EXTERNAL_MEDIA_DURATION,
            subtitles: SubtitleRenderProfile::default(),
        }
    }
}

impl EngineConfig {
    pub fn zoom_debounce(&self) -> Duration {
        Duration::from_millis(self.zoom_commit_debounce_ms)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.nudge_step.is_finite() || self.nudge_step <= 0.0 {
            return Err(DomainError::BadArgs(format!(
                "nudge_step must be a positive number of seconds, got {}",
                self.nudge_step
            )));
        }
        if !self.default_external_duration.is_finite() || self.default_external_duration <= 0.0 {
            return Err(DomainError::BadArgs(format!(
                "default_external_duration must be positive, got {}",
                self.default_external_duration
            )));
        }
        if self.zoom_commit_debounce_ms > 10_000 {
            return Err(DomainError::BadArgs(
                "zoom_commit_debounce_ms cannot exceed 10000".to_string(),
            ));
        }

        let profile = &self.subtitles;
        if profile.max_words_per_line == 0 || profile.max_chars_per_line == 0 || profile.max_lines == 0 {
            return Err(DomainError::BadArgs(
                "subtitle line limits must be at least 1".to_string(),
            ));
        }
        if !profile.font_size.is_finite() || profile.font_size <= 0.0 {
            return Err(DomainError::BadArgs(format!(
                "subtitle font size must be positive, got {}",
                profile.font_size
            )));
        }
        Ok(())
    }
}
