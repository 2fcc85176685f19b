// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::domain::config::EngineConfig;
use crate::error::{ClipdeckError, ClipdeckResult};
use crate::ports::ConfigPort;

pub const DEFAULT_CONFIG_FILE: &str = "clipdeck.toml";

/// TOML configuration adapter
#[derive(Debug, Clone)]
pub struct TomlConfigAdapter {
    default_path: PathBuf,
}

impl Default for TomlConfigAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TomlConfigAdapter {
    /// Create new TOML config adapter reading `clipdeck.toml` by default
    pub fn new() -> Self {
        Self::with_default_path(DEFAULT_CONFIG_FILE)
    }

    pub fn with_default_path(path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: path.into(),
        }
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> ClipdeckResult<EngineConfig> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

#[async_trait]
impl ConfigPort for TomlConfigAdapter {
    async fn load_config(&self, path: Option<&Path>) -> ClipdeckResult<EngineConfig> {
        let explicit = path.is_some();
        let path = path.unwrap_or(&self.default_path);

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if explicit {
                    return Err(ClipdeckError::ConfigNotFound {
                        path: path.display().to_string(),
                    });
                }
                info!("No config file at {}, using defaults", path.display());
                return Ok(EngineConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config = Self::parse(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn default_config_path(&self) -> &Path {
        &self.default_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{LogFormat, LogLevel};
    use tempfile::tempdir;

    #[test]
    fn test_parse_partial_file() {
        let config = TomlConfigAdapter::parse(
            r#"
log_level = "debug"
history_limit = 50

[subtitles]
maxWordsPerLine = 3
uppercase = true
"#,
        )
        .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.subtitles.max_words_per_line, 3);
        assert_eq!(config.subtitles.max_chars_per_line, 28);
        assert!(config.subtitles.uppercase);
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        assert!(matches!(
            TomlConfigAdapter::parse("nudge_step = -1.0"),
            Err(ClipdeckError::Domain(_))
        ));
        assert!(matches!(
            TomlConfigAdapter::parse("log_level = 3"),
            Err(ClipdeckError::TomlError(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_default_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let adapter = TomlConfigAdapter::with_default_path(dir.path().join("clipdeck.toml"));
        assert_eq!(adapter.load_config(None).await.unwrap(), EngineConfig::default());

        let explicit = dir.path().join("other.toml");
        assert!(matches!(
            adapter.load_config(Some(&explicit)).await,
            Err(ClipdeckError::ConfigNotFound { .. })
        ));

        std::fs::write(&explicit, "nudge_step = 0.5\n").unwrap();
        assert_eq!(adapter.load_config(Some(&explicit)).await.unwrap().nudge_step, 0.5);
    }
}
