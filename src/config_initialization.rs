//! Configuration initialization and hierarchy management

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::domain::config::{EngineConfig, LogFormat, LogLevel};
use crate::domain::errors::DomainError;
use crate::ports::ConfigPort;

/// Environment variables consulted for overrides
pub const ENV_LOG_LEVEL: &str = "CLIPDECK_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "CLIPDECK_LOG_FORMAT";
pub const ENV_HISTORY_LIMIT: &str = "CLIPDECK_HISTORY_LIMIT";
pub const ENV_ZOOM_DEBOUNCE_MS: &str = "CLIPDECK_ZOOM_DEBOUNCE_MS";
pub const ENV_NUDGE_STEP: &str = "CLIPDECK_NUDGE_STEP";
pub const ENV_DEFAULT_EXTERNAL_DURATION: &str = "CLIPDECK_DEFAULT_EXTERNAL_DURATION";

/// Build the effective configuration following precedence: CLI > Env > File > Defaults
pub async fn initialize_configuration(config_port: &dyn ConfigPort, cli: &Cli) -> Result<EngineConfig> {
    let config = config_port
        .load_config(cli.config.as_deref())
        .await
        .context("Failed to load configuration file")?;

    let config = apply_env_overrides(config, |name| std::env::var(name).ok())?;
    let config = apply_cli_overrides(config, cli)?;
    config.validate()?;
    Ok(config)
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, DomainError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| DomainError::BadArgs(format!("Invalid value for {}: {}", name, value)))
}

/// Apply environment overrides read through `lookup`
pub fn apply_env_overrides<F>(mut config: EngineConfig, lookup: F) -> Result<EngineConfig, DomainError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_LOG_LEVEL) {
        config.log_level = LogLevel::parse(&value)?;
    }
    if let Some(value) = lookup(ENV_LOG_FORMAT) {
        config.log_format = LogFormat::parse(&value)?;
    }
    if let Some(value) = lookup(ENV_HISTORY_LIMIT) {
        config.history_limit = parse_env(ENV_HISTORY_LIMIT, &value)?;
    }
    if let Some(value) = lookup(ENV_ZOOM_DEBOUNCE_MS) {
        config.zoom_commit_debounce_ms = parse_env(ENV_ZOOM_DEBOUNCE_MS, &value)?;
    }
    if let Some(value) = lookup(ENV_NUDGE_STEP) {
        config.nudge_step = parse_env(ENV_NUDGE_STEP, &value)?;
    }
    if let Some(value) = lookup(ENV_DEFAULT_EXTERNAL_DURATION) {
        config.default_external_duration = parse_env(ENV_DEFAULT_EXTERNAL_DURATION, &value)?;
    }
    Ok(config)
}

/// Apply command-line overrides
pub fn apply_cli_overrides(mut config: EngineConfig, cli: &Cli) -> Result<EngineConfig, DomainError> {
    if let Some(level) = &cli.log_level {
        config.log_level = LogLevel::parse(level)?;
    }
    if let Some(format) = &cli.log_format {
        config.log_format = LogFormat::parse(format)?;
    }
    if let Some(step) = cli.nudge_step {
        config.nudge_step = step;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_env_overrides_apply() {
        let config = apply_env_overrides(
            EngineConfig::default(),
            lookup(&[(ENV_LOG_LEVEL, "debug"), (ENV_HISTORY_LIMIT, "12"), (ENV_NUDGE_STEP, "0.5")]),
        )
        .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.history_limit, 12);
        assert_eq!(config.nudge_step, 0.5);
        assert_eq!(config.zoom_commit_debounce_ms, 250);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let result = apply_env_overrides(EngineConfig::default(), lookup(&[(ENV_HISTORY_LIMIT, "lots")]));
        assert!(matches!(result, Err(DomainError::BadArgs(_))));
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = apply_env_overrides(EngineConfig::default(), lookup(&[(ENV_LOG_LEVEL, "debug")])).unwrap();
        let cli = Cli::parse_from(["clipdeck", "--log-level", "warn", "inspect", "--session", "s.json"]);
        let config = apply_cli_overrides(env, &cli).unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
    }
}
