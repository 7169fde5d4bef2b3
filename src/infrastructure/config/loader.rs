use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project directory holding configuration files
pub const CONFIG_DIR: &str = ".agentcore";

/// Prefix of environment overrides; nested keys are separated by `__`
pub const ENV_PREFIX: &str = "AGENTCORE_";

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Base URL cannot be empty")]
    EmptyBaseUrl,

    #[error("Default model cannot be empty")]
    EmptyDefaultModel,

    #[error("Invalid max_tokens: {0}. Must be at least 1")]
    InvalidMaxTokens(u32),

    #[error("Invalid timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid max_concurrent: {0}. Must be at least 1")]
    InvalidMaxConcurrent(usize),

    #[error("Invalid backoff_factor: {0}. Must be at least 1.0")]
    InvalidBackoffFactor(String),

    #[error(
        "Invalid backoff configuration: initial_delay_ms ({0}) must not exceed max_delay_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid orchestrator max_concurrency: {0}. Must be at least 1")]
    InvalidOrchestratorConcurrency(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration relative to the working directory
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .agentcore/config.yaml (project config)
    /// 3. .agentcore/local.yaml (local overrides, optional)
    /// 4. Environment variables (AGENTCORE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`ConfigLoader::load`] with `.agentcore/` resolved under `root`.
    pub fn load_from(root: impl AsRef<Path>) -> Result<Config> {
        let dir = root.as_ref().join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, without env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.llm.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if config.llm.default_model.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultModel);
        }
        if config.llm.max_tokens == 0 {
            return Err(ConfigError::InvalidMaxTokens(config.llm.max_tokens));
        }
        if config.llm.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.llm.timeout_secs));
        }

        if config.rate_limit.max_concurrent == 0 {
            return Err(ConfigError::InvalidMaxConcurrent(
                config.rate_limit.max_concurrent,
            ));
        }

        if config.retry.backoff_factor.is_nan() || config.retry.backoff_factor < 1.0 {
            return Err(ConfigError::InvalidBackoffFactor(
                config.retry.backoff_factor.to_string(),
            ));
        }
        if config.retry.initial_delay_ms > config.retry.max_delay_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_delay_ms,
                config.retry.max_delay_ms,
            ));
        }

        if config.orchestrator.max_concurrency == 0 {
            return Err(ConfigError::InvalidOrchestratorConcurrency(
                config.orchestrator.max_concurrency,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, yaml: &str) {
        let config_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(name), yaml).unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.rate_limit.max_concurrent, 5);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
llm:
  base_url: http://localhost:11434/v1
  default_model: llama3
rate_limit:
  max_concurrent: 2
  min_interval_ms: 500
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.default_model, "llama3");
        assert_eq!(config.llm.max_tokens, 2048);
        assert_eq!(config.rate_limit.max_concurrent, 2);
        assert_eq!(config.rate_limit.min_interval_ms, 500);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_local_overrides_project_config() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "config.yaml", "llm:\n  default_model: gpt-4o\n  max_tokens: 512\n");
        write_config(&dir, "local.yaml", "llm:\n  max_tokens: 256\n");

        let config = temp_env::with_vars_unset(
            ["AGENTCORE_LLM__DEFAULT_MODEL", "AGENTCORE_LLM__MAX_TOKENS"],
            || ConfigLoader::load_from(dir.path()),
        )
        .unwrap();

        assert_eq!(config.llm.default_model, "gpt-4o");
        assert_eq!(config.llm.max_tokens, 256);
    }

    #[test]
    fn test_env_overrides_files() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "config.yaml", "rate_limit:\n  max_concurrent: 2\n");

        let config = temp_env::with_vars(
            [
                ("AGENTCORE_RATE_LIMIT__MAX_CONCURRENT", Some("8")),
                ("AGENTCORE_LOGGING__LEVEL", Some("debug")),
            ],
            || ConfigLoader::load_from(dir.path()),
        )
        .unwrap();

        assert_eq!(config.rate_limit.max_concurrent, 8);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from(dir.path()).unwrap();
        assert_eq!(config.orchestrator.max_concurrency, 4);
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "logging:\n  format: xml\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::InvalidLogFormat("xml".to_string()))
        );
    }

    #[test]
    fn test_validate_zero_max_concurrent() {
        let mut config = Config::default();
        config.rate_limit.max_concurrent = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxConcurrent(0))
        );
    }

    #[test]
    fn test_validate_invalid_backoff() {
        let mut config = Config::default();
        config.retry.initial_delay_ms = 60_000;
        config.retry.max_delay_ms = 1_000;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(60_000, 1_000))
        );
    }

    #[test]
    fn test_validate_backoff_factor_below_one() {
        let mut config = Config::default();
        config.retry.backoff_factor = 0.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoffFactor(_))
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_empty_model() {
        let mut config = Config::default();
        config.llm.default_model = "  ".to_string();
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyDefaultModel)
        );
    }
}
