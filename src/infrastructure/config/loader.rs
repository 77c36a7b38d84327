use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::RecorderConfig;
use crate::services::MAX_POOL_SIZE;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid callback_threads: {0}. Must be between 0 and {MAX_POOL_SIZE}")]
    InvalidCallbackThreads(usize),

    #[error("Unknown record client: {0}. Only 'http' is available")]
    UnknownClient(String),

    #[error("API endpoint cannot be empty")]
    EmptyEndpoint,

    #[error("Invalid API timeout: {0}. Must be at least 1 second")]
    InvalidTimeout(u64),
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. runscribe.yaml in the working directory
    /// 3. Environment variables (RUNSCRIBE_* prefix, highest priority)
    pub fn load() -> Result<RecorderConfig> {
        let config: RecorderConfig = Figment::new()
            .merge(Serialized::defaults(RecorderConfig::default()))
            .merge(Yaml::file("runscribe.yaml"))
            .merge(Env::prefixed("RUNSCRIBE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<RecorderConfig> {
        let config: RecorderConfig = Figment::new()
            .merge(Serialized::defaults(RecorderConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("RUNSCRIBE_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &RecorderConfig) -> Result<(), ConfigError> {
        if config.callback_threads > MAX_POOL_SIZE {
            return Err(ConfigError::InvalidCallbackThreads(config.callback_threads));
        }

        if config.client != "http" {
            return Err(ConfigError::UnknownClient(config.client.clone()));
        }

        if config.api.endpoint.is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }

        if config.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.api.timeout_secs));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::HostnameFormat;

    #[test]
    fn default_config_is_valid() {
        let config = RecorderConfig::default();
        assert_eq!(config.client, "http");
        assert_eq!(config.callback_threads, 0);
        assert_eq!(config.ignored_facts, vec!["all".to_string()]);
        assert_eq!(config.ignored_arguments, vec!["extra_vars".to_string()]);
        assert!(config.record_task_content);
        ConfigLoader::validate(&config).expect("default config should be valid");
    }

    #[test]
    fn yaml_parsing() {
        let yaml = r"
callback_threads: 2
api:
  endpoint: https://records.example.com
  token: secret-token
  timeout_secs: 10
localhost_as_hostname: true
localhost_as_hostname_format: fqdn_short
default_labels:
  - nightly
";
        let config: RecorderConfig = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.callback_threads, 2);
        assert_eq!(config.api.endpoint, "https://records.example.com");
        assert_eq!(config.api.token.as_deref(), Some("secret-token"));
        assert_eq!(config.api.timeout_secs, 10);
        assert!(config.localhost_as_hostname);
        assert_eq!(
            config.localhost_as_hostname_format,
            HostnameFormat::FqdnShort
        );
        assert_eq!(config.default_labels, vec!["nightly".to_string()]);

        ConfigLoader::validate(&config).expect("parsed config should be valid");
    }

    #[test]
    fn validate_rejects_oversized_pool() {
        let config = RecorderConfig {
            callback_threads: 9,
            ..Default::default()
        };
        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidCallbackThreads(9)
        ));
    }

    #[test]
    fn validate_rejects_unknown_client() {
        let config = RecorderConfig {
            client: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        let result = ConfigLoader::validate(&config);
        match result.unwrap_err() {
            ConfigError::UnknownClient(name) => assert_eq!(name, "carrier-pigeon"),
            other => panic!("expected UnknownClient, got {other}"),
        }
    }

    #[test]
    fn validate_rejects_empty_endpoint() {
        let mut config = RecorderConfig::default();
        config.api.endpoint = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyEndpoint
        ));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = RecorderConfig::default();
        config.api.timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidTimeout(0)
        ));
    }

    #[test]
    fn hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "callback_threads: 1\napi:\n  endpoint: http://base.example.com"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "callback_threads: 3").unwrap();
        override_file.flush().unwrap();

        let config: RecorderConfig = Figment::new()
            .merge(Serialized::defaults(RecorderConfig::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.callback_threads, 3, "override should win");
        assert_eq!(
            config.api.endpoint, "http://base.example.com",
            "base value should persist when not overridden"
        );
    }
}
