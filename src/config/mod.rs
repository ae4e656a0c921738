mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::path::Path;
use std::time::Duration;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            provider: Provider::default(),
            providers: ProvidersConfig::default(),
            retry: RetryConfig::default(),
            mode: ExecutionMode::default(),
            concurrency: default_concurrency(),
            target_chunk_count: default_target_chunk_count(),
            max_reviews_per_chunk: None,
            timeout_sec: default_timeout_sec(),
            chunk_timeout_sec: default_chunk_timeout_sec(),
            launch_delay_ms: default_launch_delay_ms(),
            classify_unlabeled: default_true(),
            failed_chunk_policy: FailedChunkPolicy::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != default_version() {
            return Err(ConfigError::Invalid {
                field: "version",
                reason: format!("unsupported version {}", self.version),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.target_chunk_count == 0 {
            return Err(ConfigError::Invalid {
                field: "target_chunk_count",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_reviews_per_chunk == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_reviews_per_chunk",
                reason: "must be at least 1 when set".to_string(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "retry.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.retry.backoff_base_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "retry.backoff_base_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.timeout_sec == 0 || self.chunk_timeout_sec == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_sec",
                reason: "timeouts must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn chunking(&self) -> Chunking {
        match self.max_reviews_per_chunk {
            Some(max) if max > 0 => Chunking::MaxPerChunk(max),
            _ => Chunking::Target(self.target_chunk_count.max(1)),
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_sec)
    }

    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_sec)
    }

    pub fn launch_delay(&self) -> Duration {
        Duration::from_millis(self.launch_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("provider: openai\n").unwrap();
        assert_eq!(config.provider, Provider::Openai);
        assert_eq!(config.target_chunk_count, 10);
        assert_eq!(config.failed_chunk_policy, FailedChunkPolicy::Drop);
        assert_eq!(config.providers.openai.api_key_env, "OPENAI_API_KEY");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
provider: codex_cli
mode: sequential
concurrency: 2
target_chunk_count: 4
failed_chunk_policy: retry_individually
retry:
  max_attempts: 1
  backoff_base_ms: 5
providers:
  codex_cli:
    model: o4-mini
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.mode, ExecutionMode::Sequential);
        assert_eq!(config.failed_chunk_policy, FailedChunkPolicy::RetryIndividually);
        assert_eq!(config.providers.codex_cli.model, "o4-mini");
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn test_validate_rejects_zero_chunks() {
        let config = Config {
            target_chunk_count: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "target_chunk_count",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_backoff() {
        let mut config = Config::default();
        config.retry.backoff_base_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chunking() {
        let mut config = Config::default();
        assert_eq!(config.chunking(), Chunking::Target(10));

        config.max_reviews_per_chunk = Some(40);
        assert_eq!(config.chunking(), Chunking::MaxPerChunk(40));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "split".parse::<FailedChunkPolicy>(),
            Ok(FailedChunkPolicy::Split)
        );
        assert_eq!(
            "retry-individually".parse::<FailedChunkPolicy>(),
            Ok(FailedChunkPolicy::RetryIndividually)
        );
        assert!("ignore".parse::<FailedChunkPolicy>().is_err());
    }
}
