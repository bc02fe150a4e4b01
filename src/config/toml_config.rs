use crate::config::Backend;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File-based configuration, same knobs as the CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default = "default_backend")]
    pub backend: Backend,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_max_size")]
    pub max_size: usize,

    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_backend() -> Backend {
    Backend::Memory
}

fn default_redis_url() -> String {
    super::DEFAULT_REDIS_URL.to_string()
}

fn default_max_size() -> usize {
    super::DEFAULT_MAX_SIZE
}

fn default_ttl_secs() -> u64 {
    super::DEFAULT_TTL_SECS
}

fn default_cleanup_interval_secs() -> u64 {
    super::DEFAULT_CLEANUP_INTERVAL_SECS
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            redis_url: default_redis_url(),
            max_size: default_max_size(),
            ttl_secs: default_ttl_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl TomlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| crate::utils::error::CacheError::InvalidConfigValueError {
                field: "config".to_string(),
                value: String::new(),
                reason: format!("TOML parse error: {}", e),
            })?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("max_size", self.max_size, 1)?;
        validate_range("ttl_secs", self.ttl_secs, 1, 86_400 * 365)?;
        validate_range("cleanup_interval_secs", self.cleanup_interval_secs, 1, 86_400)?;

        #[cfg(feature = "redis")]
        if self.backend == Backend::Redis {
            crate::utils::validation::validate_redis_url("redis_url", &self.redis_url)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
backend = "memory"
max_size = 500
ttl_secs = 120
cleanup_interval_secs = 30
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.max_size, 500);
        assert_eq!(config.ttl_secs, 120);
        assert_eq!(config.cleanup_interval_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.max_size, 10_000);
        assert_eq!(config.ttl_secs, 3600);
        assert_eq!(config.cleanup_interval_secs, 60);
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        assert!(TomlConfig::from_toml_str("max_size = \"lots\"").is_err());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = TomlConfig::from_toml_str("ttl_secs = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_size = 42").unwrap();

        let config = TomlConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_size, 42);
    }

    #[cfg(feature = "redis")]
    #[test]
    fn test_redis_backend_url_is_validated() {
        let config = TomlConfig::from_toml_str(
            "backend = \"redis\"\nredis_url = \"ftp://example.com\"",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
