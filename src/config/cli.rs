use crate::config::Backend;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "shared-lru")]
#[command(about = "Distributed LRU cache over pluggable store backends")]
pub struct CliConfig {
    #[arg(long, value_enum, default_value = "memory")]
    pub backend: Backend,

    #[arg(long, default_value = super::DEFAULT_REDIS_URL)]
    pub redis_url: String,

    #[arg(long, default_value_t = super::DEFAULT_MAX_SIZE)]
    pub max_size: usize,

    #[arg(long, default_value_t = super::DEFAULT_TTL_SECS)]
    pub ttl_secs: u64,

    #[arg(long, default_value_t = super::DEFAULT_CLEANUP_INTERVAL_SECS)]
    pub cleanup_interval_secs: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Cache a value under a key (value is parsed as JSON, else stored
    /// as a string)
    Set {
        key: String,
        value: String,
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
    /// Print the cached value for a key
    Get { key: String },
    /// Remove a key
    Del { key: String },
    /// Print cache occupancy and the recency list
    Stats,
    /// Drop every cached entry
    Clear,
}

impl Validate for CliConfig {
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

    fn config_with(args: &[&str]) -> CliConfig {
        let mut argv = vec!["shared-lru"];
        argv.extend_from_slice(args);
        argv.push("stats");
        CliConfig::parse_from(argv)
    }

    #[test]
    fn test_defaults_validate() {
        let config = config_with(&[]);
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.max_size, 10_000);
        assert_eq!(config.ttl_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_size_rejected() {
        let config = config_with(&["--max-size", "0"]);
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "redis")]
    #[test]
    fn test_redis_backend_requires_valid_url() {
        let config = config_with(&["--backend", "redis", "--redis-url", "http://nope"]);
        assert!(config.validate().is_err());

        let config = config_with(&["--backend", "redis", "--redis-url", "redis://10.0.0.5:6379"]);
        assert!(config.validate().is_ok());
    }
}
