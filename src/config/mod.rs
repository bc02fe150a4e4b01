#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use serde::{Deserialize, Serialize};

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";
pub const DEFAULT_MAX_SIZE: usize = 10_000;
pub const DEFAULT_TTL_SECS: u64 = 3600;
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Which store the cache runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Backend {
    Memory,
    #[cfg(feature = "redis")]
    Redis,
}

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;
