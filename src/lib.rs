pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::memory::MemoryStore;
#[cfg(feature = "redis")]
pub use adapters::redis::RedisStore;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{Backend, TomlConfig};

pub use crate::core::cache::LruCache;
pub use crate::core::keys::derive_key;
pub use crate::core::memo::{HasId, Memoizer};

pub use domain::model::CacheStats;
pub use domain::ports::{Pipeline, Store};

pub use utils::error::{CacheError, Result};
