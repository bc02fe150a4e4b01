pub mod cache;
pub mod keys;
pub mod memo;

pub use crate::domain::model::CacheStats;
pub use crate::domain::ports::{Pipeline, Store};
pub use crate::utils::error::Result;
