use serde::{Deserialize, Serialize};

/// Snapshot of cache occupancy: entry count, capacity, and the recency
/// list from least to most recently used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub keys: Vec<String>,
}
