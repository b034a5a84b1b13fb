use serde::{Deserialize, Serialize};

/// Состояние кэша транзакций, возвращается вместе с каждым ответом
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheInfo {
    /// true when the response was served from the held table,
    /// false on the request that performed a successful reload
    pub cached: bool,
    /// ISO-8601 timestamp of the held table's load, None before the first load
    pub cache_timestamp: Option<String>,
    /// Row count of the held transaction table
    pub records_count: usize,
    /// Age of the held table at the time of the request, seconds
    pub cache_age_seconds: Option<f64>,
}

impl CacheInfo {
    /// Cache state before the first successful load
    pub fn empty() -> Self {
        Self {
            cached: false,
            cache_timestamp: None,
            records_count: 0,
            cache_age_seconds: None,
        }
    }
}
