//! Lectern cache layer
//!
//! A small key-value store with per-entry expiry. It holds two kinds of entries:
//!
//! - **Snapshot**: the serialized weekly recommendations under `weekly_recommendations`
//! - **Marker**: `refresh:completed:<task id>`, which marks a refresh as done for the day
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "memory"   # or "redis"
//! redis_url = "redis://127.0.0.1:6379"
//! ```

mod config;
mod keys;
mod memory;
mod redis_store;
mod store;

use std::sync::Arc;

pub use config::{CacheBackend, CacheConfig};
pub use keys::CacheKey;
pub use memory::MemoryCacheStore;
pub use redis_store::RedisCacheStore;
pub use store::{CacheError, CacheStore};

use crate::util::Clock;

/// Build the configured cache backend.
pub async fn connect(
    config: &CacheConfig,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn CacheStore>, CacheError> {
    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCacheStore::new(clock))),
        CacheBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                CacheError::unavailable("cache.redis_url is required for the redis backend")
            })?;
            Ok(Arc::new(RedisCacheStore::connect(url).await?))
        }
    }
}
