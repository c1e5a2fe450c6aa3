//! Cache module - bounded LRU storage for weather lookups.
//!
//! Each provider owns exactly one [`BoundedCache`] keyed by normalized
//! city name. Entries carry the instant they were produced so the
//! on-demand provider can enforce its TTL.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let cache: BoundedCache<String, CacheEntry<WeatherData>> = BoundedCache::new("weather", 10)?;
//!
//! cache.put("london".to_string(), CacheEntry::new(data));
//! let entry = cache.get("london");
//! ```

mod bounded;

pub use bounded::BoundedCache;

use std::time::Duration;

use tokio::time::Instant;

/// A cached value plus the instant it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Stamp a freshly fetched value with the current instant.
    pub fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.inserted_at.elapsed()
    }

    /// Whether the entry is still younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}
