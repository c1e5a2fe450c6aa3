//! On-demand provider with TTL caching.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{Fetcher, WeatherProvider};
use crate::cache::{BoundedCache, CacheEntry};
use crate::config::SdkMode;
use crate::error::{Result, SdkError};
use crate::model::WeatherData;
use crate::utils::normalize_city;

/// Serves a cached value while it is younger than the TTL, otherwise
/// fetches synchronously and caches the result.
///
/// Concurrent misses for the same city are not coalesced; each may fetch.
pub struct CachingProvider {
    fetcher: Arc<dyn Fetcher>,
    cache: BoundedCache<String, CacheEntry<WeatherData>>,
    ttl: Duration,
}

impl CachingProvider {
    /// # Errors
    /// Returns `InvalidConfiguration` if `ttl` or `capacity` is zero.
    pub fn new(fetcher: Arc<dyn Fetcher>, ttl: Duration, capacity: usize) -> Result<Self> {
        if ttl.is_zero() {
            return Err(SdkError::InvalidConfiguration("cache TTL must be positive".to_string()));
        }

        let cache = BoundedCache::new("on_demand_weather", capacity)?;
        debug!("Caching provider initialized: TTL={:?}, max_size={}", ttl, capacity);

        Ok(Self { fetcher, cache, ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of cities currently cached, fresh or stale.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl WeatherProvider for CachingProvider {
    async fn get_weather(&self, city: &str) -> Result<WeatherData> {
        let key = normalize_city(city)?;

        // Check cache first
        if let Some(entry) = self.cache.get(&key) {
            if entry.is_fresh(self.ttl) {
                debug!("Cache hit for city: {}", key);
                return Ok(entry.value);
            }
            debug!("Cache entry for {} expired, age: {:?}", key, entry.age());
        } else {
            debug!("Cache miss for city: {}", key);
        }

        // A failed fetch leaves any stale entry in place
        let data = self.fetcher.fetch(&key).await?;

        self.cache.put(key, CacheEntry::new(data.clone()));
        Ok(data)
    }

    fn mode(&self) -> SdkMode {
        SdkMode::OnDemand
    }
}

impl fmt::Debug for CachingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingProvider")
            .field("ttl", &self.ttl)
            .field("cache", &self.cache)
            .finish()
    }
}
