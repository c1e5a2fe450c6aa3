//! Providers - the two delivery strategies.
//!
//! A provider answers `get_weather(city)` from its own cache and falls back
//! to a [`Fetcher`] for fresh data:
//!
//! - [`CachingProvider`] - fetch on demand, keep results for a TTL
//! - [`PollingProvider`] - serve from cache, refresh tracked cities in the
//!   background on a fixed period
//!
//! Providers are built by [`build_provider`] and handed out through the
//! [`ProviderRegistry`](crate::registry::ProviderRegistry).

mod caching;
mod polling;

pub use caching::CachingProvider;
pub use polling::{PollingOptions, PollingProvider, RefreshReport};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{SdkConfig, SdkMode};
use crate::error::{FetchError, Result};
use crate::model::WeatherData;

/// Produces fresh weather data for a city. Implemented by the transport.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, city: &str) -> std::result::Result<WeatherData, FetchError>;
}

/// Capability shared by every delivery strategy.
#[async_trait]
pub trait WeatherProvider: Send + Sync + fmt::Debug {
    /// Current weather for `city`.
    ///
    /// # Errors
    /// `InvalidArgument` for a blank city; fetch failures are passed through
    /// unchanged.
    async fn get_weather(&self, city: &str) -> Result<WeatherData>;

    /// Stop any background work. Calling it again is a no-op.
    async fn shutdown(&self) {}

    fn mode(&self) -> SdkMode;
}

/// Build the provider matching `config.mode` around `fetcher`.
///
/// # Errors
/// Returns `InvalidConfiguration` for zero limits, or when polling mode is
/// requested outside a Tokio runtime.
pub fn build_provider(config: &SdkConfig, fetcher: Arc<dyn Fetcher>) -> Result<Arc<dyn WeatherProvider>> {
    match config.mode {
        SdkMode::OnDemand => {
            debug!(
                "Building on-demand provider: TTL={:?}, max_size={}",
                config.cache_ttl, config.max_cache_size
            );
            let provider = CachingProvider::new(fetcher, config.cache_ttl, config.max_cache_size)?;
            Ok(Arc::new(provider))
        }
        SdkMode::Polling => {
            debug!(
                "Building polling provider: interval={:?}, max_size={}",
                config.polling_interval, config.max_cache_size
            );
            let options = PollingOptions {
                capacity: config.max_cache_size,
                interval: config.polling_interval,
                shutdown_grace: config.shutdown_grace,
                track_on_miss: config.track_on_miss,
            };
            let provider = PollingProvider::new(fetcher, options)?;
            Ok(Arc::new(provider))
        }
    }
}
