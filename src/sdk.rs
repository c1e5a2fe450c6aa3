//! Top-level entry point tying configuration, transport and registry together.

use std::sync::Arc;

use tracing::{debug, info};

use crate::client::OpenWeatherClient;
use crate::config::{SdkConfig, SdkMode};
use crate::error::Result;
use crate::provider::{Fetcher, WeatherProvider, build_provider};
use crate::registry::ProviderRegistry;

/// Owns the provider registry for one application.
///
/// Lifecycle: `new` (empty) → providers created on demand → `shutdown`
/// (every provider destroyed).
#[derive(Debug, Clone, Default)]
pub struct WeatherSdk {
    registry: ProviderRegistry,
}

impl WeatherSdk {
    pub fn new() -> Self {
        info!("Weather SDK initialized");
        Self::default()
    }

    /// Get the provider for `config.api_key` and `config.mode`, creating it
    /// with an OpenWeatherMap client if needed.
    ///
    /// Only key and mode identify a provider; other settings apply when it
    /// is first created.
    pub fn provider(&self, config: &SdkConfig) -> Result<Arc<dyn WeatherProvider>> {
        self.registry.get_or_create(&config.api_key, config.mode, || {
            let client = OpenWeatherClient::new(config)?;
            build_provider(config, Arc::new(client))
        })
    }

    /// Like [`provider`](Self::provider), with a caller-supplied fetcher.
    pub fn provider_with(
        &self,
        config: &SdkConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Arc<dyn WeatherProvider>> {
        self.registry
            .get_or_create(&config.api_key, config.mode, || build_provider(config, fetcher))
    }

    /// Current weather for `city` as a JSON document.
    pub async fn get_weather_json(&self, config: &SdkConfig, city: &str) -> Result<String> {
        let provider = self.provider(config)?;
        let data = provider.get_weather(city).await?;

        debug!("Weather data processed for city: {}", city.trim());
        Ok(serde_json::to_string(&data)?)
    }

    /// Destroy the provider for `(api_key, mode)`, if any.
    pub async fn destroy(&self, api_key: &str, mode: SdkMode) -> bool {
        self.registry.destroy(api_key, mode).await
    }

    /// Destroy every provider.
    pub async fn shutdown(&self) {
        info!("Shutting down weather SDK");
        self.registry.shutdown_all().await;
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::FakeFetcher;

    #[tokio::test]
    async fn test_same_key_and_mode_share_provider() {
        let sdk = WeatherSdk::new();
        let fetcher = FakeFetcher::new();
        let config = SdkConfig::builder("shared-key").build().unwrap();

        let a = sdk.provider_with(&config, fetcher.clone()).unwrap();
        let b = sdk.provider_with(&config, fetcher.clone()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        a.get_weather("Madrid").await.unwrap();
        b.get_weather("madrid").await.unwrap();
        assert_eq!(fetcher.calls("madrid"), 1);
    }

    #[tokio::test]
    async fn test_modes_get_separate_providers() {
        let sdk = WeatherSdk::new();
        let fetcher = FakeFetcher::new();
        let on_demand = SdkConfig::builder("key").build().unwrap();
        let polling = SdkConfig::builder("key").mode(SdkMode::Polling).build().unwrap();

        let a = sdk.provider_with(&on_demand, fetcher.clone()).unwrap();
        let b = sdk.provider_with(&polling, fetcher).unwrap();

        assert_eq!(a.mode(), SdkMode::OnDemand);
        assert_eq!(b.mode(), SdkMode::Polling);
        assert_eq!(sdk.registry().len(), 2);

        sdk.shutdown().await;
        assert!(sdk.registry().is_empty());
    }

    #[tokio::test]
    async fn test_destroy_then_recreate() {
        let sdk = WeatherSdk::new();
        let config = SdkConfig::builder("key").build().unwrap();

        let first = sdk.provider_with(&config, FakeFetcher::new()).unwrap();
        assert!(sdk.destroy("key", SdkMode::OnDemand).await);
        let second = sdk.provider_with(&config, FakeFetcher::new()).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_get_weather_json_uses_registered_provider() {
        let sdk = WeatherSdk::new();
        let config = SdkConfig::builder("key").build().unwrap();
        sdk.provider_with(&config, FakeFetcher::new()).unwrap();

        let json = sdk.get_weather_json(&config, "Vienna").await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["name"], "vienna");
        assert_eq!(value["temperature"]["temp"], 1.0);
    }
}
