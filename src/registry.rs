//! Provider registry - at most one live provider per (API key, mode).

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::SdkMode;
use crate::error::{Result, SdkError};
use crate::provider::WeatherProvider;
use crate::utils::mask_credential;

/// Registry owning every live provider, keyed by `"<api key>|<mode>"`.
///
/// The registry is the only place providers are created or torn down.
/// It is an ordinary value: the application builds one and passes it
/// around, and tests build as many isolated ones as they need.
///
/// Keys are compared verbatim; `"abc"` and `" abc"` are different entries.
///
/// ## Example
///
/// ```rust,ignore
/// let registry = ProviderRegistry::new();
///
/// let provider = registry.get_or_create(&api_key, SdkMode::OnDemand, || {
///     build_provider(&config, fetcher.clone())
/// })?;
///
/// registry.destroy(&api_key, SdkMode::OnDemand).await;
/// ```
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Arc<RwLock<HashMap<String, Arc<dyn WeatherProvider>>>>,
}

fn instance_key(credential: &str, mode: SdkMode) -> String {
    format!("{}|{}", credential, mode)
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        debug!("Provider registry initialized");
        Self::default()
    }

    /// Return the provider for `(credential, mode)`, creating it with
    /// `factory` if none is registered.
    ///
    /// Concurrent callers for the same pair all receive the same instance
    /// and `factory` runs at most once. It runs under the registry's write
    /// lock, so it must not call back into the registry.
    ///
    /// # Errors
    /// `InvalidArgument` for a blank credential; any error from `factory`
    /// (nothing is registered in that case).
    pub fn get_or_create<F>(
        &self,
        credential: &str,
        mode: SdkMode,
        factory: F,
    ) -> Result<Arc<dyn WeatherProvider>>
    where
        F: FnOnce() -> Result<Arc<dyn WeatherProvider>>,
    {
        if credential.trim().is_empty() {
            return Err(SdkError::InvalidArgument("API key cannot be empty".to_string()));
        }

        let key = instance_key(credential, mode);

        if let Some(existing) = self.providers.read().get(&key) {
            debug!(
                "Reusing provider for API key: {}, mode: {}",
                mask_credential(credential),
                mode
            );
            return Ok(Arc::clone(existing));
        }

        let mut providers = self.providers.write();
        match providers.entry(key) {
            // Created by another caller while we waited for the write lock
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                info!(
                    "Creating new provider for API key: {}, mode: {}",
                    mask_credential(credential),
                    mode
                );
                let provider = factory()?;
                entry.insert(Arc::clone(&provider));
                Ok(provider)
            }
        }
    }

    /// Get an existing provider without creating one.
    pub fn get(&self, credential: &str, mode: SdkMode) -> Option<Arc<dyn WeatherProvider>> {
        self.providers
            .read()
            .get(&instance_key(credential, mode))
            .map(Arc::clone)
    }

    /// Check if a provider is registered for `(credential, mode)`.
    pub fn contains(&self, credential: &str, mode: SdkMode) -> bool {
        self.providers
            .read()
            .contains_key(&instance_key(credential, mode))
    }

    /// Remove the provider for `(credential, mode)` and shut it down.
    ///
    /// Returns `true` if a provider was removed. Missing entries are not an
    /// error.
    pub async fn destroy(&self, credential: &str, mode: SdkMode) -> bool {
        if credential.trim().is_empty() {
            warn!("Attempt to destroy provider with empty API key");
            return false;
        }

        let removed = self.providers.write().remove(&instance_key(credential, mode));

        match removed {
            Some(provider) => {
                info!(
                    "Destroying provider for API key: {}, mode: {}",
                    mask_credential(credential),
                    mode
                );
                provider.shutdown().await;
                true
            }
            None => {
                debug!(
                    "No provider registered for API key: {}, mode: {}",
                    mask_credential(credential),
                    mode
                );
                false
            }
        }
    }

    /// Remove every provider and shut them all down.
    pub async fn shutdown_all(&self) {
        let drained: Vec<Arc<dyn WeatherProvider>> =
            self.providers.write().drain().map(|(_, provider)| provider).collect();

        if drained.is_empty() {
            return;
        }

        info!("Shutting down {} providers", drained.len());
        join_all(drained.iter().map(|provider| provider.shutdown())).await;
    }

    /// Get the number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers = self.providers.read();
        f.debug_struct("ProviderRegistry")
            .field("provider_count", &providers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::model::WeatherData;
    use crate::provider::testing::{FakeFetcher, sample};
    use crate::provider::{CachingProvider, PollingOptions, PollingProvider};

    /// Counts shutdown calls.
    #[derive(Debug, Default)]
    struct RecordingProvider {
        shutdowns: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for RecordingProvider {
        async fn get_weather(&self, city: &str) -> Result<WeatherData> {
            Ok(sample(city, 20.0))
        }

        async fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }

        fn mode(&self) -> SdkMode {
            SdkMode::OnDemand
        }
    }

    fn caching() -> Result<Arc<dyn WeatherProvider>> {
        let provider = CachingProvider::new(FakeFetcher::new(), Duration::from_secs(600), 10)?;
        Ok(Arc::new(provider))
    }

    #[test]
    fn test_concurrent_get_or_create_builds_once() {
        let registry = ProviderRegistry::new();
        let constructed = AtomicUsize::new(0);
        let barrier = Barrier::new(16);

        let (registry_ref, constructed_ref, barrier_ref) = (&registry, &constructed, &barrier);
        let instances: Vec<Arc<dyn WeatherProvider>> = thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    s.spawn(move || {
                        barrier_ref.wait();
                        registry_ref
                            .get_or_create("secret-api-key", SdkMode::OnDemand, || {
                                constructed_ref.fetch_add(1, Ordering::SeqCst);
                                caching()
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(constructed.load(Ordering::SeqCst), 1);
        assert!(instances.iter().all(|p| Arc::ptr_eq(p, &instances[0])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_key_and_mode_are_both_part_of_identity() {
        let registry = ProviderRegistry::new();

        let a = registry.get_or_create("key-one", SdkMode::OnDemand, caching).unwrap();
        let b = registry.get_or_create("key-two", SdkMode::OnDemand, caching).unwrap();
        let c = registry.get_or_create("key-one", SdkMode::Polling, caching).unwrap();
        let d = registry.get_or_create(" key-one", SdkMode::OnDemand, caching).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(!Arc::ptr_eq(&a, &d));
        assert_eq!(registry.len(), 4);
        assert!(registry.contains("key-one", SdkMode::Polling));
        assert!(registry.get("key-three", SdkMode::OnDemand).is_none());
    }

    #[test]
    fn test_blank_credential_is_rejected() {
        let registry = ProviderRegistry::new();

        let result = registry.get_or_create("  ", SdkMode::OnDemand, || {
            panic!("factory must not run for a blank key")
        });

        assert!(matches!(result, Err(SdkError::InvalidArgument(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_failed_factory_registers_nothing() {
        let registry = ProviderRegistry::new();

        let result = registry.get_or_create("key", SdkMode::OnDemand, || {
            Err(SdkError::InvalidConfiguration("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(registry.is_empty());

        assert!(registry.get_or_create("key", SdkMode::OnDemand, caching).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_destroy_shuts_down_and_allows_recreation() {
        let registry = ProviderRegistry::new();
        let recorder = Arc::new(RecordingProvider::default());

        let first = registry
            .get_or_create("key", SdkMode::OnDemand, || Ok(recorder.clone() as Arc<dyn WeatherProvider>))
            .unwrap();

        assert!(registry.destroy("key", SdkMode::OnDemand).await);
        assert_eq!(recorder.shutdowns.load(Ordering::SeqCst), 1);
        assert!(!registry.contains("key", SdkMode::OnDemand));

        let second = registry.get_or_create("key", SdkMode::OnDemand, caching).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_destroy_missing_is_a_no_op() {
        let registry = ProviderRegistry::new();

        assert!(!registry.destroy("nobody", SdkMode::Polling).await);
        assert!(!registry.destroy("   ", SdkMode::Polling).await);
    }

    #[tokio::test]
    async fn test_destroy_stops_polling_task() {
        let registry = ProviderRegistry::new();
        let polling = Arc::new(PollingProvider::new(FakeFetcher::new(), PollingOptions::default()).unwrap());

        registry
            .get_or_create("key", SdkMode::Polling, || Ok(polling.clone() as Arc<dyn WeatherProvider>))
            .unwrap();
        assert!(polling.is_running());

        registry.destroy("key", SdkMode::Polling).await;
        assert!(!polling.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_all_tears_everything_down() {
        let registry = ProviderRegistry::new();
        let recorders: Vec<Arc<RecordingProvider>> =
            (0..3).map(|_| Arc::new(RecordingProvider::default())).collect();

        for (i, recorder) in recorders.iter().enumerate() {
            let key = format!("key-{}", i);
            registry
                .get_or_create(&key, SdkMode::OnDemand, || Ok(recorder.clone() as Arc<dyn WeatherProvider>))
                .unwrap();
        }

        registry.shutdown_all().await;

        assert!(registry.is_empty());
        assert!(recorders.iter().all(|r| r.shutdowns.load(Ordering::SeqCst) == 1));
    }
}
