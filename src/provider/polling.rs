//! Polling provider - background refresh of every tracked city.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{Fetcher, WeatherProvider};
use crate::cache::{BoundedCache, CacheEntry};
use crate::config::SdkMode;
use crate::error::{Result, SdkError};
use crate::model::WeatherData;
use crate::utils::normalize_city;

/// Settings for a [`PollingProvider`].
#[derive(Debug, Clone, Copy)]
pub struct PollingOptions {
    /// Maximum number of tracked cities.
    pub capacity: usize,
    /// Period between refresh cycles; the first cycle runs one period after
    /// construction.
    pub interval: Duration,
    /// How long `shutdown` waits for an in-flight cycle before aborting it.
    pub shutdown_grace: Duration,
    /// Start tracking a city the first time it misses the cache.
    pub track_on_miss: bool,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            capacity: 10,
            interval: Duration::from_secs(600), // 10 minutes
            shutdown_grace: Duration::from_secs(5),
            track_on_miss: true,
        }
    }
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub failed: usize,
}

/// State shared between the provider and its background task.
struct Tracker {
    fetcher: Arc<dyn Fetcher>,
    cache: BoundedCache<String, CacheEntry<WeatherData>>,
}

impl Tracker {
    /// Refresh every tracked city concurrently. Failures are per city.
    async fn refresh_all(&self) -> RefreshReport {
        let cities = self.cache.keys();
        info!("Starting scheduled weather update for {} cities", cities.len());

        let outcomes = join_all(cities.into_iter().map(|city| self.refresh_one(city))).await;

        let refreshed = outcomes.iter().filter(|ok| **ok).count();
        let report = RefreshReport {
            refreshed,
            failed: outcomes.len() - refreshed,
        };

        info!(
            "Scheduled update completed: {} refreshed, {} failed",
            report.refreshed, report.failed
        );
        report
    }

    async fn refresh_one(&self, city: String) -> bool {
        match self.fetcher.fetch(&city).await {
            Ok(data) => {
                debug!("Refreshed weather for: {}", city);
                self.cache.put(city, CacheEntry::new(data));
                true
            }
            Err(e) => {
                warn!("Failed to refresh weather for {}: {}", city, e);
                false
            }
        }
    }
}

/// Answers from cache and keeps tracked cities fresh from a background
/// task owned by the provider.
///
/// The task is started on construction and stopped by
/// [`shutdown`](WeatherProvider::shutdown).
pub struct PollingProvider {
    tracker: Arc<Tracker>,
    options: PollingOptions,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
    // Outlives `task`, which the first shutdown call takes
    abort: AbortHandle,
}

impl PollingProvider {
    /// Create the provider and spawn its refresh task on the current runtime.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` for a zero capacity or interval, or if
    /// called outside a Tokio runtime.
    pub fn new(fetcher: Arc<dyn Fetcher>, options: PollingOptions) -> Result<Self> {
        if options.interval.is_zero() {
            return Err(SdkError::InvalidConfiguration(
                "polling interval must be positive".to_string(),
            ));
        }

        let runtime = Handle::try_current().map_err(|_| {
            SdkError::InvalidConfiguration("polling mode requires a running Tokio runtime".to_string())
        })?;

        let tracker = Arc::new(Tracker {
            fetcher,
            cache: BoundedCache::new("polling_weather", options.capacity)?,
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let first_cycle = Instant::now() + options.interval;
        let task = runtime.spawn(run_refresh_loop(
            Arc::clone(&tracker),
            first_cycle,
            options.interval,
            shutdown_rx,
        ));

        let abort = task.abort_handle();

        info!("Polling provider initialized with update interval: {:?}", options.interval);

        Ok(Self {
            tracker,
            options,
            shutdown_tx,
            task: Mutex::new(Some(task)),
            abort,
        })
    }

    /// Run one refresh cycle right away. Does nothing after shutdown.
    pub async fn refresh_now(&self) -> RefreshReport {
        if *self.shutdown_tx.borrow() {
            debug!("Ignoring refresh request, polling provider is shut down");
            return RefreshReport::default();
        }
        self.tracker.refresh_all().await
    }

    /// Whether the background task is still alive.
    ///
    /// Stays `true` while a shutdown is still waiting out its grace period.
    pub fn is_running(&self) -> bool {
        !self.abort.is_finished()
    }

    /// Snapshot of tracked cities, least recently used first.
    pub fn tracked_cities(&self) -> Vec<String> {
        self.tracker.cache.keys()
    }

    pub fn options(&self) -> &PollingOptions {
        &self.options
    }
}

async fn run_refresh_loop(
    tracker: Arc<Tracker>,
    first_cycle: Instant,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(first_cycle, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            // Also fires when the provider is dropped
            _ = shutdown.changed() => break,

            _ = ticker.tick() => {
                if *shutdown.borrow() {
                    break;
                }
                tracker.refresh_all().await;
            }
        }
    }

    debug!("Polling refresh loop stopped");
}

#[async_trait]
impl WeatherProvider for PollingProvider {
    async fn get_weather(&self, city: &str) -> Result<WeatherData> {
        let key = normalize_city(city)?;

        if let Some(entry) = self.tracker.cache.get(&key) {
            debug!("Returning cached data for city: {}", key);
            return Ok(entry.value);
        }

        info!("City not in polling cache, fetching fresh data: {}", key);
        let data = self.tracker.fetcher.fetch(&key).await?;

        if self.options.track_on_miss {
            self.tracker.cache.put(key, CacheEntry::new(data.clone()));
        }

        Ok(data)
    }

    async fn shutdown(&self) {
        // Signal first so no cycle starts once any shutdown call returns
        self.shutdown_tx.send_replace(true);

        let Some(mut task) = self.task.lock().take() else {
            debug!("Polling provider already shut down");
            return;
        };

        info!("Shutting down polling provider");

        match time::timeout(self.options.shutdown_grace, &mut task).await {
            Ok(_) => debug!("Polling provider shutdown completed gracefully"),
            Err(_) => {
                self.abort.abort();
                // Resolves as soon as the cancelled task is torn down
                let _ = task.await;
                warn!(
                    "Polling provider shutdown forced after {:?}",
                    self.options.shutdown_grace
                );
            }
        }
    }

    fn mode(&self) -> SdkMode {
        SdkMode::Polling
    }
}

impl Drop for PollingProvider {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

impl fmt::Debug for PollingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingProvider")
            .field("options", &self.options)
            .field("cache", &self.tracker.cache)
            .field("running", &self.is_running())
            .finish()
    }
}
