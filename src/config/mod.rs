//! Configuration module for the weather SDK.
//!
//! Configuration comes from a builder or from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, SdkError};

pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);
const DEFAULT_CACHE_SIZE: usize = 10;
const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(10 * 60);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// How a provider keeps its data fresh.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SdkMode {
    /// Fetch on request, cache with a TTL.
    #[default]
    OnDemand,
    /// Serve from cache, refresh every tracked city in the background.
    Polling,
}

impl SdkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnDemand => "on-demand",
            Self::Polling => "polling",
        }
    }
}

impl fmt::Display for SdkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SdkMode {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "on-demand" => Ok(Self::OnDemand),
            "polling" => Ok(Self::Polling),
            other => Err(SdkError::InvalidConfiguration(format!(
                "unknown SDK mode '{}', expected 'on-demand' or 'polling'",
                other
            ))),
        }
    }
}

/// SDK configuration
#[derive(Clone)]
pub struct SdkConfig {
    /// OpenWeatherMap API key (trimmed).
    pub api_key: String,
    pub mode: SdkMode,

    /// Maximum age of a cached value in on-demand mode.
    pub cache_ttl: Duration,
    /// Maximum number of tracked cities.
    pub max_cache_size: usize,
    /// Period between background refresh cycles in polling mode.
    pub polling_interval: Duration,
    /// Whether a polling-mode cache miss starts tracking the city.
    pub track_on_miss: bool,
    /// How long shutdown waits for an in-flight refresh before aborting it.
    pub shutdown_grace: Duration,

    // HTTP
    pub api_url: String,
    pub timeout: Duration,
}

impl SdkConfig {
    /// Start building a configuration with default settings.
    pub fn builder(api_key: impl Into<String>) -> SdkConfigBuilder {
        SdkConfigBuilder::new(api_key)
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns error if `OPENWEATHER_API_KEY` is missing or blank, the mode
    /// is unknown, or a resulting value is out of range.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENWEATHER_API_KEY").ok_or_else(|| {
            SdkError::InvalidConfiguration("OPENWEATHER_API_KEY must be set".to_string())
        })?;

        let mut builder = Self::builder(api_key);

        if let Some(mode) = lookup("WEATHER_SDK_MODE") {
            builder = builder.mode(mode.parse()?);
        }
        if let Some(minutes) = parse_var::<u64>(&lookup, "WEATHER_SDK_CACHE_TTL") {
            builder = builder.cache_ttl(Duration::from_secs(minutes * 60));
        }
        if let Some(size) = parse_var::<usize>(&lookup, "WEATHER_SDK_CACHE_SIZE") {
            builder = builder.max_cache_size(size);
        }
        if let Some(minutes) = parse_var::<u64>(&lookup, "WEATHER_SDK_POLLING_INTERVAL") {
            builder = builder.polling_interval(Duration::from_secs(minutes * 60));
        }
        if let Some(url) = lookup("WEATHER_API_URL") {
            builder = builder.api_url(url);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "API_TIMEOUT_SECONDS") {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build()
    }
}

// Only a masked form of the API key is printed.
impl fmt::Debug for SdkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkConfig")
            .field("api_key", &crate::utils::mask_credential(&self.api_key))
            .field("mode", &self.mode)
            .field("cache_ttl", &self.cache_ttl)
            .field("max_cache_size", &self.max_cache_size)
            .field("polling_interval", &self.polling_interval)
            .field("track_on_miss", &self.track_on_miss)
            .field("shutdown_grace", &self.shutdown_grace)
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Read a numeric variable; unparseable values fall back to the default.
fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", name, raw);
            None
        }
    }
}

/// Builder for [`SdkConfig`].
#[derive(Debug, Clone)]
pub struct SdkConfigBuilder {
    config: SdkConfig,
}

impl SdkConfigBuilder {
    fn new(api_key: impl Into<String>) -> Self {
        Self {
            config: SdkConfig {
                api_key: api_key.into().trim().to_string(),
                mode: SdkMode::default(),
                cache_ttl: DEFAULT_CACHE_TTL,
                max_cache_size: DEFAULT_CACHE_SIZE,
                polling_interval: DEFAULT_POLLING_INTERVAL,
                track_on_miss: true,
                shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
                api_url: DEFAULT_API_URL.to_string(),
                timeout: DEFAULT_TIMEOUT,
            },
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: SdkMode) -> Self {
        self.config.mode = mode;
        self
    }

    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    #[must_use]
    pub fn max_cache_size(mut self, size: usize) -> Self {
        self.config.max_cache_size = size;
        self
    }

    #[must_use]
    pub fn polling_interval(mut self, interval: Duration) -> Self {
        self.config.polling_interval = interval;
        self
    }

    #[must_use]
    pub fn track_on_miss(mut self, track: bool) -> Self {
        self.config.track_on_miss = track;
        self
    }

    #[must_use]
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.shutdown_grace = grace;
        self
    }

    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Validate and produce the configuration.
    ///
    /// # Errors
    /// Blank API key is an `InvalidArgument`; zero-valued limits and an empty
    /// URL are `InvalidConfiguration`.
    pub fn build(self) -> Result<SdkConfig> {
        let config = self.config;

        if config.api_key.is_empty() {
            return Err(SdkError::InvalidArgument("API key cannot be empty".to_string()));
        }
        if config.max_cache_size == 0 {
            return Err(invalid("cache size must be positive"));
        }
        if config.cache_ttl.is_zero() {
            return Err(invalid("cache TTL must be positive"));
        }
        if config.polling_interval.is_zero() {
            return Err(invalid("polling interval must be positive"));
        }
        if config.timeout.is_zero() {
            return Err(invalid("request timeout must be positive"));
        }
        if config.api_url.trim().is_empty() {
            return Err(invalid("API URL cannot be empty"));
        }

        Ok(config)
    }
}

fn invalid(message: &str) -> SdkError {
    SdkError::InvalidConfiguration(message.to_string())
}
