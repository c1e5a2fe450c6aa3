//! Skywatch - weather data client with caching and background polling.
//!
//! Two delivery strategies sit behind one [`WeatherProvider`] trait:
//!
//! - **on-demand** - fetch when asked, cache results for a TTL
//! - **polling** - serve from cache, refresh tracked cities in the background
//!
//! ## Architecture
//!
//! - `cache` - bounded, thread-safe LRU storage
//! - `provider` - the `Fetcher` seam and both strategies
//! - `registry` - one live provider per (API key, mode)
//! - `sdk` - application entry point owning the registry
//! - `client` - OpenWeatherMap transport
//! - `config` - builder and environment configuration
//! - `utils` - key normalization and credential masking

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod registry;
pub mod sdk;
pub mod utils;

pub use config::{SdkConfig, SdkMode};
pub use error::{FetchError, FetchErrorKind, Result, SdkError};
pub use model::WeatherData;
pub use provider::{Fetcher, WeatherProvider};
pub use registry::ProviderRegistry;
pub use sdk::WeatherSdk;
