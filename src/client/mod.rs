//! OpenWeatherMap HTTP client.
//!
//! Implements [`Fetcher`] on top of `reqwest`. Responsible for turning HTTP
//! statuses and transport failures into [`FetchError`] classifications;
//! nothing above this layer looks at status codes.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::config::SdkConfig;
use crate::error::{FetchError, FetchErrorKind, Result, SdkError};
use crate::model::{Sys, Temperature, Weather, WeatherData, Wind};
use crate::provider::Fetcher;

const USER_AGENT: &str = concat!("skywatch/", env!("CARGO_PKG_VERSION"));

/// Client for the OpenWeatherMap current weather endpoint.
#[derive(Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a client using the URL, key and timeout from `config`.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the HTTP client cannot be built.
    pub fn new(config: &SdkConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SdkError::InvalidConfiguration(format!("failed to build HTTP client: {}", e)))?;

        debug!("OpenWeatherMap client initialized with timeout: {:?}", config.timeout);

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Fetcher for OpenWeatherClient {
    async fn fetch(&self, city: &str) -> std::result::Result<WeatherData, FetchError> {
        let city = city.trim();
        debug!("Requesting current weather for city: {}", city);

        // The URL carries the API key, so it is never logged
        let response = self
            .http
            .get(&self.api_url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_transport_error)?;

        if status != 200 {
            return Err(classify_status(status, city, &body));
        }

        let parsed: ApiWeatherResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse weather response for {}: {}", city, e);
            FetchError::new(FetchErrorKind::MalformedResponse, format!("invalid weather payload: {}", e))
                .with_status(status)
        })?;

        debug!("Weather data retrieved for city: {}", city);
        Ok(parsed.into())
    }
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

fn classify_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        warn!("Weather API request timed out");
        FetchError::new(FetchErrorKind::Timeout, "weather API request timed out")
    } else if e.is_connect() {
        error!("Could not connect to weather API: {}", e.without_url());
        FetchError::new(FetchErrorKind::Network, "could not connect to weather API")
    } else {
        let e = e.without_url();
        error!("Weather API request failed: {}", e);
        FetchError::new(FetchErrorKind::Network, format!("weather API request failed: {}", e))
    }
}

/// Map a non-200 status to a fetch error.
fn classify_status(status: u16, city: &str, body: &str) -> FetchError {
    let api_message = extract_api_message(body);

    let (kind, message) = match status {
        400 => (FetchErrorKind::InvalidRequest, format!("invalid request: {}", api_message)),
        401 => (FetchErrorKind::Unauthorized, format!("invalid API key: {}", api_message)),
        404 => (FetchErrorKind::NotFound, format!("city not found: {}", city)),
        429 => (FetchErrorKind::RateLimited, format!("rate limit exceeded: {}", api_message)),
        500 | 502 | 503 | 504 => (
            FetchErrorKind::UpstreamUnavailable,
            format!("weather service error {}: {}", status, api_message),
        ),
        _ => (FetchErrorKind::Other, format!("unexpected status {}: {}", status, api_message)),
    };

    match kind {
        FetchErrorKind::UpstreamUnavailable | FetchErrorKind::Unauthorized | FetchErrorKind::Other => {
            error!("Weather API returned {} for {}: {}", status, city, api_message)
        }
        _ => warn!("Weather API returned {} for {}: {}", status, city, api_message),
    }

    FetchError::new(kind, message).with_status(status)
}

/// Pull the human-readable message out of an error body.
///
/// Falls back to the raw body if it is not JSON or has no message field.
fn extract_api_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };

    ["message", "error"]
        .iter()
        .find_map(|field| json.get(field))
        .map(|value| match value.as_str() {
            Some(s) => s.to_string(),
            None => value.to_string(),
        })
        .unwrap_or_else(|| body.to_string())
}

/// Wire format of the current weather endpoint. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiWeatherResponse {
    weather: Vec<ApiWeather>,
    main: Option<ApiMain>,
    visibility: Option<i64>,
    wind: Option<ApiWind>,
    dt: Option<i64>,
    sys: Option<ApiSys>,
    timezone: Option<i64>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiWeather {
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    #[serde(default)]
    temp: f64,
    #[serde(default)]
    feels_like: f64,
}

#[derive(Debug, Deserialize)]
struct ApiWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ApiSys {
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

impl From<ApiWeatherResponse> for WeatherData {
    fn from(api: ApiWeatherResponse) -> Self {
        Self {
            weather: api.weather.into_iter().next().map(|w| Weather {
                main: w.main,
                description: w.description,
            }),
            temperature: api.main.map(|m| Temperature {
                temp: m.temp,
                feels_like: m.feels_like,
            }),
            visibility: api.visibility.unwrap_or_default(),
            wind: api.wind.map(|w| Wind { speed: w.speed }),
            datetime: api.dt.unwrap_or_default(),
            sys: api.sys.map(|s| Sys {
                sunrise: s.sunrise,
                sunset: s.sunset,
            }),
            timezone: api.timezone.unwrap_or_default(),
            name: api.name.unwrap_or_default(),
        }
    }
}
