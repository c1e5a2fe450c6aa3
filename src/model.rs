//! Weather data returned to callers.

use serde::{Deserialize, Serialize};

/// Current weather for one city.
///
/// Serializes to the JSON document handed out by
/// [`WeatherSdk::get_weather_json`](crate::WeatherSdk::get_weather_json).
/// Groups missing from the upstream payload serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub weather: Option<Weather>,
    pub temperature: Option<Temperature>,
    pub visibility: i64,
    pub wind: Option<Wind>,
    /// Observation time, unix seconds (UTC).
    pub datetime: i64,
    pub sys: Option<Sys>,
    /// Shift from UTC in seconds.
    pub timezone: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub main: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub temp: f64,
    pub feels_like: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    pub sunrise: i64,
    pub sunset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_groups_serialize_as_null() {
        let data = WeatherData {
            weather: None,
            temperature: Some(Temperature { temp: 12.5, feels_like: 11.0 }),
            visibility: 10_000,
            wind: None,
            datetime: 1_675_744_800,
            sys: None,
            timezone: 3600,
            name: "Paris".to_string(),
        };

        let json: serde_json::Value = serde_json::to_value(&data).unwrap();

        assert!(json["weather"].is_null());
        assert_eq!(json["temperature"]["feels_like"], 11.0);
        assert_eq!(json["name"], "Paris");
    }
}
