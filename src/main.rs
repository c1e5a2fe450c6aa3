//! Skywatch - command line weather lookup.
//!
//! Usage: `skywatch <city>...`
//!
//! Configuration is read from the environment (and `.env`), see
//! [`SdkConfig::from_env`].

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use skywatch::{SdkConfig, WeatherSdk};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("skywatch=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cities: Vec<String> = std::env::args().skip(1).collect();
    if cities.is_empty() {
        anyhow::bail!("usage: skywatch <city>...");
    }

    let config = SdkConfig::from_env()?;
    info!("Configuration loaded: {:?}", config);

    let sdk = WeatherSdk::new();

    for city in &cities {
        match sdk.get_weather_json(&config, city).await {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Could not get weather for {}: {}", city, e),
        }
    }

    sdk.shutdown().await;
    Ok(())
}
