use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::SentinelConfig;
use crate::models::AtmosphereReading;

/// Reads current surface pressure and wind from the `OpenMeteo` forecast API.
///
/// Never fails: any upstream problem yields [`AtmosphereReading::fallback`].
pub struct AtmosphereFetcher {
    client: Client,
    base_url: String,
}

impl AtmosphereFetcher {
    #[must_use]
    pub fn new(client: Client, config: &SentinelConfig) -> Self {
        Self {
            client,
            base_url: config.endpoints.forecast_url.clone(),
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch(&self, latitude: f64, longitude: f64) -> AtmosphereReading {
        match self.fetch_live(latitude, longitude).await {
            Ok(reading) => {
                debug!(
                    "Atmosphere: {} / {}",
                    reading.format_pressure(),
                    reading.format_wind()
                );
                reading
            }
            Err(e) => {
                warn!("Forecast unavailable, using standard pressure: {:#}", e);
                AtmosphereReading::fallback()
            }
        }
    }

    async fn fetch_live(&self, latitude: f64, longitude: f64) -> Result<AtmosphereReading> {
        let url = format!(
            "{}?latitude={}&longitude={}&current_weather=true&hourly=surface_pressure",
            self.base_url, latitude, longitude
        );
        debug!("OpenMeteo API request URL: {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let forecast: openmeteo::ForecastResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse OpenMeteo forecast response")?;

        forecast.into_reading()
    }
}

/// Parse a raw forecast payload into a reading
pub fn parse_forecast(body: &str) -> Result<AtmosphereReading> {
    let forecast: openmeteo::ForecastResponse =
        serde_json::from_str(body).with_context(|| "Failed to parse OpenMeteo forecast response")?;
    forecast.into_reading()
}

/// `OpenMeteo` API response structures and conversion utilities
mod openmeteo {
    use super::{AtmosphereReading, Result, anyhow};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub hourly: HourlyData,
        pub current_weather: Option<CurrentWeather>,
    }

    #[derive(Debug, Deserialize)]
    pub struct HourlyData {
        pub surface_pressure: Vec<Option<f64>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentWeather {
        pub windspeed: Option<f64>,
    }

    impl ForecastResponse {
        /// The most recent pressure is the last non-null hourly value
        pub fn into_reading(self) -> Result<AtmosphereReading> {
            let pressure = self
                .hourly
                .surface_pressure
                .iter()
                .rev()
                .find_map(|p| *p)
                .ok_or_else(|| anyhow!("No surface pressure values in forecast"))?;

            let wind_speed = self
                .current_weather
                .and_then(|current| current.windspeed)
                .unwrap_or(0.0);

            Ok(AtmosphereReading::live(pressure, wind_speed))
        }
    }
}
