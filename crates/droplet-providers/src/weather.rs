//! OpenWeatherMap client
//!
//! Thin wrapper over the current-weather endpoint, reshaping the provider's
//! response into the temperature/humidity pair the agents work with.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A current-weather observation, reshaped from the provider response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: DateTime<Utc>,
}

/// OpenWeatherMap API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Mask the API key in debug output
        let masked_key = if self.api_key.len() > 7 {
            format!(
                "{}...{}",
                &self.api_key[..3],
                &self.api_key[self.api_key.len() - 4..]
            )
        } else {
            "***".to_string()
        };

        f.debug_struct("WeatherClient")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &masked_key)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Wire shape of the fields we read from the provider response.
#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: WeatherMain,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
    humidity: f64,
}

impl WeatherClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: "https://api.openweathermap.org".to_string(),
        }
    }

    /// Set a custom base URL (e.g. for a stub server in tests)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Fetch current weather for a coordinate pair, in metric units.
    pub async fn current(&self, lat: f64, lon: f64) -> Result<Observation> {
        let url = format!("{}/data/2.5/weather", self.base_url.trim_end_matches('/'));

        debug!("Fetching current weather for ({}, {})", lat, lon);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .context("Failed to reach weather provider")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "Weather request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let body: WeatherResponse = response
            .json()
            .await
            .context("Failed to parse weather provider response")?;

        Ok(Observation {
            temperature: body.main.temp,
            humidity: body.main.humidity,
            timestamp: Utc::now(),
        })
    }
}
