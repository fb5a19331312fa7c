use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;

use super::WeatherSource;
use super::error::WeatherError;
use super::types::{Coordinate, ForecastResponse, WeatherSnapshot};

/// HTTP client for a Dark Sky style `/forecast/{key}/{lat},{lon},{time}` API.
pub struct ForecastClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl ForecastClient {
    pub fn with_base_url(api_key: String, base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            api_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Request URL for one observation. The instant is truncated to whole
    /// seconds and sent as UTC.
    pub fn forecast_url(&self, at: Coordinate, time: DateTime<Utc>) -> String {
        format!(
            "{}/forecast/{}/{},{}Z",
            self.base_url,
            self.api_key,
            at,
            time.format("%Y-%m-%dT%H:%M:%S")
        )
    }

    pub async fn fetch(
        &self,
        at: Coordinate,
        time: DateTime<Utc>,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let url = self.forecast_url(at, time);
        tracing::debug!(coordinate = %at, %time, "fetching forecast");

        let response = self
            .client
            .get(&url)
            .query(&[("exclude", "daily,hourly")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(WeatherError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: ForecastResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Malformed(e.to_string()))?;
        Ok(parsed.currently.into())
    }
}

impl WeatherSource for ForecastClient {
    async fn observe(
        &self,
        at: Coordinate,
        time: DateTime<Utc>,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch(at, time).await
    }
}
