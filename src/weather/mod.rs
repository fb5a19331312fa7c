pub mod client;
pub mod error;
pub mod types;

use std::future::Future;

use chrono::{DateTime, Utc};

pub use client::ForecastClient;
pub use error::WeatherError;
pub use types::{Coordinate, WeatherSnapshot};

/// Anything that can report the weather at a place and instant.
pub trait WeatherSource {
    fn observe(
        &self,
        at: Coordinate,
        time: DateTime<Utc>,
    ) -> impl Future<Output = Result<WeatherSnapshot, WeatherError>> + Send;
}
