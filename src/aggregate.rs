//! Concurrent per-location weather fetch.

use futures::future::try_join_all;

use crate::catalog::Location;
use crate::error::ForecastError;
use crate::weather::{WeatherSnapshot, WeatherSource};

/// A location merged with the weather observed for its time of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub location: Location,
    pub weather: WeatherSnapshot,
}

/// Fetch one observation per location, all at once.
///
/// Results keep the input order. The first failure aborts the whole batch and
/// the remaining in-flight requests are dropped, so callers never see a
/// partial set of records.
pub async fn aggregate(
    source: &impl WeatherSource,
    locations: Vec<Location>,
) -> Result<Vec<LocationRecord>, ForecastError> {
    let fetches = locations.into_iter().map(|location| async move {
        let weather = source
            .observe(location.coordinate, location.time)
            .await
            .map_err(|err| {
                tracing::warn!(location = %location.name, error = %err, "weather fetch failed");
                ForecastError::Aggregation {
                    location: location.name.clone(),
                    source: err,
                }
            })?;
        Ok::<_, ForecastError>(LocationRecord { location, weather })
    });

    let records = try_join_all(fetches).await?;
    tracing::debug!(count = records.len(), "aggregated weather");
    Ok(records)
}
