//! Tipos de dados para a API de previsão do tempo.
//!
//! [`ForecastResponse`] espelha o formato JSON do endpoint `/forecast`;
//! [`WeatherSnapshot`] é a visão reduzida usada pelo restante do bot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair, written `lat,lon`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| format!("expected `lat,lon`, got `{s}`"))?;
        let latitude: f64 = lat
            .trim()
            .parse()
            .map_err(|_| format!("invalid latitude `{}`", lat.trim()))?;
        let longitude: f64 = lon
            .trim()
            .parse()
            .map_err(|_| format!("invalid longitude `{}`", lon.trim()))?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(format!("coordinate `{s}` out of range"));
        }
        Ok(Self::new(latitude, longitude))
    }
}

impl TryFrom<String> for Coordinate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coordinate> for String {
    fn from(value: Coordinate) -> Self {
        value.to_string()
    }
}

/// The weather at one place and time, as shown in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Condition summary, e.g. "Partly Cloudy".
    pub summary: String,
    /// Degrees Fahrenheit.
    pub temperature: f64,
    /// Fraction of sky covered, in `[0, 1]`.
    pub cloud_cover: f64,
}

/// Resposta do endpoint `/forecast`. Apenas o bloco `currently` é usado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub currently: Currently,
}

/// Condições no instante solicitado.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currently {
    pub summary: String,
    pub temperature: f64,
    #[serde(default)]
    pub cloud_cover: f64,
}

impl From<Currently> for WeatherSnapshot {
    fn from(c: Currently) -> Self {
        Self {
            summary: c.summary,
            temperature: c.temperature,
            cloud_cover: c.cloud_cover.clamp(0.0, 1.0),
        }
    }
}
