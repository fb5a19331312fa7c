//! Regras de agendamento e localidades, carregadas de `schedule.toml`.
//!
//! O catálogo é a fonte externa de [`ScheduleRule`]s e [`Location`]s.
//! A implementação [`FileCatalog`] lê um arquivo TOML; outras fontes
//! podem implementar [`RuleSource`] e [`LocationSource`].

use std::future::Future;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::ForecastError;
use crate::schedule::ScheduleRule;
use crate::weather::Coordinate;

/// A place the report covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Ordering key assigned by whoever maintains the catalog.
    pub id: i64,
    pub name: String,
    pub timezone: Tz,
    pub coordinate: Coordinate,
    /// The time of interest the forecast is requested for.
    pub time: DateTime<Utc>,
}

pub trait RuleSource {
    /// All rules, sorted by ascending start.
    fn rules(&self) -> impl Future<Output = Result<Vec<ScheduleRule>, ForecastError>> + Send;
}

pub trait LocationSource {
    /// Locations in presentation order.
    fn locations(&self) -> impl Future<Output = Result<Vec<Location>, ForecastError>> + Send;
}

/// Entrada de localidade como escrita no arquivo.
#[derive(Debug, Deserialize)]
struct RawLocation {
    id: i64,
    name: String,
    timezone: String,
    geo: Coordinate,
    time: DateTime<Utc>,
}

impl TryFrom<RawLocation> for Location {
    type Error = ForecastError;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        let timezone: Tz = raw.timezone.parse().map_err(|_| {
            ForecastError::Catalog(format!(
                "unknown time zone `{}` for location `{}`",
                raw.timezone, raw.name
            ))
        })?;
        Ok(Self {
            id: raw.id,
            name: raw.name,
            timezone,
            coordinate: raw.geo,
            time: raw.time,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    rules: Vec<ScheduleRule>,
    #[serde(default)]
    locations: Vec<RawLocation>,
}

/// Catálogo lido de um arquivo TOML a cada chamada.
pub struct FileCatalog {
    path: PathBuf,
    max_locations: usize,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>, max_locations: usize) -> Self {
        Self {
            path: path.into(),
            max_locations,
        }
    }

    async fn load(&self) -> Result<CatalogFile, ForecastError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ForecastError::Catalog(format!("failed to read {}: {e}", self.path.display()))
        })?;
        parse_catalog(&contents)
    }
}

fn parse_catalog(contents: &str) -> Result<CatalogFile, ForecastError> {
    toml::from_str(contents).map_err(|e| ForecastError::Catalog(e.to_string()))
}

fn sorted_rules(file: CatalogFile) -> Vec<ScheduleRule> {
    let mut rules = file.rules;
    rules.sort_by_key(|rule| rule.start);
    rules
}

fn sorted_locations(file: CatalogFile, max: usize) -> Result<Vec<Location>, ForecastError> {
    let mut locations = file
        .locations
        .into_iter()
        .map(Location::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    locations.sort_by_key(|location| location.id);
    locations.truncate(max);
    Ok(locations)
}

impl RuleSource for FileCatalog {
    async fn rules(&self) -> Result<Vec<ScheduleRule>, ForecastError> {
        Ok(sorted_rules(self.load().await?))
    }
}

impl LocationSource for FileCatalog {
    async fn locations(&self) -> Result<Vec<Location>, ForecastError> {
        sorted_locations(self.load().await?, self.max_locations)
    }
}
