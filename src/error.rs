use thiserror::Error;

use crate::channel::ChannelError;
use crate::schedule::Phase;
use crate::weather::WeatherError;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("Weather fetch failed for {location}: {source}")]
    Aggregation {
        location: String,
        #[source]
        source: WeatherError,
    },

    #[error("Publish error: {0}")]
    Publish(ChannelError),

    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("State error: {0}")]
    State(#[from] StoreError),

    /// The post went out but its timestamp could not be saved, so a retry
    /// would publish it again.
    #[error("Patch error: {patch}; post was published but not recorded: {source}")]
    PostNotRecorded {
        patch: PatchError,
        #[source]
        source: StoreError,
    },

    #[error("Catalog error: {0}")]
    Catalog(String),
}

/// A rule expression that could not be turned into a trigger.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("malformed rule expression `{0}`")]
    Malformed(String),

    #[error("invalid interval `{0}`: hours must be a finite, non-negative number")]
    InvalidInterval(String),
}

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("managed region header not found")]
    MissingHeader,

    #[error("managed region trailer not found after header")]
    MissingTrailer,

    #[error("panel target error: {0}")]
    Target(#[from] ChannelError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The single failure reported for a run, tagged with the phase that failed.
#[derive(Debug, Error)]
#[error("run failed during {phase}: {error}")]
pub struct RunFailure {
    pub phase: Phase,
    #[source]
    pub error: ForecastError,
}

impl RunFailure {
    pub fn new(phase: Phase, error: impl Into<ForecastError>) -> Self {
        Self {
            phase,
            error: error.into(),
        }
    }
}
