//! Error types.
//!
//! Scoring never fails; errors only come from loading calibration files and
//! from decoding requests that cross the C ABI.

use thiserror::Error;

use crate::calibration::LightingCondition;
use crate::mission::RocketType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("calibration: {0}")]
    Config(#[from] ConfigError),
    #[error("request: {0}")]
    Request(#[from] RequestError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("weights sum to {0}, expected 1.0")]
    WeightSum(f64),
    #[error("max visible distance for {rocket:?} in {lighting:?} must be positive, got {km}")]
    MaxDistance {
        lighting: LightingCondition,
        rocket: RocketType,
        km: f64,
    },
    #[error("{field} for {rocket:?} must be positive, got {seconds} s")]
    Timing {
        rocket: RocketType,
        field: &'static str,
        seconds: i64,
    },
    #[error("threshold {name} must be finite, got {value}")]
    Threshold { name: &'static str, value: f64 },
    #[error("default site '{0}' is not in the site list")]
    UnknownDefaultSite(String),
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("null pointer passed for {0}")]
    NullPointer(&'static str),
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
    #[error("malformed request JSON: {0}")]
    Json(#[from] serde_json::Error),
}
