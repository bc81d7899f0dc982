//! Analytics configuration.
//!
//! Thresholds and the rating scale live here so the engines never hardcode
//! them. A TOML file may set any subset of the keys; the rest keep their
//! defaults.
//!
//! ```toml
//! min_sample_size = 10
//! min_series_size = 5
//! min_pairs = 20
//! similar_limit = 10
//!
//! [rating_scale]
//! min = 0.5
//! max = 5.0
//! step = 0.5
//! ```

use data_loader::RatingScale;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    pub rating_scale: RatingScale,
    /// Minimum ratings per genre (polarisation) or per user (bias)
    pub min_sample_size: usize,
    /// Minimum ratings behind one (user, genre) average
    pub min_series_size: usize,
    /// Minimum joined users behind a correlation
    pub min_pairs: usize,
    /// Similar films returned when the caller names no limit
    pub similar_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            rating_scale: RatingScale::HALF_STARS,
            min_sample_size: 10,
            min_series_size: 5,
            min_pairs: 20,
            similar_limit: 10,
        }
    }
}

impl AnalyticsConfig {
    /// Load from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scale = &self.rating_scale;
        if !(scale.min.is_finite() && scale.max.is_finite() && scale.min < scale.max) {
            return Err(ConfigError::Invalid(format!(
                "rating scale bounds must be ordered, got {}..{}",
                scale.min, scale.max
            )));
        }
        if !(scale.step > 0.0 && scale.step <= scale.max - scale.min) {
            return Err(ConfigError::Invalid(format!(
                "rating scale step must be positive and fit the range, got {}",
                scale.step
            )));
        }
        if self.min_series_size == 0 {
            return Err(ConfigError::Invalid(
                "min_series_size must be at least 1".to_string(),
            ));
        }
        if self.min_pairs < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_pairs must be at least 2, got {}",
                self.min_pairs
            )));
        }
        if self.similar_limit == 0 {
            return Err(ConfigError::Invalid(
                "similar_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
