//! TOML configuration for a single-road analysis run.
//!
//! ```toml
//! interval_m = 50.0
//! radius_m = 50.0
//! strategy = "polyline"
//!
//! [road]
//! kind = "predefined"
//! name = "Askew Road"
//! ```

use std::path::Path;

use collision_map_ingest::CollisionFilter;
use collision_map_proximity::DistanceStrategy;
use collision_map_road_models::InvalidParameterError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INTERVAL_M: f64 = 50.0;
pub const DEFAULT_RADIUS_M: f64 = 50.0;

const fn default_interval_m() -> f64 {
    DEFAULT_INTERVAL_M
}

const fn default_radius_m() -> f64 {
    DEFAULT_RADIUS_M
}

/// Errors that can occur while loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML is malformed or has the wrong shape.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A numeric field is out of range.
    #[error("Invalid parameter: {0}")]
    Parameter(#[from] InvalidParameterError),

    /// A field holds a value that cannot be used.
    #[error("Invalid value for `{field}`: {message}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Where the road geometry for a run comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoadSource {
    /// Explicit `[longitude, latitude]` vertices.
    Coordinates { coordinates: Vec<[f64; 2]> },
    /// A street looked up through a road fetcher.
    Named { area: String, street: String },
    /// A road from the built-in registry.
    Predefined { name: String },
}

/// Parameters for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Spacing between sample points along the road.
    #[serde(default = "default_interval_m")]
    pub interval_m: f64,
    /// Maximum distance from the road for a collision to count.
    #[serde(default = "default_radius_m")]
    pub radius_m: f64,
    #[serde(default)]
    pub strategy: DistanceStrategy,
    pub road: RoadSource,
    #[serde(default)]
    pub filter: Option<CollisionFilter>,
}

impl AnalysisConfig {
    /// Configuration with default parameters for the given road.
    #[must_use]
    pub fn new(road: RoadSource) -> Self {
        Self {
            interval_m: DEFAULT_INTERVAL_M,
            radius_m: DEFAULT_RADIUS_M,
            strategy: DistanceStrategy::default(),
            road,
            filter: None,
        }
    }

    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the TOML is malformed or a field fails
    /// [`AnalysisConfig::validate`].
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// See [`AnalysisConfig::from_toml`]; also fails if the file cannot be
    /// read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Reading analysis config from {}", path.display());
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Checks every field that deserialization alone cannot.
    ///
    /// Road coordinates are validated later, when the geometry is built.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first failing field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        InvalidParameterError::require_positive("interval_m", self.interval_m)?;
        InvalidParameterError::require_positive("radius_m", self.radius_m)?;

        match &self.road {
            RoadSource::Coordinates { .. } => {}
            RoadSource::Named { area, street } => {
                if area.trim().is_empty() {
                    return Err(InvalidParameterError::Empty { name: "road.area" }.into());
                }
                if street.trim().is_empty() {
                    return Err(InvalidParameterError::Empty {
                        name: "road.street",
                    }
                    .into());
                }
            }
            RoadSource::Predefined { name } => {
                if name.trim().is_empty() {
                    return Err(InvalidParameterError::Empty { name: "road.name" }.into());
                }
            }
        }

        if let Some(filter) = &self.filter
            && let (Some(from), Some(to)) = (filter.date_from, filter.date_to)
            && from > to
        {
            return Err(ConfigError::Invalid {
                field: "filter.date_from",
                message: format!("{from} is after filter.date_to {to}"),
            });
        }

        if let Some(bounds) = self.filter.as_ref().and_then(|f| f.bounds)
            && (bounds.min_lon > bounds.max_lon || bounds.min_lat > bounds.max_lat)
        {
            return Err(ConfigError::Invalid {
                field: "filter.bounds",
                message: "minimum exceeds maximum".to_string(),
            });
        }

        Ok(())
    }
}
