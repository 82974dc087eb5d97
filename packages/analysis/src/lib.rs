#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end collision analysis for one road.
//!
//! [`analyze`] resolves the configured road, samples it, filters and
//! matches the supplied collisions, and summarizes the matched set. Each
//! call is independent; the only state carried between calls is the
//! caller-owned [`RoadLengthCache`].

pub mod config;

use collision_map_analytics::summarize;
use collision_map_analytics_models::CollisionStatistics;
use collision_map_collision_models::{CollisionEvent, MatchedEvent};
use collision_map_proximity::{ProximityMatcher, SkippedEvent};
use collision_map_road::fetch::{predefined_key, predefined_road, resolve_fetched};
use collision_map_road::{
    FetchError, InvalidGeometryError, InvalidParameterError, RoadFetcher, RoadGeometry,
    RoadLengthCache, RoadOrigin, RoadSampler, RoadSummary, SampleError, SamplePoint,
};
use geo::Coord;
use serde::Serialize;

pub use config::{AnalysisConfig, ConfigError, RoadSource};

/// Errors that can occur while running an analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The configuration is invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The configured coordinates do not form a usable road.
    #[error("Invalid geometry: {0}")]
    Geometry(#[from] InvalidGeometryError),

    /// A numeric parameter is out of range.
    #[error("Invalid parameter: {0}")]
    Parameter(#[from] InvalidParameterError),

    /// Sampling the road failed.
    #[error("Sample error: {0}")]
    Sample(#[from] SampleError),

    /// Looking up the road failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A named road was requested but no road fetcher is available.
    #[error("No road fetcher available to look up '{street}' in '{area}'")]
    RoadUnavailable {
        /// Area requested.
        area: String,
        /// Street requested.
        street: String,
    },
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub road: RoadSummary,
    pub samples: Vec<SamplePoint>,
    /// Collisions within the radius, in input order.
    pub matched: Vec<MatchedEvent>,
    /// Collisions skipped for missing or invalid positions.
    pub malformed_count: usize,
    /// Collisions removed by the configured filter before matching.
    pub filtered_out: usize,
    /// Records ignored because an earlier record had the same id.
    pub duplicates: usize,
    pub statistics: CollisionStatistics,
    /// Matched collisions per sample point.
    pub collisions_per_sample_point: f64,
    #[serde(skip)]
    pub skipped: Vec<SkippedEvent>,
}

/// Resolves the configured road into geometry and its provenance.
///
/// # Errors
///
/// Returns [`AnalysisError::RoadUnavailable`] for a named road with no
/// `fetcher`, or the underlying geometry or lookup error.
pub fn resolve_road(
    source: &RoadSource,
    fetcher: Option<&dyn RoadFetcher>,
) -> Result<(RoadGeometry, RoadOrigin), AnalysisError> {
    match source {
        RoadSource::Coordinates { coordinates } => {
            let coords = coordinates.iter().map(|&[x, y]| Coord { x, y }).collect();
            Ok((RoadGeometry::new(coords)?, RoadOrigin::Manual))
        }
        RoadSource::Predefined { name } => Ok((
            predefined_road(name)?,
            RoadOrigin::Predefined {
                name: predefined_key(name),
            },
        )),
        RoadSource::Named { area, street } => {
            let Some(fetcher) = fetcher else {
                return Err(AnalysisError::RoadUnavailable {
                    area: area.clone(),
                    street: street.clone(),
                });
            };
            Ok(resolve_fetched(fetcher, area, street)?)
        }
    }
}

/// Runs a full analysis of `events` against the configured road.
///
/// Malformed collision records are counted, never fatal. The road length
/// is looked up in `cache` first and stored there when computed.
///
/// # Errors
///
/// Returns an [`AnalysisError`] if the configuration is invalid or the
/// road cannot be resolved or sampled.
pub fn analyze(
    config: &AnalysisConfig,
    events: Vec<CollisionEvent>,
    fetcher: Option<&dyn RoadFetcher>,
    cache: &mut RoadLengthCache,
) -> Result<AnalysisReport, AnalysisError> {
    config.validate()?;

    let (road, origin) = resolve_road(&config.road, fetcher)?;
    let sampler = RoadSampler::new(road, config.interval_m)?.with_origin(origin);
    let samples = sampler.sample_points()?;

    let road_summary = sampler.summary_for(&samples, cache.length(sampler.road()));
    log::info!(
        "Road length {:.1} m, {} sample points every {} m",
        road_summary.road_length_m,
        samples.len(),
        config.interval_m
    );

    let (events, filtered_out) = match &config.filter {
        Some(filter) => {
            let outcome = filter.apply(events);
            (outcome.kept, outcome.filtered_out)
        }
        None => (events, 0),
    };

    let outcome = {
        let matcher =
            ProximityMatcher::new(sampler.road(), &samples, config.radius_m, config.strategy)?;
        matcher.match_events(&events)
    };
    let statistics = summarize(&outcome.matched);

    #[allow(clippy::cast_precision_loss)]
    let collisions_per_sample_point = outcome.matched.len() as f64 / samples.len() as f64;

    Ok(AnalysisReport {
        road: road_summary,
        malformed_count: outcome.malformed_count(),
        filtered_out,
        duplicates: outcome.duplicates,
        statistics,
        collisions_per_sample_point,
        matched: outcome.matched,
        skipped: outcome.skipped,
        samples,
    })
}
