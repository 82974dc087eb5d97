#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road measurement and linear-referenced sampling.
//!
//! Turns a [`RoadGeometry`] into evenly spaced [`SamplePoint`]s along its
//! great-circle length. Road geometry comes from caller-supplied
//! coordinates, the predefined registry in [`fetch`], or any
//! [`fetch::RoadFetcher`] implementation.

pub mod cache;
pub mod fetch;
pub mod geodesy;
pub mod sampler;

pub use cache::RoadLengthCache;
pub use collision_map_road_models::{
    InvalidGeometryError, InvalidParameterError, RoadGeometry, RoadOrigin, RoadSummary,
    SamplePoint,
};
pub use fetch::{FetchError, RoadFetcher};
pub use geodesy::road_length;
pub use sampler::{RoadSampler, sample};

/// Errors that can occur while sampling a road.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    /// The road is degenerate.
    #[error("Invalid geometry: {0}")]
    Geometry(#[from] InvalidGeometryError),

    /// The sampling interval is out of range.
    #[error("Invalid parameter: {0}")]
    Parameter(#[from] InvalidParameterError),
}
