//! Linear-referenced sampling of a road polyline.
//!
//! Walks the road accumulating great-circle distance and emits a
//! [`SamplePoint`] at every multiple of the interval, finishing with the exact
//! last vertex so the samples always span the full road length.

use collision_map_road_models::{
    InvalidGeometryError, InvalidParameterError, RoadGeometry, RoadOrigin, RoadSummary,
    SamplePoint,
};

use crate::SampleError;
use crate::geodesy::{lerp, segment_lengths};

/// A non-zero multiple of the interval this close to the road end is
/// represented by the endpoint alone, keeping cumulative distances strictly
/// increasing. The start sample is always emitted.
const ENDPOINT_TOLERANCE_M: f64 = 1e-6;

/// Samples `road` every `interval_m` metres.
///
/// Points are placed at 0, `interval_m`, 2·`interval_m`, … strictly below the
/// road length, followed by the last vertex at exactly the road length.
///
/// # Errors
///
/// * [`SampleError::Parameter`] if `interval_m` is not a finite positive number
/// * [`SampleError::Geometry`] if the road has zero length
#[allow(clippy::cast_precision_loss)]
pub fn sample(road: &RoadGeometry, interval_m: f64) -> Result<Vec<SamplePoint>, SampleError> {
    let interval_m = InvalidParameterError::require_positive("interval_m", interval_m)?;

    let lengths = segment_lengths(road);
    let total: f64 = lengths.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(InvalidGeometryError::Collapsed.into());
    }

    let coords = road.coords();
    let mut points = Vec::new();
    let mut segment = 0;
    let mut segment_start = 0.0;

    for step in 0_u64.. {
        let target = step as f64 * interval_m;
        if step > 0 && target >= total - ENDPOINT_TOLERANCE_M {
            break;
        }

        while segment + 1 < lengths.len() && segment_start + lengths[segment] < target {
            segment_start += lengths[segment];
            segment += 1;
        }

        let length = lengths[segment];
        let t = if length > 0.0 {
            ((target - segment_start) / length).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let c = lerp(coords[segment], coords[segment + 1], t);

        points.push(SamplePoint {
            longitude: c.x,
            latitude: c.y,
            cumulative_distance_m: target,
            index: points.len(),
        });
    }

    let end = road.last();
    points.push(SamplePoint {
        longitude: end.x,
        latitude: end.y,
        cumulative_distance_m: total,
        index: points.len(),
    });

    log::debug!(
        "Sampled {} points along {total:.1} m road at {interval_m} m intervals",
        points.len()
    );

    Ok(points)
}

/// A road paired with its sampling interval.
///
/// Holds no derived state; every call recomputes from the geometry, so
/// results are identical however often and in whatever order they are
/// requested.
#[derive(Debug, Clone)]
pub struct RoadSampler {
    road: RoadGeometry,
    interval_m: f64,
    origin: RoadOrigin,
}

impl RoadSampler {
    /// Creates a sampler for manually supplied geometry.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidParameterError`] if `interval_m` is not positive.
    pub fn new(road: RoadGeometry, interval_m: f64) -> Result<Self, InvalidParameterError> {
        Ok(Self {
            road,
            interval_m: InvalidParameterError::require_positive("interval_m", interval_m)?,
            origin: RoadOrigin::Manual,
        })
    }

    /// Records where the geometry came from, for [`RoadSampler::summary`].
    #[must_use]
    pub fn with_origin(mut self, origin: RoadOrigin) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub const fn road(&self) -> &RoadGeometry {
        &self.road
    }

    #[must_use]
    pub const fn interval_m(&self) -> f64 {
        self.interval_m
    }

    #[must_use]
    pub const fn origin(&self) -> &RoadOrigin {
        &self.origin
    }

    /// Road length in metres; the same total [`RoadSampler::sample_points`]
    /// ends on.
    #[must_use]
    pub fn length(&self) -> f64 {
        crate::geodesy::road_length(&self.road)
    }

    /// Generates the sample points.
    ///
    /// # Errors
    ///
    /// See [`sample`].
    pub fn sample_points(&self) -> Result<Vec<SamplePoint>, SampleError> {
        sample(&self.road, self.interval_m)
    }

    /// Summarizes the sampling run.
    ///
    /// # Errors
    ///
    /// See [`sample`].
    pub fn summary(&self) -> Result<RoadSummary, SampleError> {
        let samples = self.sample_points()?;
        Ok(self.summary_for(&samples, self.length()))
    }

    /// Summarizes the sampling run using already generated samples and a
    /// road length the caller already holds, e.g. from a
    /// [`crate::RoadLengthCache`].
    #[must_use]
    pub fn summary_for(&self, samples: &[SamplePoint], road_length_m: f64) -> RoadSummary {
        RoadSummary {
            road_length_m,
            num_sample_points: samples.len(),
            distance_interval_m: self.interval_m,
            num_road_coords: self.road.num_vertices(),
            origin: self.origin.clone(),
        }
    }
}
