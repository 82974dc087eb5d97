#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road geometry and linear-referencing types.
//!
//! A [`RoadGeometry`] is always an ordered polyline of at least two finite
//! WGS84 vertices that do not all coincide; the invariant is checked once at
//! construction so downstream code never re-validates it. [`SamplePoint`]s
//! are the evenly spaced reference points derived from a road.

use geo::{BoundingRect, Coord, LineString, Point, Rect};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Error returned when a road polyline cannot be used for analysis.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidGeometryError {
    /// Fewer than two vertices were supplied.
    #[error("road has fewer than 2 points (got {count})")]
    TooFewPoints {
        /// Number of vertices supplied.
        count: usize,
    },

    /// A vertex has a NaN or infinite component.
    #[error("road vertex {index} is not finite")]
    NonFiniteVertex {
        /// Position of the offending vertex.
        index: usize,
    },

    /// A vertex lies outside the WGS84 longitude/latitude range.
    #[error("road vertex {index} ({longitude}, {latitude}) is outside WGS84 bounds")]
    OutOfRange {
        /// Position of the offending vertex.
        index: usize,
        /// Vertex longitude.
        longitude: f64,
        /// Vertex latitude.
        latitude: f64,
    },

    /// Every vertex is at the same location, or the total length is zero.
    #[error("road collapses to a single point")]
    Collapsed,
}

/// Error returned when a numeric analysis parameter is out of range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidParameterError {
    /// The parameter must be a finite value greater than zero.
    #[error("{name} must be positive (got {value})")]
    NotPositive {
        /// Parameter name (e.g. `"interval_m"`).
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A required input collection is empty.
    #[error("{name} must not be empty")]
    Empty {
        /// Parameter name (e.g. `"samples"`).
        name: &'static str,
    },
}

impl InvalidParameterError {
    /// Returns `value` if it is finite and strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidParameterError::NotPositive`] naming `name` otherwise.
    pub fn require_positive(name: &'static str, value: f64) -> Result<f64, Self> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(Self::NotPositive { name, value })
        }
    }
}

/// An ordered polyline of `(longitude, latitude)` vertices.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadGeometry {
    line: LineString<f64>,
}

impl RoadGeometry {
    /// Builds a road from its vertices.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidGeometryError`] if there are fewer than two
    /// vertices, any vertex is non-finite or out of range, or all vertices
    /// coincide.
    pub fn new(coords: Vec<Coord<f64>>) -> Result<Self, InvalidGeometryError> {
        if coords.len() < 2 {
            return Err(InvalidGeometryError::TooFewPoints {
                count: coords.len(),
            });
        }

        for (index, c) in coords.iter().enumerate() {
            if !c.x.is_finite() || !c.y.is_finite() {
                return Err(InvalidGeometryError::NonFiniteVertex { index });
            }
            if !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y) {
                return Err(InvalidGeometryError::OutOfRange {
                    index,
                    longitude: c.x,
                    latitude: c.y,
                });
            }
        }

        let first = coords[0];
        if coords.iter().all(|c| *c == first) {
            return Err(InvalidGeometryError::Collapsed);
        }

        Ok(Self {
            line: LineString::new(coords),
        })
    }

    /// Builds a road from `(longitude, latitude)` pairs.
    ///
    /// # Errors
    ///
    /// See [`RoadGeometry::new`].
    pub fn from_lon_lat(pairs: &[(f64, f64)]) -> Result<Self, InvalidGeometryError> {
        Self::new(pairs.iter().map(|&(x, y)| Coord { x, y }).collect())
    }

    /// Builds a road from an existing line string.
    ///
    /// # Errors
    ///
    /// See [`RoadGeometry::new`].
    pub fn from_line_string(line: LineString<f64>) -> Result<Self, InvalidGeometryError> {
        Self::new(line.0)
    }

    #[must_use]
    pub const fn line(&self) -> &LineString<f64> {
        &self.line
    }

    #[must_use]
    pub fn coords(&self) -> &[Coord<f64>] {
        &self.line.0
    }

    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.line.0.len()
    }

    #[must_use]
    pub fn first(&self) -> Coord<f64> {
        self.line.0[0]
    }

    #[must_use]
    pub fn last(&self) -> Coord<f64> {
        self.line.0[self.line.0.len() - 1]
    }

    /// Bounding rectangle in degrees.
    #[must_use]
    pub fn bounding_rect(&self) -> Rect<f64> {
        // Construction guarantees at least two vertices.
        self.line
            .bounding_rect()
            .unwrap_or_else(|| Rect::new(self.first(), self.first()))
    }

    /// Content fingerprint identifying this road for caching purposes.
    ///
    /// Two roads share a fingerprint exactly when their vertex sequences
    /// are bit-for-bit identical.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for c in &self.line.0 {
            hasher.update(c.x.to_bits().to_le_bytes());
            hasher.update(c.y.to_bits().to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// A reference point at a fixed distance along a road.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplePoint {
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Great-circle distance from the road start, following the road.
    pub cumulative_distance_m: f64,
    /// Position in the sample sequence, starting at 0.
    pub index: usize,
}

impl SamplePoint {
    #[must_use]
    pub const fn point(&self) -> Point<f64> {
        Point(Coord {
            x: self.longitude,
            y: self.latitude,
        })
    }
}

/// Where a road's geometry came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RoadOrigin {
    /// Coordinates supplied directly by the caller.
    Manual,
    /// A named road from the built-in registry.
    Predefined {
        /// Registry key (e.g. `"askew_road"`).
        name: String,
    },
    /// Geometry obtained through a road fetcher.
    Fetched {
        /// Area searched (e.g. `"Hammersmith and Fulham, London, UK"`).
        area: String,
        /// Street name.
        street: String,
        /// Number of raw segments the fetcher returned.
        segments: usize,
    },
}

/// Summary of a road sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadSummary {
    pub road_length_m: f64,
    pub num_sample_points: usize,
    pub distance_interval_m: f64,
    pub num_road_coords: usize,
    pub origin: RoadOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_few_points() {
        assert_eq!(
            RoadGeometry::from_lon_lat(&[]),
            Err(InvalidGeometryError::TooFewPoints { count: 0 })
        );
        assert_eq!(
            RoadGeometry::from_lon_lat(&[(-0.23, 51.5)]),
            Err(InvalidGeometryError::TooFewPoints { count: 1 })
        );
    }

    #[test]
    fn rejects_collapsed_road() {
        let err = RoadGeometry::from_lon_lat(&[(-0.23, 51.5), (-0.23, 51.5), (-0.23, 51.5)])
            .unwrap_err();
        assert_eq!(err, InvalidGeometryError::Collapsed);
        assert_eq!(err.to_string(), "road collapses to a single point");
    }

    #[test]
    fn rejects_non_finite_and_out_of_range_vertices() {
        assert_eq!(
            RoadGeometry::from_lon_lat(&[(-0.23, 51.5), (f64::NAN, 51.5)]),
            Err(InvalidGeometryError::NonFiniteVertex { index: 1 })
        );
        assert!(matches!(
            RoadGeometry::from_lon_lat(&[(-0.23, 51.5), (-0.23, 91.0)]),
            Err(InvalidGeometryError::OutOfRange { index: 1, .. })
        ));
    }

    #[test]
    fn error_messages_name_the_failed_precondition() {
        let err = RoadGeometry::from_lon_lat(&[(-0.23, 51.5)]).unwrap_err();
        assert_eq!(err.to_string(), "road has fewer than 2 points (got 1)");

        let err = InvalidParameterError::require_positive("interval_m", 0.0).unwrap_err();
        assert_eq!(err.to_string(), "interval_m must be positive (got 0)");
    }

    #[test]
    fn require_positive_rejects_nan_and_negative() {
        assert!(InvalidParameterError::require_positive("radius_m", f64::NAN).is_err());
        assert!(InvalidParameterError::require_positive("radius_m", -5.0).is_err());
        assert!(InvalidParameterError::require_positive("radius_m", f64::INFINITY).is_err());
        assert_eq!(
            InvalidParameterError::require_positive("radius_m", 50.0),
            Ok(50.0)
        );
    }

    #[test]
    fn fingerprint_tracks_vertex_content() {
        let a = RoadGeometry::from_lon_lat(&[(-0.2328, 51.5180), (-0.2320, 51.5182)]).unwrap();
        let b = RoadGeometry::from_lon_lat(&[(-0.2328, 51.5180), (-0.2320, 51.5182)]).unwrap();
        let c = RoadGeometry::from_lon_lat(&[(-0.2320, 51.5182), (-0.2328, 51.5180)]).unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn bounding_rect_covers_all_vertices() {
        let road =
            RoadGeometry::from_lon_lat(&[(-0.2328, 51.5180), (-0.2200, 51.5206), (-0.2250, 51.5100)])
                .unwrap();
        let rect = road.bounding_rect();
        assert!((rect.min().x - -0.2328).abs() < f64::EPSILON);
        assert!((rect.max().x - -0.2200).abs() < f64::EPSILON);
        assert!((rect.min().y - 51.5100).abs() < f64::EPSILON);
        assert!((rect.max().y - 51.5206).abs() < f64::EPSILON);
    }
}
