//! Great-circle measurement helpers shared by the sampler and the matcher.
//!
//! Distances are haversine distances on a sphere of mean Earth radius.
//! Positions between two vertices are found by linearly blending longitude
//! and latitude, which is accurate to well under a metre over segments of a
//! few hundred metres. Roads crossing the antimeridian are not supported.

use collision_map_road_models::RoadGeometry;
use geo::{Coord, Distance, Haversine, Point};

/// Mean Earth radius in metres (IUGG), the radius `geo`'s haversine uses.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Metres per degree of arc along a great circle.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Haversine distance between two coordinates, in metres.
#[must_use]
pub fn haversine_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Linear blend of two coordinates, `t` in `[0, 1]`.
#[must_use]
pub fn lerp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord {
        x: (b.x - a.x).mul_add(t, a.x),
        y: (b.y - a.y).mul_add(t, a.y),
    }
}

/// Haversine length of every segment of the road, in vertex order.
#[must_use]
pub fn segment_lengths(road: &RoadGeometry) -> Vec<f64> {
    road.coords()
        .windows(2)
        .map(|w| haversine_m(w[0], w[1]))
        .collect()
}

/// Total great-circle length of the road in metres.
///
/// This is the same total [`crate::sampler::sample`] walks, so the last
/// sample's cumulative distance always equals it.
#[must_use]
pub fn road_length(road: &RoadGeometry) -> f64 {
    segment_lengths(road).iter().sum()
}

/// Where a point lands when dropped onto a single segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Fraction along the segment, clamped to `[0, 1]`.
    pub t: f64,
    /// The projected position on the segment.
    pub foot: Coord<f64>,
    /// Haversine distance from the point to `foot`.
    pub distance_m: f64,
}

/// Projects `p` onto the segment `a`→`b`.
///
/// The perpendicular foot is found in a local equirectangular frame centred
/// on the segment's mean latitude, then clamped to the segment endpoints.
/// The reported distance is the haversine distance to that foot.
#[must_use]
pub fn project_onto_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> SegmentProjection {
    let cos_lat = f64::midpoint(a.y, b.y).to_radians().cos();

    let bx = (b.x - a.x) * cos_lat;
    let by = b.y - a.y;
    let px = (p.x - a.x) * cos_lat;
    let py = p.y - a.y;

    let len2 = bx.mul_add(bx, by * by);
    let t = if len2 > 0.0 {
        (px.mul_add(bx, py * by) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let foot = lerp(a, b, t);

    SegmentProjection {
        t,
        foot,
        distance_m: haversine_m(p, foot),
    }
}
