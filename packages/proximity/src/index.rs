//! R-tree pre-filter over road segments and sample points.
//!
//! Each entry's envelope is its bounding box widened by an angular margin
//! large enough that any position within the search radius of the entry is
//! inside the widened box. Querying the tree with an event's position
//! therefore never drops an entry that could be within the radius; exact
//! distances are computed only for the returned candidates.

use collision_map_road::geodesy::{EARTH_RADIUS_M, METERS_PER_DEGREE};
use collision_map_road_models::{RoadGeometry, SamplePoint};
use geo::Coord;
use rstar::{AABB, RTree, RTreeObject};

/// Slack on the margins so radius rounding never excludes a true match.
const MARGIN_SAFETY: f64 = 1.001;

/// Longitude/latitude margins in degrees covering `radius_m` around any
/// point whose latitude lies in `[min_lat, max_lat]`.
///
/// The latitude margin follows from the meridian arc bound. For longitude,
/// two points with latitude magnitude at most `φ` and longitude difference
/// `Δλ` are at least `R·cos φ·sin Δλ` apart (chord of the equatorial
/// projection), so beyond `asin(r / (R·cos φ))` nothing can match. Near the
/// poles, or for radii comparable to the Earth, longitude is not filtered.
#[must_use]
pub fn search_margins(radius_m: f64, min_lat: f64, max_lat: f64) -> (f64, f64) {
    let dlat = radius_m / METERS_PER_DEGREE * MARGIN_SAFETY;

    let max_abs_lat = min_lat.abs().max(max_lat.abs()) + dlat;
    if max_abs_lat >= 90.0 {
        return (360.0, dlat);
    }

    let ratio = radius_m / (EARTH_RADIUS_M * max_abs_lat.to_radians().cos()) * MARGIN_SAFETY;
    if ratio >= 1.0 {
        return (360.0, dlat);
    }

    (ratio.asin().to_degrees(), dlat)
}

fn widened_envelope(a: Coord<f64>, b: Coord<f64>, radius_m: f64) -> AABB<[f64; 2]> {
    let (min_lat, max_lat) = (a.y.min(b.y), a.y.max(b.y));
    let (dlon, dlat) = search_margins(radius_m, min_lat, max_lat);
    AABB::from_corners(
        [a.x.min(b.x) - dlon, min_lat - dlat],
        [a.x.max(b.x) + dlon, max_lat + dlat],
    )
}

/// A road segment stored in the R-tree with its linear-referencing data.
#[derive(Debug, Clone)]
pub struct SegmentEntry {
    pub index: usize,
    pub start: Coord<f64>,
    pub end: Coord<f64>,
    /// Distance along the road at `start`.
    pub start_chainage_m: f64,
    pub length_m: f64,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// A sample point stored in the R-tree.
#[derive(Debug, Clone)]
pub struct SampleEntry {
    /// Position in the sample slice.
    pub index: usize,
    pub position: Coord<f64>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for SampleEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Builds the segment tree for `road` at the given search radius.
#[must_use]
pub fn build_segment_tree(road: &RoadGeometry, radius_m: f64) -> RTree<SegmentEntry> {
    let lengths = collision_map_road::geodesy::segment_lengths(road);
    let mut chainage = 0.0;

    let entries: Vec<SegmentEntry> = road
        .coords()
        .windows(2)
        .zip(lengths)
        .enumerate()
        .map(|(index, (w, length_m))| {
            let entry = SegmentEntry {
                index,
                start: w[0],
                end: w[1],
                start_chainage_m: chainage,
                length_m,
                envelope: widened_envelope(w[0], w[1], radius_m),
            };
            chainage += length_m;
            entry
        })
        .collect();

    RTree::bulk_load(entries)
}

/// Builds the sample tree at the given search radius.
#[must_use]
pub fn build_sample_tree(samples: &[SamplePoint], radius_m: f64) -> RTree<SampleEntry> {
    let entries: Vec<SampleEntry> = samples
        .iter()
        .enumerate()
        .map(|(index, s)| {
            let position = s.point().0;
            SampleEntry {
                index,
                position,
                envelope: widened_envelope(position, position, radius_m),
            }
        })
        .collect();

    RTree::bulk_load(entries)
}

/// Zero-area query envelope at a position.
#[must_use]
pub fn query_point(position: Coord<f64>) -> AABB<[f64; 2]> {
    AABB::from_point([position.x, position.y])
}
