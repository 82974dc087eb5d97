#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Proximity matching of collisions against a sampled road.
//!
//! Builds R-tree indexes over the road's segments and sample points, then
//! for each collision finds its great-circle distance to the road and keeps
//! it if that distance is within the search radius. One
//! [`DistanceStrategy`] is fixed per [`ProximityMatcher`], so every event in
//! a run is measured the same way.

pub mod index;

use std::collections::BTreeSet;

use collision_map_collision_models::{CollisionEvent, MalformedEventError, MatchedEvent};
use collision_map_road::geodesy::{haversine_m, project_onto_segment};
use collision_map_road_models::{InvalidParameterError, RoadGeometry, SamplePoint};
use geo::Coord;
use rstar::RTree;
use serde::{Deserialize, Serialize};

use crate::index::{SampleEntry, SegmentEntry, build_sample_tree, build_segment_tree, query_point};

/// How the distance from a collision to the road is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceStrategy {
    /// True point-to-polyline distance: the collision is projected onto
    /// every nearby segment and clamped to its endpoints.
    #[default]
    Polyline,
    /// Distance to the closest sample point. Overestimates slightly midway
    /// between samples.
    NearestSample,
}

/// A collision excluded from matching because its record is unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEvent {
    pub id: String,
    pub reason: MalformedEventError,
}

/// Result of matching a batch of collisions against a road.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// Collisions within the radius, in input order.
    pub matched: Vec<MatchedEvent>,
    /// Collisions with missing or unusable positions.
    pub skipped: Vec<SkippedEvent>,
    /// Records ignored because an earlier record had the same id.
    pub duplicates: usize,
}

impl MatchOutcome {
    /// Number of records excluded as malformed.
    #[must_use]
    pub fn malformed_count(&self) -> usize {
        self.skipped.len()
    }

    #[must_use]
    pub fn matched_ids(&self) -> BTreeSet<&str> {
        self.matched.iter().map(|m| m.event.id.as_str()).collect()
    }
}

/// Where a position meets the road.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadHit {
    pub distance_m: f64,
    /// Distance along the road of the nearest road position.
    pub chainage_m: f64,
    pub nearest_sample_index: usize,
}

/// Matches positions to one road at one radius.
pub struct ProximityMatcher<'a> {
    samples: &'a [SamplePoint],
    radius_m: f64,
    strategy: DistanceStrategy,
    segments: RTree<SegmentEntry>,
    sample_tree: RTree<SampleEntry>,
}

impl<'a> ProximityMatcher<'a> {
    /// Indexes the road and its samples for the given radius.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidParameterError`] if `radius_m` is not a finite
    /// positive number or `samples` is empty.
    pub fn new(
        road: &RoadGeometry,
        samples: &'a [SamplePoint],
        radius_m: f64,
        strategy: DistanceStrategy,
    ) -> Result<Self, InvalidParameterError> {
        let radius_m = InvalidParameterError::require_positive("radius_m", radius_m)?;
        if samples.is_empty() {
            return Err(InvalidParameterError::Empty { name: "samples" });
        }

        let (segments, sample_tree) = match strategy {
            DistanceStrategy::Polyline => (build_segment_tree(road, radius_m), RTree::new()),
            DistanceStrategy::NearestSample => {
                (RTree::new(), build_sample_tree(samples, radius_m))
            }
        };

        Ok(Self {
            samples,
            radius_m,
            strategy,
            segments,
            sample_tree,
        })
    }

    #[must_use]
    pub const fn radius_m(&self) -> f64 {
        self.radius_m
    }

    #[must_use]
    pub const fn strategy(&self) -> DistanceStrategy {
        self.strategy
    }

    /// Locates a position relative to the road.
    ///
    /// Returns `None` when the position is farther than the radius.
    #[must_use]
    pub fn locate(&self, position: Coord<f64>) -> Option<RoadHit> {
        let hit = match self.strategy {
            DistanceStrategy::Polyline => self.locate_on_polyline(position),
            DistanceStrategy::NearestSample => self.locate_nearest_sample(position),
        }?;

        (hit.distance_m <= self.radius_m).then_some(hit)
    }

    fn locate_on_polyline(&self, position: Coord<f64>) -> Option<RoadHit> {
        let mut best: Option<(f64, usize, f64)> = None;

        for segment in self
            .segments
            .locate_in_envelope_intersecting(&query_point(position))
        {
            let proj = project_onto_segment(position, segment.start, segment.end);
            let chainage = proj.t.mul_add(segment.length_m, segment.start_chainage_m);
            let candidate = (proj.distance_m, segment.index, chainage);

            best = match best {
                Some(current) if !is_closer(candidate.0, candidate.1, current.0, current.1) => {
                    Some(current)
                }
                _ => Some(candidate),
            };
        }

        best.map(|(distance_m, _, chainage_m)| RoadHit {
            distance_m,
            chainage_m,
            nearest_sample_index: self.sample_at_chainage(chainage_m),
        })
    }

    fn locate_nearest_sample(&self, position: Coord<f64>) -> Option<RoadHit> {
        let mut best: Option<(f64, usize)> = None;

        for sample in self
            .sample_tree
            .locate_in_envelope_intersecting(&query_point(position))
        {
            let candidate = (haversine_m(position, sample.position), sample.index);

            best = match best {
                Some(current) if !is_closer(candidate.0, candidate.1, current.0, current.1) => {
                    Some(current)
                }
                _ => Some(candidate),
            };
        }

        best.map(|(distance_m, index)| RoadHit {
            distance_m,
            chainage_m: self.samples[index].cumulative_distance_m,
            nearest_sample_index: index,
        })
    }

    /// Index of the sample whose cumulative distance is closest to
    /// `chainage_m`; ties go to the lower index.
    #[must_use]
    pub fn sample_at_chainage(&self, chainage_m: f64) -> usize {
        let after = self
            .samples
            .partition_point(|s| s.cumulative_distance_m < chainage_m);

        if after == 0 {
            return 0;
        }
        if after == self.samples.len() {
            return self.samples.len() - 1;
        }

        let before = after - 1;
        let gap_before = chainage_m - self.samples[before].cumulative_distance_m;
        let gap_after = self.samples[after].cumulative_distance_m - chainage_m;
        if gap_after < gap_before { after } else { before }
    }

    /// Matches a batch of collisions.
    ///
    /// Each id is considered once (first occurrence wins). Records with a
    /// missing or unusable position are reported in
    /// [`MatchOutcome::skipped`] and never abort the batch.
    #[must_use]
    pub fn match_events(&self, events: &[CollisionEvent]) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        let mut seen: BTreeSet<&str> = BTreeSet::new();

        for event in events {
            if !seen.insert(event.id.as_str()) {
                log::warn!("Ignoring duplicate collision id {}", event.id);
                outcome.duplicates += 1;
                continue;
            }

            let (longitude, latitude) = match event.position() {
                Ok(position) => position,
                Err(reason) => {
                    log::debug!("Skipping collision {}: {reason}", event.id);
                    outcome.skipped.push(SkippedEvent {
                        id: event.id.clone(),
                        reason,
                    });
                    continue;
                }
            };

            if let Some(hit) = self.locate(Coord {
                x: longitude,
                y: latitude,
            }) {
                outcome.matched.push(MatchedEvent {
                    event: event.clone(),
                    distance_to_road_m: hit.distance_m,
                    nearest_sample_index: hit.nearest_sample_index,
                    chainage_m: hit.chainage_m,
                });
            }
        }

        if !outcome.skipped.is_empty() {
            log::warn!(
                "Skipped {} collisions with missing or invalid positions",
                outcome.skipped.len()
            );
        }
        log::info!(
            "Matched {} of {} collisions within {} m",
            outcome.matched.len(),
            events.len(),
            self.radius_m
        );

        outcome
    }
}

fn is_closer(distance: f64, index: usize, best_distance: f64, best_index: usize) -> bool {
    distance < best_distance || (distance.total_cmp(&best_distance).is_eq() && index < best_index)
}

/// Matches collisions against a road in one call.
///
/// # Errors
///
/// Returns [`InvalidParameterError`] if `radius_m` is not a finite positive
/// number or `samples` is empty.
pub fn match_events(
    events: &[CollisionEvent],
    road: &RoadGeometry,
    samples: &[SamplePoint],
    radius_m: f64,
    strategy: DistanceStrategy,
) -> Result<MatchOutcome, InvalidParameterError> {
    Ok(ProximityMatcher::new(road, samples, radius_m, strategy)?.match_events(events))
}

#[cfg(test)]
mod tests {
    use collision_map_collision_models::Severity;
    use collision_map_road::geodesy::METERS_PER_DEGREE;
    use collision_map_road::fetch::predefined_road;
    use collision_map_road::sample;

    use super::*;

    fn event(id: &str, longitude: f64, latitude: f64) -> CollisionEvent {
        CollisionEvent {
            id: id.to_string(),
            longitude: Some(longitude),
            latitude: Some(latitude),
            date: Some("14/03/2023".to_string()),
            time: Some("08:30".to_string()),
            severity: Severity::Slight,
            vehicle_count: 2,
            casualty_count: 1,
            day_of_week_code: 3,
            weather_code: 1,
            light_code: 1,
            speed_limit: Some(30),
        }
    }

    fn deg(metres: f64) -> f64 {
        metres / METERS_PER_DEGREE
    }

    /// Two-point road along the equator, 500 m long.
    fn equator_road() -> (RoadGeometry, Vec<SamplePoint>) {
        let road = RoadGeometry::from_lon_lat(&[(0.0, 0.0), (deg(500.0), 0.0)]).unwrap();
        let samples = sample(&road, 50.0).unwrap();
        (road, samples)
    }

    /// A deterministic scatter of collisions around Askew Road.
    fn scatter() -> Vec<CollisionEvent> {
        let mut events = Vec::new();
        for i in 0..40 {
            for j in 0..15 {
                let lon = -0.2335 + f64::from(i) * 0.00042;
                let lat = 51.5165 + f64::from(j) * 0.00037;
                events.push(event(&format!("c{i}-{j}"), lon, lat));
            }
        }
        events
    }

    #[test]
    fn includes_event_just_inside_radius() {
        let (road, samples) = equator_road();
        let events = vec![
            event("inside", deg(250.0), deg(49.0)),
            event("outside", deg(250.0), deg(51.0)),
        ];

        for strategy in [DistanceStrategy::Polyline, DistanceStrategy::NearestSample] {
            let outcome = match_events(&events, &road, &samples, 50.0, strategy).unwrap();
            assert_eq!(outcome.matched.len(), 1, "{strategy:?}");

            let m = &outcome.matched[0];
            assert_eq!(m.event.id, "inside");
            assert!((m.distance_to_road_m - 49.0).abs() < 0.01, "{strategy:?}");
            assert_eq!(m.nearest_sample_index, 5);
        }
    }

    #[test]
    fn records_chainage_and_nearest_sample() {
        let (road, samples) = equator_road();
        let events = vec![event("a", deg(130.0), deg(10.0))];

        let outcome =
            match_events(&events, &road, &samples, 50.0, DistanceStrategy::Polyline).unwrap();
        let m = &outcome.matched[0];
        assert!((m.chainage_m - 130.0).abs() < 0.01);
        assert!((m.distance_to_road_m - 10.0).abs() < 0.01);
        assert_eq!(m.nearest_sample_index, 3);
    }

    #[test]
    fn clamps_to_road_ends() {
        let (road, samples) = equator_road();
        let events = vec![
            event("before", deg(-30.0), 0.0),
            event("after", deg(540.0), 0.0),
        ];

        let outcome =
            match_events(&events, &road, &samples, 50.0, DistanceStrategy::Polyline).unwrap();
        assert_eq!(outcome.matched.len(), 2);
        assert!((outcome.matched[0].distance_to_road_m - 30.0).abs() < 0.01);
        assert_eq!(outcome.matched[0].nearest_sample_index, 0);
        assert!((outcome.matched[1].distance_to_road_m - 40.0).abs() < 0.01);
        assert_eq!(outcome.matched[1].nearest_sample_index, samples.len() - 1);
    }

    #[test]
    fn matched_sets_grow_with_radius() {
        let road = predefined_road("askew_road").unwrap();
        let samples = sample(&road, 50.0).unwrap();
        let events = scatter();

        for strategy in [DistanceStrategy::Polyline, DistanceStrategy::NearestSample] {
            let mut previous: Option<BTreeSet<String>> = None;
            for radius in [5.0, 20.0, 50.0, 120.0, 400.0] {
                let outcome = match_events(&events, &road, &samples, radius, strategy).unwrap();
                let ids: BTreeSet<String> = outcome
                    .matched
                    .iter()
                    .map(|m| m.event.id.clone())
                    .collect();

                for m in &outcome.matched {
                    assert!(m.distance_to_road_m <= radius);
                }
                if let Some(prev) = &previous {
                    assert!(prev.is_subset(&ids), "{strategy:?} at {radius} m");
                }
                previous = Some(ids);
            }
        }
    }

    #[test]
    fn prefilter_agrees_with_exhaustive_search() {
        let road = predefined_road("askew_road").unwrap();
        let samples = sample(&road, 50.0).unwrap();
        let events = scatter();
        let radius = 60.0;

        let outcome =
            match_events(&events, &road, &samples, radius, DistanceStrategy::Polyline).unwrap();

        let expected: Vec<&str> = events
            .iter()
            .filter(|e| {
                let p = Coord {
                    x: e.longitude.unwrap(),
                    y: e.latitude.unwrap(),
                };
                road.coords()
                    .windows(2)
                    .map(|w| project_onto_segment(p, w[0], w[1]).distance_m)
                    .fold(f64::INFINITY, f64::min)
                    <= radius
            })
            .map(|e| e.id.as_str())
            .collect();

        let actual: Vec<&str> = outcome.matched.iter().map(|m| m.event.id.as_str()).collect();
        assert!(!expected.is_empty());
        assert_eq!(actual, expected);
    }

    #[test]
    fn each_id_matches_once() {
        let (road, samples) = equator_road();
        let events = vec![
            event("dup", deg(100.0), deg(5.0)),
            event("dup", deg(300.0), deg(5.0)),
            event("other", deg(200.0), deg(5.0)),
        ];

        let outcome =
            match_events(&events, &road, &samples, 50.0, DistanceStrategy::NearestSample).unwrap();
        assert_eq!(outcome.matched.len(), 2);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(outcome.matched_ids().len(), outcome.matched.len());
        assert!((outcome.matched[0].chainage_m - 100.0).abs() < 0.01);
    }

    #[test]
    fn malformed_positions_are_counted_not_fatal() {
        let (road, samples) = equator_road();
        let mut missing = event("missing", 0.0, 0.0);
        missing.latitude = None;
        let events = vec![
            missing,
            event("nan", f64::NAN, 0.0),
            event("bad-lat", 0.0, 123.0),
            event("good", deg(250.0), deg(1.0)),
        ];

        let outcome =
            match_events(&events, &road, &samples, 50.0, DistanceStrategy::Polyline).unwrap();
        assert_eq!(outcome.malformed_count(), 3);
        assert_eq!(outcome.skipped[0].reason, MalformedEventError::MissingPosition);
        assert_eq!(outcome.matched.len(), 1);
        assert_eq!(outcome.matched[0].event.id, "good");
    }

    #[test]
    fn output_follows_input_order() {
        let (road, samples) = equator_road();
        let events = vec![
            event("z", deg(400.0), deg(3.0)),
            event("a", deg(10.0), deg(3.0)),
            event("m", deg(250.0), deg(3.0)),
        ];

        let first =
            match_events(&events, &road, &samples, 50.0, DistanceStrategy::Polyline).unwrap();
        let second =
            match_events(&events, &road, &samples, 50.0, DistanceStrategy::Polyline).unwrap();

        let ids: Vec<&str> = first.matched.iter().map(|m| m.event.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_invalid_radius_and_empty_samples() {
        let (road, samples) = equator_road();
        for bad in [0.0, -5.0, f64::NAN] {
            let err = match_events(&[], &road, &samples, bad, DistanceStrategy::Polyline)
                .unwrap_err();
            assert!(err.to_string().starts_with("radius_m must be positive"));
        }

        let err = match_events(&[], &road, &[], 50.0, DistanceStrategy::Polyline).unwrap_err();
        assert_eq!(err, InvalidParameterError::Empty { name: "samples" });
    }
}
