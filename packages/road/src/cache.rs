//! Caller-owned memoization of road lengths.
//!
//! Length computation is pure, so caching is optional. Callers analysing the
//! same road repeatedly (e.g. sweeping radii) keep a [`RoadLengthCache`]
//! alive across runs; nothing is cached implicitly.

use std::collections::BTreeMap;

use collision_map_road_models::RoadGeometry;

use crate::geodesy::road_length;

/// Road lengths keyed by [`RoadGeometry::fingerprint`].
#[derive(Debug, Default, Clone)]
pub struct RoadLengthCache {
    lengths: BTreeMap<String, f64>,
    hits: u64,
    misses: u64,
}

impl RoadLengthCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the road's length, computing and storing it on first use.
    pub fn length(&mut self, road: &RoadGeometry) -> f64 {
        let key = road.fingerprint();
        if let Some(length) = self.lengths.get(&key) {
            self.hits += 1;
            log::trace!("Road length cache hit for road {}", &key[..12]);
            return *length;
        }

        self.misses += 1;
        let length = road_length(road);
        log::debug!("Cached length {length:.1} m for road {}", &key[..12]);
        self.lengths.insert(key, length);
        length
    }

    /// Returns a cached length without computing it.
    #[must_use]
    pub fn get(&self, road: &RoadGeometry) -> Option<f64> {
        self.lengths.get(&road.fingerprint()).copied()
    }

    /// Drops the cached length for one road.
    pub fn invalidate(&mut self, road: &RoadGeometry) -> Option<f64> {
        self.lengths.remove(&road.fingerprint())
    }

    pub fn clear(&mut self) {
        self.lengths.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }
}
