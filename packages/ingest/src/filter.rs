//! Pre-match narrowing of a collision set by area, date and severity.

use chrono::NaiveDate;
use collision_map_collision_models::{CollisionEvent, Severity};
use serde::{Deserialize, Serialize};

/// Inclusive longitude/latitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&longitude)
            && (self.min_lat..=self.max_lat).contains(&latitude)
    }
}

/// Criteria a collision must meet to be considered at all.
///
/// Unset criteria accept everything. Collisions without a usable position
/// pass the area check untouched so the matcher can report them as
/// malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionFilter {
    pub bounds: Option<BoundingBox>,
    /// First date kept, inclusive.
    pub date_from: Option<NaiveDate>,
    /// Last date kept, inclusive.
    pub date_to: Option<NaiveDate>,
    /// Severities kept; empty keeps every severity.
    pub severities: Vec<Severity>,
}

/// Collisions that survived a filter and how many did not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub kept: Vec<CollisionEvent>,
    pub filtered_out: usize,
}

impl CollisionFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.severities.is_empty()
    }

    /// Whether a single collision meets every criterion.
    ///
    /// With a date bound set, a collision whose date cannot be parsed is
    /// rejected.
    #[must_use]
    pub fn accepts(&self, event: &CollisionEvent) -> bool {
        if !self.severities.is_empty() && !self.severities.contains(&event.severity) {
            return false;
        }

        if let Some(bounds) = &self.bounds
            && let Ok((longitude, latitude)) = event.position()
            && !bounds.contains(longitude, latitude)
        {
            return false;
        }

        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(date) = event.occurred_on() else {
                return false;
            };
            if self.date_from.is_some_and(|from| date < from)
                || self.date_to.is_some_and(|to| date > to)
            {
                return false;
            }
        }

        true
    }

    /// Splits `events` into those kept and a count of those dropped.
    #[must_use]
    pub fn apply(&self, events: Vec<CollisionEvent>) -> FilterOutcome {
        if self.is_empty() {
            return FilterOutcome {
                kept: events,
                filtered_out: 0,
            };
        }

        let total = events.len();
        let kept: Vec<CollisionEvent> = events.into_iter().filter(|e| self.accepts(e)).collect();
        let filtered_out = total - kept.len();

        log::info!("Filter kept {} of {total} collisions", kept.len());

        FilterOutcome { kept, filtered_out }
    }
}
