#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate statistics record for a set of road-matched collisions.
//!
//! Every histogram is created with its full key set up front, so a bucket
//! with no collisions is present with a zero count instead of missing.

use std::collections::BTreeMap;

use collision_map_collision_models::{DayOfWeek, LightCondition, Severity, WeatherCondition};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Counts keyed by an ordered category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Histogram<K: Ord> {
    counts: BTreeMap<K, u64>,
}

impl<K: Ord> Default for Histogram<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> Histogram<K> {
    /// Creates a histogram with every key present at zero.
    #[must_use]
    pub fn with_keys(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            counts: keys.into_iter().map(|k| (k, 0)).collect(),
        }
    }

    /// Adds one to `key`, creating the bucket if needed.
    pub fn increment(&mut self, key: K) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    #[must_use]
    pub fn count(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Sum over all buckets.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Share of `denominator` that falls in `key`, as a percentage.
    ///
    /// Returns 0 when `denominator` is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self, key: &K, denominator: u64) -> f64 {
        if denominator == 0 {
            return 0.0;
        }
        self.count(key) as f64 / denominator as f64 * 100.0
    }

    /// The bucket with the highest non-zero count, earliest key on ties.
    #[must_use]
    pub fn mode(&self) -> Option<&K> {
        let mut best: Option<(&K, u64)> = None;
        for (key, &count) in &self.counts {
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((key, count));
            }
        }
        best.map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(k, &c)| (k, c))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.counts.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Coarse part of the day used for time-of-day breakdowns.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeBand {
    /// 00:00-06:59
    Night,
    /// 07:00-09:59
    MorningRush,
    /// 10:00-15:59
    Midday,
    /// 16:00-18:59
    EveningRush,
    /// 19:00-23:59
    Evening,
}

impl TimeBand {
    /// Band containing `hour`, or `None` if the hour is not 0-23.
    #[must_use]
    pub const fn from_hour(hour: u8) -> Option<Self> {
        match hour {
            0..=6 => Some(Self::Night),
            7..=9 => Some(Self::MorningRush),
            10..=15 => Some(Self::Midday),
            16..=18 => Some(Self::EveningRush),
            19..=23 => Some(Self::Evening),
            _ => None,
        }
    }

    /// Inclusive `(first, last)` hours of the band.
    #[must_use]
    pub const fn hours(self) -> (u8, u8) {
        match self {
            Self::Night => (0, 6),
            Self::MorningRush => (7, 9),
            Self::Midday => (10, 15),
            Self::EveningRush => (16, 18),
            Self::Evening => (19, 23),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Night => "Night (00-06)",
            Self::MorningRush => "Morning Rush (07-09)",
            Self::Midday => "Midday (10-15)",
            Self::EveningRush => "Evening Rush (16-18)",
            Self::Evening => "Evening (19-23)",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Night,
            Self::MorningRush,
            Self::Midday,
            Self::EveningRush,
            Self::Evening,
        ]
    }
}

/// Distribution of event-to-road distances.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceSummary {
    /// Number of finite distances summarised.
    pub count: u64,
    pub min_m: Option<f64>,
    pub max_m: Option<f64>,
    pub mean_m: Option<f64>,
}

/// Aggregate statistics over a matched collision set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionStatistics {
    pub total_collisions: u64,
    pub total_casualties: u64,
    pub total_vehicles: u64,
    /// Zero when there are no collisions.
    pub avg_casualties_per_collision: f64,
    pub severity: Histogram<Severity>,
    /// Keys 0-23.
    pub hour_of_day: Histogram<u8>,
    /// Collisions with a usable time of day.
    pub timed_collisions: u64,
    /// Busiest hour, earliest on ties.
    pub peak_hour: Option<u8>,
    pub time_bands: Histogram<TimeBand>,
    pub day_of_week: Histogram<DayOfWeek>,
    pub weather: Histogram<WeatherCondition>,
    pub light: Histogram<LightCondition>,
    /// Keyed by posted limit in mph; only limits that occur are present.
    pub speed_limit: Histogram<u16>,
    pub distance: DistanceSummary,
}

impl Default for CollisionStatistics {
    fn default() -> Self {
        Self::empty()
    }
}

impl CollisionStatistics {
    /// Zeroed record with every categorical key present.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total_collisions: 0,
            total_casualties: 0,
            total_vehicles: 0,
            avg_casualties_per_collision: 0.0,
            severity: Histogram::with_keys(Severity::all().iter().copied()),
            hour_of_day: Histogram::with_keys(0..=23),
            timed_collisions: 0,
            peak_hour: None,
            time_bands: Histogram::with_keys(TimeBand::all().iter().copied()),
            day_of_week: Histogram::with_keys(DayOfWeek::all().iter().copied()),
            weather: Histogram::with_keys(WeatherCondition::all().iter().copied()),
            light: Histogram::with_keys(LightCondition::all().iter().copied()),
            speed_limit: Histogram::default(),
            distance: DistanceSummary::default(),
        }
    }

    /// Percentage of all collisions with the given severity.
    #[must_use]
    pub fn severity_percentage(&self, severity: Severity) -> f64 {
        self.severity.percentage(&severity, self.total_collisions)
    }

    /// Percentage of all collisions in the given time band.
    #[must_use]
    pub fn time_band_percentage(&self, band: TimeBand) -> f64 {
        self.time_bands.percentage(&band, self.total_collisions)
    }

    #[must_use]
    pub fn most_common_day(&self) -> Option<DayOfWeek> {
        self.day_of_week.mode().copied()
    }

    #[must_use]
    pub fn most_common_weather(&self) -> Option<WeatherCondition> {
        self.weather.mode().copied()
    }

    #[must_use]
    pub fn most_common_light(&self) -> Option<LightCondition> {
        self.light.mode().copied()
    }
}

/// One matched collision flattened for tabular export.
///
/// Each categorical column is paired with its human-readable `*_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub collision_id: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_to_road_m: f64,
    pub chainage_m: f64,
    pub severity: Severity,
    pub severity_name: String,
    pub vehicles: u32,
    pub casualties: u32,
    pub speed_limit: Option<u16>,
    pub weather: WeatherCondition,
    pub weather_name: String,
    pub light: LightCondition,
    pub light_name: String,
    pub day_of_week: Option<DayOfWeek>,
    pub day_name: Option<String>,
    pub hour: Option<u8>,
    pub time_band_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_statistics_cover_every_key() {
        let stats = CollisionStatistics::empty();
        assert_eq!(stats.severity.len(), 4);
        assert_eq!(stats.hour_of_day.len(), 24);
        assert_eq!(stats.time_bands.len(), 5);
        assert_eq!(stats.day_of_week.len(), 7);
        assert_eq!(stats.weather.len(), WeatherCondition::all().len());
        assert_eq!(stats.light.len(), LightCondition::all().len());
        assert_eq!(stats.severity.total(), 0);
        assert_eq!(stats.most_common_day(), None);
    }

    #[test]
    fn empty_statistics_serialize_zero_buckets() {
        let json = serde_json::to_value(CollisionStatistics::empty()).unwrap();
        assert_eq!(json["severity"]["FATAL"], 0);
        assert_eq!(json["severity"]["UNKNOWN"], 0);
        assert_eq!(json["hourOfDay"]["23"], 0);
        assert_eq!(json["timeBands"]["EVENING_RUSH"], 0);
        assert!(json["peakHour"].is_null());
    }

    #[test]
    fn mode_prefers_earliest_key_on_ties() {
        let mut h = Histogram::with_keys(0..=3u8);
        h.increment(2);
        h.increment(1);
        assert_eq!(h.mode(), Some(&1));
        h.increment(2);
        assert_eq!(h.mode(), Some(&2));
    }

    #[test]
    fn percentage_handles_zero_denominator() {
        let mut h = Histogram::with_keys([Severity::Fatal]);
        assert!(h.percentage(&Severity::Fatal, 0).abs() < f64::EPSILON);
        h.increment(Severity::Fatal);
        assert!((h.percentage(&Severity::Fatal, 4) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn condition_accessors_pick_busiest_bucket() {
        let mut stats = CollisionStatistics::empty();
        assert_eq!(stats.most_common_weather(), None);
        assert_eq!(stats.most_common_light(), None);

        stats.total_collisions = 4;
        for weather in [
            WeatherCondition::RainingNoHighWinds,
            WeatherCondition::FineNoHighWinds,
            WeatherCondition::RainingNoHighWinds,
            WeatherCondition::FogOrMist,
        ] {
            stats.weather.increment(weather);
        }
        for light in [
            LightCondition::DarknessLightsLit,
            LightCondition::Daylight,
            LightCondition::DarknessLightsLit,
            LightCondition::Daylight,
        ] {
            stats.light.increment(light);
        }

        assert_eq!(
            stats.most_common_weather(),
            Some(WeatherCondition::RainingNoHighWinds)
        );
        // Tie between daylight and lit darkness goes to the earlier variant.
        assert_eq!(stats.most_common_light(), Some(LightCondition::Daylight));
    }

    #[test]
    fn time_band_percentage_is_share_of_all_collisions() {
        let mut stats = CollisionStatistics::empty();
        assert!(stats.time_band_percentage(TimeBand::Night).abs() < f64::EPSILON);

        stats.total_collisions = 8;
        stats.time_bands.increment(TimeBand::EveningRush);
        stats.time_bands.increment(TimeBand::EveningRush);
        stats.time_bands.increment(TimeBand::Night);

        assert!((stats.time_band_percentage(TimeBand::EveningRush) - 25.0).abs() < 1e-9);
        assert!((stats.time_band_percentage(TimeBand::Night) - 12.5).abs() < 1e-9);
        assert!(stats.time_band_percentage(TimeBand::Midday).abs() < f64::EPSILON);
    }

    #[test]
    fn time_bands_partition_the_day() {
        for hour in 0..=23u8 {
            let band = TimeBand::from_hour(hour).unwrap();
            let (first, last) = band.hours();
            assert!((first..=last).contains(&hour));
        }
        assert_eq!(TimeBand::from_hour(24), None);
        assert_eq!(TimeBand::from_hour(7), Some(TimeBand::MorningRush));
        assert_eq!(TimeBand::from_hour(18), Some(TimeBand::EveningRush));
    }
}
