#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics engine for collisions matched to a road.
//!
//! [`summarize`] reduces a matched set to a [`CollisionStatistics`] record
//! and [`export_rows`] flattens it into date-ordered rows. Both are pure
//! functions of their input; nothing is cached between calls.

use std::cmp::Ordering;

pub use collision_map_analytics_models::{
    CollisionStatistics, DistanceSummary, ExportRow, Histogram, TimeBand,
};
use collision_map_collision_models::MatchedEvent;

/// Computes aggregate statistics over a matched collision set.
///
/// Events with a missing or malformed time still count towards every
/// non-temporal breakdown. The weekday comes from the recorded code, or
/// the parsed date when the code is invalid; events with neither are left
/// out of the weekday histogram only.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(matched: &[MatchedEvent]) -> CollisionStatistics {
    let mut stats = CollisionStatistics::empty();
    let mut distance_sum = 0.0;

    for m in matched {
        let event = &m.event;

        stats.total_collisions += 1;
        stats.total_casualties += u64::from(event.casualty_count);
        stats.total_vehicles += u64::from(event.vehicle_count);
        stats.severity.increment(event.severity);

        if let Some(hour) = event.hour() {
            stats.hour_of_day.increment(hour);
            stats.timed_collisions += 1;
            if let Some(band) = TimeBand::from_hour(hour) {
                stats.time_bands.increment(band);
            }
        } else {
            log::debug!("Collision {} has no usable time of day", event.id);
        }

        if let Some(day) = event.day_of_week() {
            stats.day_of_week.increment(day);
        }
        stats.weather.increment(event.weather());
        stats.light.increment(event.light());
        if let Some(limit) = event.speed_limit {
            stats.speed_limit.increment(limit);
        }

        let d = m.distance_to_road_m;
        if d.is_finite() {
            let summary = &mut stats.distance;
            summary.count += 1;
            summary.min_m = Some(summary.min_m.map_or(d, |v| v.min(d)));
            summary.max_m = Some(summary.max_m.map_or(d, |v| v.max(d)));
            distance_sum += d;
        }
    }

    if stats.total_collisions > 0 {
        stats.avg_casualties_per_collision =
            stats.total_casualties as f64 / stats.total_collisions as f64;
    }
    if stats.distance.count > 0 {
        stats.distance.mean_m = Some(distance_sum / stats.distance.count as f64);
    }

    stats.peak_hour = stats.hour_of_day.mode().copied();

    log::info!(
        "Summarized {} collisions ({} casualties)",
        stats.total_collisions,
        stats.total_casualties
    );

    stats
}

/// Flattens a matched set into rows ordered by date.
///
/// Categorical columns carry their human-readable labels alongside the
/// enum values.
/// Rows whose date cannot be parsed sort after every dated row; ties are
/// broken by collision id.
#[must_use]
pub fn export_rows(matched: &[MatchedEvent]) -> Vec<ExportRow> {
    let mut keyed: Vec<_> = matched
        .iter()
        .map(|m| {
            let event = &m.event;
            let (weather, light) = (event.weather(), event.light());
            let day_of_week = event.day_of_week();
            let hour = event.hour();
            let row = ExportRow {
                collision_id: event.id.clone(),
                date: event.date.clone(),
                time: event.time.clone(),
                latitude: event.latitude,
                longitude: event.longitude,
                distance_to_road_m: m.distance_to_road_m,
                chainage_m: m.chainage_m,
                severity: event.severity,
                severity_name: event.severity.label().to_string(),
                vehicles: event.vehicle_count,
                casualties: event.casualty_count,
                speed_limit: event.speed_limit,
                weather,
                weather_name: weather.label().to_string(),
                light,
                light_name: light.label().to_string(),
                day_of_week,
                day_name: day_of_week.map(|d| d.label().to_string()),
                hour,
                time_band_name: hour
                    .and_then(TimeBand::from_hour)
                    .map(|band| band.label().to_string()),
            };
            (event.occurred_on(), row)
        })
        .collect();

    keyed.sort_by(|(a_date, a), (b_date, b)| {
        let by_date = match (a_date, b_date) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_date.then_with(|| a.collision_id.cmp(&b.collision_id))
    });

    keyed.into_iter().map(|(_, row)| row).collect()
}
