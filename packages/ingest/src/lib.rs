#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loads road collision records from the national collision CSV export.
//!
//! Rows that cannot be decoded are counted and reported instead of
//! aborting the load; only I/O failures and a missing header row are
//! fatal. [`filter::CollisionFilter`] narrows a loaded set before
//! matching.

pub mod filter;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use collision_map_collision_models::{CollisionEvent, MalformedEventError, Severity};
use serde::Deserialize;

pub use filter::{BoundingBox, CollisionFilter, FilterOutcome};

/// Errors that can occur while loading collision data.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV stream itself is unreadable.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file has no header row.
    #[error("CSV file contains no header row")]
    MissingHeader,
}

/// Options controlling which rows a load keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Drop collisions that record no vehicles.
    pub filter_zero_vehicles: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            filter_zero_vehicles: true,
        }
    }
}

/// A row that could not be turned into a [`CollisionEvent`].
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 1-based line number in the source, when known.
    pub line: Option<u64>,
    pub error: MalformedEventError,
}

/// Result of loading a collision file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub events: Vec<CollisionEvent>,
    pub rejected: Vec<RejectedRow>,
    /// Rows dropped by [`LoadOptions::filter_zero_vehicles`].
    pub zero_vehicle_dropped: usize,
}

impl LoadOutcome {
    #[must_use]
    pub fn undecodable_count(&self) -> usize {
        self.rejected.len()
    }
}

/// One row of the collision export, as written.
///
/// Every column but the index is optional so partially filled rows still
/// decode; malformed positions are caught later by the matcher.
#[derive(Debug, Deserialize)]
struct CollisionRow {
    #[serde(alias = "accident_index")]
    collision_index: String,
    longitude: Option<f64>,
    latitude: Option<f64>,
    date: Option<String>,
    time: Option<String>,
    #[serde(alias = "accident_severity")]
    collision_severity: Option<i32>,
    number_of_vehicles: Option<u32>,
    number_of_casualties: Option<u32>,
    day_of_week: Option<i32>,
    weather_conditions: Option<i32>,
    light_conditions: Option<i32>,
    speed_limit: Option<i32>,
}

impl From<CollisionRow> for CollisionEvent {
    fn from(row: CollisionRow) -> Self {
        Self {
            id: row.collision_index.trim().to_string(),
            longitude: row.longitude,
            latitude: row.latitude,
            date: row.date.filter(|s| !s.trim().is_empty()),
            time: row.time.filter(|s| !s.trim().is_empty()),
            severity: row
                .collision_severity
                .map_or(Severity::Unknown, Severity::from_code),
            vehicle_count: row.number_of_vehicles.unwrap_or(0),
            casualty_count: row.number_of_casualties.unwrap_or(0),
            day_of_week_code: row.day_of_week.unwrap_or(-1),
            weather_code: row.weather_conditions.unwrap_or(-1),
            light_code: row.light_conditions.unwrap_or(-1),
            speed_limit: row.speed_limit.and_then(|v| u16::try_from(v).ok()),
        }
    }
}

/// Reads collision records from any CSV source.
///
/// # Errors
///
/// Returns an [`IngestError`] if the stream cannot be read or has no
/// header row. Individual undecodable rows are reported in
/// [`LoadOutcome::rejected`] instead.
pub fn load_collisions<R: Read>(
    source: R,
    options: LoadOptions,
) -> Result<LoadOutcome, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    if reader.headers()?.is_empty() {
        return Err(IngestError::MissingHeader);
    }

    let mut outcome = LoadOutcome::default();

    for result in reader.deserialize::<CollisionRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                let line = e.position().map(csv::Position::line);
                log::warn!("Skipping undecodable collision row: {e}");
                outcome.rejected.push(RejectedRow {
                    line,
                    error: MalformedEventError::Undecodable {
                        message: e.to_string(),
                    },
                });
                continue;
            }
        };

        let event = CollisionEvent::from(row);
        if options.filter_zero_vehicles && event.vehicle_count == 0 {
            log::debug!("Dropping collision {} with no vehicles", event.id);
            outcome.zero_vehicle_dropped += 1;
            continue;
        }

        outcome.events.push(event);
    }

    log::info!(
        "Loaded {} collisions ({} undecodable, {} without vehicles)",
        outcome.events.len(),
        outcome.rejected.len(),
        outcome.zero_vehicle_dropped
    );

    Ok(outcome)
}

/// Reads collision records from a CSV file on disk.
///
/// # Errors
///
/// See [`load_collisions`]; also fails if the file cannot be opened.
pub fn load_collisions_from_path(
    path: impl AsRef<Path>,
    options: LoadOptions,
) -> Result<LoadOutcome, IngestError> {
    let path = path.as_ref();
    log::info!("Loading collisions from {}", path.display());
    let file = File::open(path)?;
    load_collisions(file, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "collision_index,longitude,latitude,date,time,collision_severity,number_of_vehicles,number_of_casualties,day_of_week,weather_conditions,light_conditions,speed_limit\n";

    fn load(body: &str, options: LoadOptions) -> LoadOutcome {
        load_collisions(format!("{HEADER}{body}").as_bytes(), options).unwrap()
    }

    #[test]
    fn decodes_a_full_row() {
        let outcome = load(
            "2023010001,-0.2300,51.5186,14/03/2023,17:42,2,2,1,3,1,4,30\n",
            LoadOptions::default(),
        );
        assert_eq!(outcome.events.len(), 1);

        let event = &outcome.events[0];
        assert_eq!(event.id, "2023010001");
        assert_eq!(event.longitude, Some(-0.23));
        assert_eq!(event.severity, Severity::Serious);
        assert_eq!(event.vehicle_count, 2);
        assert_eq!(event.casualty_count, 1);
        assert_eq!(event.day_of_week_code, 3);
        assert_eq!(event.light_code, 4);
        assert_eq!(event.speed_limit, Some(30));
        assert_eq!(event.hour(), Some(17));
    }

    #[test]
    fn missing_position_still_loads() {
        let outcome = load(
            "2023010002,,,14/03/2023,08:00,3,1,1,3,1,1,20\n",
            LoadOptions::default(),
        );
        assert_eq!(outcome.events.len(), 1);
        assert!(outcome.events[0].position().is_err());
        assert_eq!(outcome.undecodable_count(), 0);
    }

    #[test]
    fn undecodable_rows_are_counted_not_fatal() {
        let outcome = load(
            "a,-0.23,51.5,14/03/2023,08:00,3,1,1,3,1,1,20\n\
             b,west,51.5,14/03/2023,08:00,3,1,1,3,1,1,20\n\
             c,-0.23,51.5,14/03/2023,08:00,3,1,1,3,1,1,20\n",
            LoadOptions::default(),
        );
        let ids: Vec<&str> = outcome.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(outcome.undecodable_count(), 1);
        assert_eq!(outcome.rejected[0].line, Some(3));
        assert!(matches!(
            outcome.rejected[0].error,
            MalformedEventError::Undecodable { .. }
        ));
    }

    #[test]
    fn zero_vehicle_rows_dropped_only_when_requested() {
        let body = "a,-0.23,51.5,14/03/2023,08:00,3,0,1,3,1,1,20\n\
                    b,-0.23,51.5,14/03/2023,08:00,3,2,1,3,1,1,20\n";

        let filtered = load(body, LoadOptions::default());
        assert_eq!(filtered.events.len(), 1);
        assert_eq!(filtered.zero_vehicle_dropped, 1);

        let kept = load(
            body,
            LoadOptions {
                filter_zero_vehicles: false,
            },
        );
        assert_eq!(kept.events.len(), 2);
        assert_eq!(kept.zero_vehicle_dropped, 0);
    }

    #[test]
    fn unknown_codes_and_negative_speed_limit() {
        let outcome = load("a,-0.23,51.5,,,7,1,0,,,,-1\n", LoadOptions::default());
        let event = &outcome.events[0];
        assert_eq!(event.severity, Severity::Unknown);
        assert_eq!(event.speed_limit, None);
        assert_eq!(event.date, None);
        assert_eq!(event.day_of_week_code, -1);
    }

    #[test]
    fn accepts_legacy_column_names() {
        let csv = "accident_index,longitude,latitude,accident_severity,number_of_vehicles\n\
                   L1,-0.23,51.5,1,2\n";
        let outcome = load_collisions(csv.as_bytes(), LoadOptions::default()).unwrap();
        assert_eq!(outcome.events[0].id, "L1");
        assert_eq!(outcome.events[0].severity, Severity::Fatal);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_collisions_from_path("/nonexistent/collisions.csv", LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, IngestError::Io(_)));
    }
}
