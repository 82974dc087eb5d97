#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collision record types and the coded-attribute taxonomy.
//!
//! Road collision datasets encode severity, weather, lighting and weekday as
//! small integer codes. This crate maps those codes onto closed enums so the
//! rest of the system never handles raw codes directly, and defines the
//! [`CollisionEvent`] record every analysis stage consumes.

pub mod parsing;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Collision severity as recorded by the reporting officer.
///
/// Codes outside 1-3 are kept as [`Severity::Unknown`] instead of being
/// dropped, so they still count towards totals.
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
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Severity {
    /// Code 1: at least one person died within 30 days
    Fatal,
    /// Code 2: hospital admission or serious injury
    Serious,
    /// Code 3: minor injuries only
    Slight,
    /// Any other code
    Unknown,
}

impl Severity {
    /// Maps a raw severity code onto the taxonomy.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Fatal,
            2 => Self::Serious,
            3 => Self::Slight,
            _ => Self::Unknown,
        }
    }

    /// Returns the raw code, or `None` for [`Severity::Unknown`].
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        match self {
            Self::Fatal => Some(1),
            Self::Serious => Some(2),
            Self::Slight => Some(3),
            Self::Unknown => None,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fatal => "Fatal",
            Self::Serious => "Serious",
            Self::Slight => "Slight",
            Self::Unknown => "Unknown",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Fatal, Self::Serious, Self::Slight, Self::Unknown]
    }
}

/// Day of the week using the collision dataset numbering (1 = Sunday).
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
pub enum DayOfWeek {
    Sunday = 1,
    Monday = 2,
    Tuesday = 3,
    Wednesday = 4,
    Thursday = 5,
    Friday = 6,
    Saturday = 7,
}

impl DayOfWeek {
    /// Maps a raw day code (1-7, Sunday first) onto a weekday.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Sunday),
            2 => Some(Self::Monday),
            3 => Some(Self::Tuesday),
            4 => Some(Self::Wednesday),
            5 => Some(Self::Thursday),
            6 => Some(Self::Friday),
            7 => Some(Self::Saturday),
            _ => None,
        }
    }

    #[must_use]
    pub const fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => Self::Sunday,
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
        }
    }

    /// Returns the raw day code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sunday => "Sunday",
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Sunday,
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
        ]
    }
}

/// Weather at the time of the collision.
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
pub enum WeatherCondition {
    /// Code 1
    FineNoHighWinds,
    /// Code 2
    RainingNoHighWinds,
    /// Code 3
    SnowingNoHighWinds,
    /// Code 4
    FineHighWinds,
    /// Code 5
    RainingHighWinds,
    /// Code 6
    SnowingHighWinds,
    /// Code 7
    FogOrMist,
    /// Code 8
    Other,
    /// Code 9: recorded as unknown by the reporter
    Unknown,
    /// Code -1
    DataMissing,
    /// A code outside the published table
    Unrecognized,
}

impl WeatherCondition {
    /// Maps a raw weather code onto the taxonomy.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::FineNoHighWinds,
            2 => Self::RainingNoHighWinds,
            3 => Self::SnowingNoHighWinds,
            4 => Self::FineHighWinds,
            5 => Self::RainingHighWinds,
            6 => Self::SnowingHighWinds,
            7 => Self::FogOrMist,
            8 => Self::Other,
            9 => Self::Unknown,
            -1 => Self::DataMissing,
            _ => Self::Unrecognized,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FineNoHighWinds => "Fine no high winds",
            Self::RainingNoHighWinds => "Raining no high winds",
            Self::SnowingNoHighWinds => "Snowing no high winds",
            Self::FineHighWinds => "Fine + high winds",
            Self::RainingHighWinds => "Raining + high winds",
            Self::SnowingHighWinds => "Snowing + high winds",
            Self::FogOrMist => "Fog or mist",
            Self::Other => "Other",
            Self::Unknown => "Unknown",
            Self::DataMissing => "Data missing",
            Self::Unrecognized => "Unrecognized",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::FineNoHighWinds,
            Self::RainingNoHighWinds,
            Self::SnowingNoHighWinds,
            Self::FineHighWinds,
            Self::RainingHighWinds,
            Self::SnowingHighWinds,
            Self::FogOrMist,
            Self::Other,
            Self::Unknown,
            Self::DataMissing,
            Self::Unrecognized,
        ]
    }
}

/// Lighting at the time of the collision.
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
pub enum LightCondition {
    /// Code 1
    Daylight,
    /// Code 4
    DarknessLightsLit,
    /// Code 5
    DarknessLightsUnlit,
    /// Code 6
    DarknessNoLighting,
    /// Code 7
    DarknessLightingUnknown,
    /// Code -1
    DataMissing,
    /// A code outside the published table
    Unrecognized,
}

impl LightCondition {
    /// Maps a raw light code onto the taxonomy.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Daylight,
            4 => Self::DarknessLightsLit,
            5 => Self::DarknessLightsUnlit,
            6 => Self::DarknessNoLighting,
            7 => Self::DarknessLightingUnknown,
            -1 => Self::DataMissing,
            _ => Self::Unrecognized,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Daylight => "Daylight",
            Self::DarknessLightsLit => "Darkness - lights lit",
            Self::DarknessLightsUnlit => "Darkness - lights unlit",
            Self::DarknessNoLighting => "Darkness - no lighting",
            Self::DarknessLightingUnknown => "Darkness - lighting unknown",
            Self::DataMissing => "Data missing",
            Self::Unrecognized => "Unrecognized",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Daylight,
            Self::DarknessLightsLit,
            Self::DarknessLightsUnlit,
            Self::DarknessNoLighting,
            Self::DarknessLightingUnknown,
            Self::DataMissing,
            Self::Unrecognized,
        ]
    }
}

/// Why a single collision record could not take part in an analysis.
///
/// These never abort a batch; callers exclude the record and count it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedEventError {
    /// Longitude or latitude is absent.
    #[error("collision has no position")]
    MissingPosition,

    /// Longitude or latitude is NaN or infinite.
    #[error("collision position ({longitude}, {latitude}) is not finite")]
    NonFinitePosition {
        /// Raw longitude value.
        longitude: f64,
        /// Raw latitude value.
        latitude: f64,
    },

    /// Position lies outside the valid WGS84 range.
    #[error("collision position ({longitude}, {latitude}) is outside WGS84 bounds")]
    OutOfRange {
        /// Raw longitude value.
        longitude: f64,
        /// Raw latitude value.
        latitude: f64,
    },

    /// The source row could not be decoded at all.
    #[error("undecodable collision record: {message}")]
    Undecodable {
        /// Description of what went wrong.
        message: String,
    },
}

/// A single road collision record.
///
/// Supplied by an external loader and treated as read-only. Position and
/// timestamp parts are optional because real datasets contain gaps; they are
/// validated lazily by the stage that needs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionEvent {
    /// Collision reference from the source dataset.
    pub id: String,
    /// Longitude (WGS84).
    pub longitude: Option<f64>,
    /// Latitude (WGS84).
    pub latitude: Option<f64>,
    /// Date as supplied (e.g. `"14/03/2023"` or `"2023-03-14"`).
    pub date: Option<String>,
    /// Time of day as supplied (e.g. `"17:42"`).
    pub time: Option<String>,
    pub severity: Severity,
    /// Number of vehicles involved.
    pub vehicle_count: u32,
    /// Number of casualties.
    pub casualty_count: u32,
    /// Raw day-of-week code (1 = Sunday).
    pub day_of_week_code: i32,
    /// Raw weather code.
    pub weather_code: i32,
    /// Raw light code.
    pub light_code: i32,
    /// Posted speed limit in mph.
    pub speed_limit: Option<u16>,
}

impl CollisionEvent {
    /// Returns the validated `(longitude, latitude)` pair.
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedEventError`] if either component is missing,
    /// non-finite, or outside WGS84 bounds.
    pub fn position(&self) -> Result<(f64, f64), MalformedEventError> {
        let (Some(longitude), Some(latitude)) = (self.longitude, self.latitude) else {
            return Err(MalformedEventError::MissingPosition);
        };

        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(MalformedEventError::NonFinitePosition {
                longitude,
                latitude,
            });
        }

        if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
            return Err(MalformedEventError::OutOfRange {
                longitude,
                latitude,
            });
        }

        Ok((longitude, latitude))
    }

    /// Hour of day (0-23), or `None` if the time is missing or malformed.
    #[must_use]
    pub fn hour(&self) -> Option<u8> {
        self.time.as_deref().and_then(parsing::parse_hour)
    }

    /// Calendar date of the collision, or `None` if it cannot be parsed.
    ///
    /// Falls back to the time field when it carries a full timestamp.
    #[must_use]
    pub fn occurred_on(&self) -> Option<NaiveDate> {
        self.date
            .as_deref()
            .and_then(parsing::parse_date)
            .or_else(|| self.time.as_deref().and_then(parsing::parse_timestamp_date))
    }

    /// Day of week from the raw code, falling back to the parsed date.
    #[must_use]
    pub fn day_of_week(&self) -> Option<DayOfWeek> {
        DayOfWeek::from_code(self.day_of_week_code)
            .or_else(|| self.occurred_on().map(|d| DayOfWeek::from_weekday(d.weekday())))
    }

    #[must_use]
    pub const fn weather(&self) -> WeatherCondition {
        WeatherCondition::from_code(self.weather_code)
    }

    #[must_use]
    pub const fn light(&self) -> LightCondition {
        LightCondition::from_code(self.light_code)
    }
}

/// A collision that lies within the search radius of a road.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedEvent {
    /// The underlying collision record.
    #[serde(flatten)]
    pub event: CollisionEvent,
    /// Great-circle distance from the collision to the road reference.
    pub distance_to_road_m: f64,
    /// Index of the closest sample point along the road.
    pub nearest_sample_index: usize,
    /// Distance along the road of the collision's nearest road position.
    pub chainage_m: f64,
}
