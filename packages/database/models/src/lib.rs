#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Date range, row types, and query parameter definitions.
//!
//! These types represent the shapes of data as queried from the fire
//! detection store. They are distinct from the API response types in
//! `fire_map_server_models`. A [`DateRange`] can only be constructed in a
//! validated state, so query code never sees missing or inverted bounds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Date format accepted for range bounds (`2022-04-20`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors produced while building a [`DateRange`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// A bound was not supplied.
    #[error("missing {bound} date")]
    Missing {
        /// Which bound (`start` or `end`).
        bound: &'static str,
    },

    /// A bound could not be parsed as a calendar date.
    #[error("malformed {bound} date '{value}': expected YYYY-MM-DD")]
    Malformed {
        /// Which bound (`start` or `end`).
        bound: &'static str,
        /// The rejected input.
        value: String,
    },

    /// The start date falls after the end date.
    #[error("start date {start} is after end date {end}")]
    Inverted {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// A date lies outside the allowed calendar window.
    #[error("date {date} is outside the allowed window {min}..={max}")]
    OutOfBounds {
        /// The rejected date.
        date: NaiveDate,
        /// Earliest allowed date.
        min: NaiveDate,
        /// Latest allowed date.
        max: NaiveDate,
    },
}

/// An inclusive, validated calendar date interval.
///
/// Both bounds are whole days: a detection observed at any time on `end`
/// is inside the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = RangeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl DateRange {
    /// Creates a range from two dates.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::Inverted`] if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a range covering exactly one day.
    #[must_use]
    pub const fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Creates a range from optional bounds, rejecting absent ones.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::Missing`] if either bound is `None`, or
    /// [`RangeError::Inverted`] if `start > end`.
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, RangeError> {
        let start = start.ok_or(RangeError::Missing { bound: "start" })?;
        let end = end.ok_or(RangeError::Missing { bound: "end" })?;
        Self::new(start, end)
    }

    /// Parses a range from optional `YYYY-MM-DD` strings.
    ///
    /// Empty strings are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] if a bound is absent, malformed, or the range
    /// is inverted.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, RangeError> {
        Self::from_bounds(parse_date("start", start)?, parse_date("end", end)?)
    }

    /// First day of the range.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive lower timestamp bound (`start` at midnight UTC).
    #[must_use]
    pub fn lower_bound(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Exclusive upper timestamp bound (midnight UTC after `end`).
    #[must_use]
    pub fn upper_bound_exclusive(&self) -> NaiveDateTime {
        self.end
            .succ_opt()
            .map_or(NaiveDateTime::MAX, |next| next.and_time(NaiveTime::MIN))
    }

    /// Whether a detection timestamp falls inside this range.
    #[must_use]
    pub fn contains(&self, observed_at: DateTime<Utc>) -> bool {
        let naive = observed_at.naive_utc();
        naive >= self.lower_bound() && naive < self.upper_bound_exclusive()
    }
}

/// Parses a single optional bound.
///
/// # Errors
///
/// Returns [`RangeError::Malformed`] if the value is present but is not a
/// `YYYY-MM-DD` date.
pub fn parse_date(bound: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, RangeError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Some)
            .map_err(|_| RangeError::Malformed {
                bound,
                value: s.to_string(),
            }),
    }
}

/// The calendar window a user may pick dates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarBounds {
    /// Earliest selectable date.
    pub min: NaiveDate,
    /// Latest selectable date.
    pub max: NaiveDate,
}

impl CalendarBounds {
    /// Checks that `date` lies within the window.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::OutOfBounds`] otherwise.
    pub fn check(&self, date: NaiveDate) -> Result<(), RangeError> {
        if date < self.min || date > self.max {
            return Err(RangeError::OutOfBounds {
                date,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Checks both ends of `range` against the window.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::OutOfBounds`] for the first end outside it.
    pub fn check_range(&self, range: &DateRange) -> Result<(), RangeError> {
        self.check(range.start())?;
        self.check(range.end())
    }
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Corner pair in `[[south, west], [north, east]]` order, as map
    /// clients expect for fit-to-bounds.
    #[must_use]
    pub const fn corners(&self) -> [[f64; 2]; 2] {
        [[self.south, self.west], [self.north, self.east]]
    }
}

/// Fire detection count for one borough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoroughCountRow {
    /// Borough display name.
    pub borough: String,
    /// Number of detections inside the borough.
    pub count: u64,
}

/// A single fire detection joined with its containing borough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirePointRow {
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Satellite observation time.
    pub observed_at: DateTime<Utc>,
    /// Name of the containing borough.
    pub borough: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        let err = DateRange::new(date(2022, 4, 25), date(2022, 4, 20)).unwrap_err();
        assert!(matches!(err, RangeError::Inverted { .. }));
    }

    #[test]
    fn rejects_missing_bounds() {
        assert_eq!(
            DateRange::from_bounds(None, Some(date(2022, 4, 25))),
            Err(RangeError::Missing { bound: "start" })
        );
        assert_eq!(
            DateRange::from_bounds(Some(date(2022, 4, 20)), None),
            Err(RangeError::Missing { bound: "end" })
        );
    }

    #[test]
    fn parse_treats_blank_as_missing() {
        assert_eq!(
            DateRange::parse(Some("  "), Some("2022-04-25")),
            Err(RangeError::Missing { bound: "start" })
        );
    }

    #[test]
    fn parse_reports_malformed_bound() {
        let err = DateRange::parse(Some("2022-04-20"), Some("April 25")).unwrap_err();
        assert_eq!(
            err,
            RangeError::Malformed {
                bound: "end",
                value: "April 25".to_string(),
            }
        );
    }

    #[test]
    fn end_day_is_fully_included() {
        let range = DateRange::single_day(date(2022, 4, 21));
        let early = date(2022, 4, 21).and_hms_opt(0, 0, 0).unwrap().and_utc();
        let late = date(2022, 4, 21).and_hms_opt(23, 59, 59).unwrap().and_utc();
        let next = date(2022, 4, 22).and_hms_opt(0, 0, 0).unwrap().and_utc();
        let before = date(2022, 4, 20).and_hms_opt(23, 59, 59).unwrap().and_utc();

        assert!(range.contains(early));
        assert!(range.contains(late));
        assert!(!range.contains(next));
        assert!(!range.contains(before));
    }

    #[test]
    fn upper_bound_is_midnight_after_end() {
        let range = DateRange::new(date(2022, 12, 30), date(2022, 12, 31)).unwrap();
        assert_eq!(
            range.upper_bound_exclusive(),
            date(2023, 1, 1).and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn deserialize_validates_order() {
        let ok: DateRange =
            serde_json::from_str(r#"{"start":"2022-04-20","end":"2022-04-25"}"#).unwrap();
        assert_eq!(ok.start(), date(2022, 4, 20));

        let inverted =
            serde_json::from_str::<DateRange>(r#"{"start":"2022-04-25","end":"2022-04-20"}"#);
        assert!(inverted.is_err());
    }

    #[test]
    fn calendar_bounds_are_inclusive() {
        let bounds = CalendarBounds {
            min: date(2022, 1, 1),
            max: date(2022, 12, 31),
        };
        assert!(bounds.check(date(2022, 1, 1)).is_ok());
        assert!(bounds.check(date(2022, 12, 31)).is_ok());
        assert!(matches!(
            bounds.check(date(2023, 1, 1)),
            Err(RangeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn calendar_bounds_check_both_range_ends() {
        let bounds = CalendarBounds {
            min: date(2022, 1, 1),
            max: date(2022, 12, 31),
        };
        let inside = DateRange::parse(Some("2022-04-20"), Some("2022-04-25")).unwrap();
        assert!(bounds.check_range(&inside).is_ok());

        let early = DateRange::parse(Some("2021-12-31"), Some("2022-04-25")).unwrap();
        assert!(matches!(
            bounds.check_range(&early),
            Err(RangeError::OutOfBounds { date: found, .. }) if found == date(2021, 12, 31)
        ));

        let late = DateRange::parse(Some("2022-04-20"), Some("2030-01-01")).unwrap();
        assert!(matches!(
            bounds.check_range(&late),
            Err(RangeError::OutOfBounds { date: found, .. }) if found == date(2030, 1, 1)
        ));
    }
}
