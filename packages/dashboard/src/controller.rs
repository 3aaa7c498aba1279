//! The date range picker state.
//!
//! Every transition issues a new sequence number. Results computed for a
//! sequence number other than the latest one are stale and must not be
//! displayed.

use chrono::NaiveDate;
use fire_map_database_models::{CalendarBounds, DateRange, RangeError};
use fire_map_server_models::RangeUpdate;

/// Label shown while no date is selected.
pub const NO_DATE_LABEL: &str = "Select a date to see it displayed here";

/// Long date format used in the label (`April 20, 2022`).
pub const LABEL_DATE_FORMAT: &str = "%B %d, %Y";

/// The result of one controller transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeChange {
    /// Sequence number issued for this transition.
    pub sequence: u64,
    /// Selected start date.
    pub start: Option<NaiveDate>,
    /// Selected end date.
    pub end: Option<NaiveDate>,
    /// The range to query, or why there is none.
    pub range: Result<DateRange, RangeError>,
    /// Label for the selection.
    pub label: String,
}

/// Start/end selection plus the sequence counter.
#[derive(Debug, Clone)]
pub struct DateRangeController {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    bounds: CalendarBounds,
    sequence: u64,
}

impl DateRangeController {
    /// Creates a controller with nothing selected.
    #[must_use]
    pub const fn new(bounds: CalendarBounds) -> Self {
        Self {
            start: None,
            end: None,
            bounds,
            sequence: 0,
        }
    }

    /// Creates a controller seeded with a default selection.
    ///
    /// Seeding does not issue a sequence number; call
    /// [`DateRangeController::refresh`] to trigger the first query.
    #[must_use]
    pub const fn with_selection(
        bounds: CalendarBounds,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Self {
        Self {
            start,
            end,
            bounds,
            sequence: 0,
        }
    }

    /// Selected start date.
    #[must_use]
    pub const fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    /// Selected end date.
    #[must_use]
    pub const fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Allowed calendar window.
    #[must_use]
    pub const fn bounds(&self) -> CalendarBounds {
        self.bounds
    }

    /// Most recently issued sequence number (`0` before any transition).
    #[must_use]
    pub const fn latest_sequence(&self) -> u64 {
        self.sequence
    }

    /// Label for the current selection.
    #[must_use]
    pub fn label(&self) -> String {
        range_label(self.start, self.end)
    }

    /// Validates the current selection.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] if a date is missing, outside the calendar
    /// window, or the range is inverted.
    pub fn range(&self) -> Result<DateRange, RangeError> {
        for date in [self.start, self.end].into_iter().flatten() {
            self.bounds.check(date)?;
        }
        DateRange::from_bounds(self.start, self.end)
    }

    /// Sets or clears the start date.
    pub fn set_start(&mut self, start: Option<NaiveDate>) -> RangeChange {
        self.start = start;
        self.transition()
    }

    /// Sets or clears the end date.
    pub fn set_end(&mut self, end: Option<NaiveDate>) -> RangeChange {
        self.end = end;
        self.transition()
    }

    /// Applies a picker change touching one or both dates as a single
    /// transition.
    pub fn apply(&mut self, update: &RangeUpdate) -> RangeChange {
        if let Some(start) = update.start {
            self.start = start;
        }
        if let Some(end) = update.end {
            self.end = end;
        }
        self.transition()
    }

    /// Re-triggers the current selection without changing it.
    pub fn refresh(&mut self) -> RangeChange {
        self.transition()
    }

    fn transition(&mut self) -> RangeChange {
        self.sequence += 1;
        RangeChange {
            sequence: self.sequence,
            start: self.start,
            end: self.end,
            range: self.range(),
            label: self.label(),
        }
    }
}

/// Renders whichever dates are present.
#[must_use]
pub fn range_label(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    let parts: Vec<String> = [("Start Date", start), ("End Date", end)]
        .into_iter()
        .filter_map(|(prefix, date)| {
            date.map(|d| format!("{prefix}: {}", d.format(LABEL_DATE_FORMAT)))
        })
        .collect();

    if parts.is_empty() {
        NO_DATE_LABEL.to_string()
    } else {
        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, m, d).unwrap()
    }

    fn bounds() -> CalendarBounds {
        CalendarBounds {
            min: date(1, 1),
            max: date(12, 31),
        }
    }

    #[test]
    fn label_with_both_dates() {
        assert_eq!(
            range_label(Some(date(4, 20)), Some(date(4, 25))),
            "Start Date: April 20, 2022 | End Date: April 25, 2022"
        );
    }

    #[test]
    fn label_with_only_one_date() {
        assert_eq!(
            range_label(Some(date(4, 20)), None),
            "Start Date: April 20, 2022"
        );
        assert_eq!(
            range_label(None, Some(date(4, 25))),
            "End Date: April 25, 2022"
        );
    }

    #[test]
    fn label_with_no_dates() {
        assert_eq!(range_label(None, None), NO_DATE_LABEL);
    }

    #[test]
    fn each_transition_issues_a_new_sequence() {
        let mut controller = DateRangeController::new(bounds());
        assert_eq!(controller.latest_sequence(), 0);

        let first = controller.set_start(Some(date(4, 20)));
        let second = controller.set_end(Some(date(4, 25)));
        let third = controller.refresh();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(third.sequence, 3);
        assert_eq!(controller.latest_sequence(), 3);
    }

    #[test]
    fn partial_selection_is_missing_range() {
        let mut controller = DateRangeController::new(bounds());
        let change = controller.set_start(Some(date(4, 20)));
        assert_eq!(change.range, Err(RangeError::Missing { bound: "end" }));
        assert_eq!(change.label, "Start Date: April 20, 2022");
    }

    #[test]
    fn inverted_selection_is_rejected() {
        let mut controller =
            DateRangeController::with_selection(bounds(), Some(date(4, 20)), Some(date(4, 25)));
        let change = controller.set_start(Some(date(5, 1)));
        assert!(matches!(change.range, Err(RangeError::Inverted { .. })));
    }

    #[test]
    fn dates_outside_calendar_are_rejected() {
        let mut controller =
            DateRangeController::with_selection(bounds(), Some(date(4, 20)), Some(date(4, 25)));
        let change = controller.set_end(NaiveDate::from_ymd_opt(2023, 1, 5));
        assert!(matches!(change.range, Err(RangeError::OutOfBounds { .. })));
    }

    #[test]
    fn apply_updates_both_dates_in_one_transition() {
        let mut controller = DateRangeController::new(bounds());
        let change = controller.apply(&RangeUpdate {
            start: Some(Some(date(1, 1))),
            end: Some(Some(date(1, 31))),
        });

        assert_eq!(change.sequence, 1);
        assert_eq!(change.range, DateRange::new(date(1, 1), date(1, 31)));
    }

    #[test]
    fn apply_can_clear_a_date() {
        let mut controller =
            DateRangeController::with_selection(bounds(), Some(date(4, 20)), Some(date(4, 25)));
        let change = controller.apply(&RangeUpdate {
            start: Some(None),
            end: None,
        });

        assert_eq!(controller.start(), None);
        assert_eq!(controller.end(), Some(date(4, 25)));
        assert_eq!(change.range, Err(RangeError::Missing { bound: "start" }));
    }
}
