//! What the dashboard currently shows.

use chrono::NaiveDate;
use fire_map_database_models::{BoroughCountRow, FirePointRow};
use fire_map_server_models::{ApiBoroughCount, ApiDashboardView};
use geojson::FeatureCollection;

use crate::binder::{bind_counts, bind_points};
use crate::controller::{NO_DATE_LABEL, RangeChange};

/// Results of both queries for one range.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResults {
    /// Per-borough counts.
    pub counts: Vec<BoroughCountRow>,
    /// Joined fire points.
    pub points: Vec<FirePointRow>,
}

/// Whether a refresh was displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The refresh is now on screen.
    Applied,
    /// A newer range change was issued; the refresh was discarded.
    Stale {
        /// Sequence number of the discarded refresh.
        sequence: u64,
        /// Latest issued sequence number.
        latest: u64,
    },
}

/// The table, overlay and label on screen.
#[derive(Debug, Clone)]
pub struct DisplayState {
    sequence: u64,
    label: String,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    table: Vec<ApiBoroughCount>,
    points: FeatureCollection,
    error: Option<String>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            sequence: 0,
            label: NO_DATE_LABEL.to_string(),
            start: None,
            end: None,
            table: vec![],
            points: bind_points(&[]),
            error: None,
        }
    }
}

impl DisplayState {
    /// Creates an empty display.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows the results of `change` unless a newer change has been
    /// issued.
    ///
    /// A failed refresh updates the label and error but keeps the previous
    /// table and overlay.
    pub fn apply(
        &mut self,
        change: &RangeChange,
        latest: u64,
        results: Result<QueryResults, String>,
    ) -> ApplyOutcome {
        if change.sequence != latest || change.sequence < self.sequence {
            return ApplyOutcome::Stale {
                sequence: change.sequence,
                latest,
            };
        }

        self.sequence = change.sequence;
        self.label.clone_from(&change.label);
        self.start = change.start;
        self.end = change.end;

        match results {
            Ok(results) => {
                self.table = bind_counts(&results.counts);
                self.points = bind_points(&results.points);
                self.error = None;
            }
            Err(message) => {
                self.error = Some(message);
            }
        }

        ApplyOutcome::Applied
    }

    /// Snapshot for the API.
    #[must_use]
    pub fn view(&self, latest_sequence: u64) -> ApiDashboardView {
        ApiDashboardView {
            sequence: self.sequence,
            latest_sequence,
            label: self.label.clone(),
            start: self.start,
            end: self.end,
            table: self.table.clone(),
            points: self.points.clone(),
            error: self.error.clone(),
        }
    }
}
