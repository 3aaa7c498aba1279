#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Dashboard state for the fire map.
//!
//! A range change issues a sequence number, runs the count and point
//! queries concurrently, and displays the results only if no newer change
//! was issued in the meantime.

pub mod binder;
pub mod controller;
pub mod display;

use std::sync::{Arc, Mutex, PoisonError};

use fire_map_database::store::FireStore;
use fire_map_database_models::DateRange;
use fire_map_server_models::{ApiDashboardView, RangeUpdate};

use crate::controller::{DateRangeController, RangeChange};
use crate::display::{ApplyOutcome, DisplayState, QueryResults};

/// Controller, display and store wired together.
pub struct Dashboard {
    store: Arc<dyn FireStore>,
    // Lock order: display before controller.
    controller: Mutex<DateRangeController>,
    display: Mutex<DisplayState>,
}

impl Dashboard {
    /// Creates a dashboard with nothing displayed yet.
    #[must_use]
    pub fn new(store: Arc<dyn FireStore>, controller: DateRangeController) -> Self {
        Self {
            store,
            controller: Mutex::new(controller),
            display: Mutex::new(DisplayState::new()),
        }
    }

    /// Applies a picker change and waits for its results.
    ///
    /// The returned view is whatever is on screen once this change settles,
    /// which is a newer change's results if one overtook it.
    pub async fn update(&self, update: &RangeUpdate) -> ApiDashboardView {
        let change = self
            .controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(update);
        self.run(change).await
    }

    /// Re-runs the queries for the current selection.
    pub async fn refresh(&self) -> ApiDashboardView {
        let change = self
            .controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .refresh();
        self.run(change).await
    }

    /// What is on screen now.
    #[must_use]
    pub fn view(&self) -> ApiDashboardView {
        let display = self.display.lock().unwrap_or_else(PoisonError::into_inner);
        display.view(self.latest_sequence())
    }

    /// Latest sequence number issued by the controller.
    #[must_use]
    pub fn latest_sequence(&self) -> u64 {
        self.controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .latest_sequence()
    }

    async fn run(&self, change: RangeChange) -> ApiDashboardView {
        log::debug!("Range change #{}: {}", change.sequence, change.label);

        let results = match &change.range {
            Ok(range) => self.query(range).await,
            Err(e) => Err(e.to_string()),
        };

        let mut display = self.display.lock().unwrap_or_else(PoisonError::into_inner);
        let latest = self.latest_sequence();

        if let ApplyOutcome::Stale { sequence, latest } = display.apply(&change, latest, results) {
            log::debug!("Discarding results for range change #{sequence}, latest is #{latest}");
        }

        display.view(latest)
    }

    async fn query(&self, range: &DateRange) -> Result<QueryResults, String> {
        let (counts, points) = futures::join!(
            self.store.counts_by_borough(range),
            self.store.points_in_range(range)
        );

        let (counts, points) = match (counts, points) {
            (Ok(counts), Ok(points)) => (counts, points),
            (Err(e), _) | (_, Err(e)) => {
                log::error!("Fire point query failed for {range:?}: {e}");
                return Err(e.to_string());
            }
        };

        if let Err(mismatches) = binder::check_join_consistency(&counts, &points) {
            for m in &mismatches {
                log::warn!(
                    "Borough {} counted {} fire points but {} were returned",
                    m.borough,
                    m.counted,
                    m.points
                );
            }
        }

        log::info!(
            "Range {} to {}: {} boroughs, {} fire points",
            range.start(),
            range.end(),
            counts.len(),
            points.len()
        );

        Ok(QueryResults { counts, points })
    }
}
