//! Distance hysteresis for re-querying the registry while the user moves.

use bloodbuddy_core::{Coordinate, PositionSample, SearchFilter};
use chrono::{DateTime, Utc};

pub const DEFAULT_REFRESH_THRESHOLD_KM: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshDecision {
    /// Query the registry at `at`; the user moved `moved_km` since the last
    /// fetch point.
    Refresh { at: Coordinate, moved_km: f64 },
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No search has succeeded yet.
    NoBaseline,
    /// Unfiltered queries are never refreshed automatically.
    NoBloodGroup,
    BelowThreshold,
    /// The sample predates the last fetch trigger.
    Stale,
    /// A search is already running.
    InFlight,
}

/// Decides, per position sample, whether the donor list is stale.
///
/// The policy only remembers where the last successful fetch happened. It
/// never issues requests itself: callers act on [`RefreshDecision::Refresh`]
/// and report success through [`record_fetch`](Self::record_fetch). A failed
/// query is simply not recorded, so the next sample past the threshold
/// retries.
#[derive(Debug, Clone)]
pub struct ProximityRefreshPolicy {
    filter: SearchFilter,
    threshold_km: f64,
    last_fetch: Option<Coordinate>,
    last_fetch_at: Option<DateTime<Utc>>,
}

impl ProximityRefreshPolicy {
    #[must_use]
    pub fn new(filter: SearchFilter, threshold_km: f64) -> Self {
        Self {
            filter,
            threshold_km,
            last_fetch: None,
            last_fetch_at: None,
        }
    }

    #[must_use]
    pub fn filter(&self) -> SearchFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: SearchFilter) {
        self.filter = filter;
    }

    #[must_use]
    pub fn threshold_km(&self) -> f64 {
        self.threshold_km
    }

    /// Where the current result set was fetched, if anywhere.
    #[must_use]
    pub fn last_fetch(&self) -> Option<Coordinate> {
        self.last_fetch
    }

    #[must_use]
    pub fn evaluate(&self, sample: &PositionSample) -> RefreshDecision {
        let Some(baseline) = self.last_fetch else {
            return RefreshDecision::Skip(SkipReason::NoBaseline);
        };
        if self.filter.blood_group.is_none() {
            return RefreshDecision::Skip(SkipReason::NoBloodGroup);
        }
        if self
            .last_fetch_at
            .is_some_and(|at| sample.timestamp < at)
        {
            return RefreshDecision::Skip(SkipReason::Stale);
        }

        let moved_km = baseline.distance_km(&sample.coordinate);
        if moved_km >= self.threshold_km {
            RefreshDecision::Refresh {
                at: sample.coordinate,
                moved_km,
            }
        } else {
            RefreshDecision::Skip(SkipReason::BelowThreshold)
        }
    }

    /// A user-initiated search succeeded at `coordinate`.
    pub fn set_baseline(&mut self, coordinate: Coordinate) {
        self.last_fetch = Some(coordinate);
        self.last_fetch_at = None;
    }

    /// A refresh triggered by `sample` succeeded.
    pub fn record_fetch(&mut self, sample: &PositionSample) {
        self.last_fetch = Some(sample.coordinate);
        self.last_fetch_at = Some(sample.timestamp);
    }
}
