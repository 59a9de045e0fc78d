//! The donor search screen: filter, location, results and the proximity
//! refresh that keeps the results current while the user moves.
//!
//! Registry and geocoder calls are handed out as [`PendingSearch`] futures
//! so the owner can keep handling other events while they run. Responses go
//! back through [`DonorSearch::apply`]; only the most recently issued search
//! may change the screen.

use std::sync::Arc;

use bloodbuddy_client::{DonorRegistry, Geocoder, NearbyQuery};
use bloodbuddy_core::{Coordinate, Donor, PositionSample, SearchFilter};
use futures::future::{BoxFuture, FutureExt};

use crate::error::AppError;
use crate::refresh::{ProximityRefreshPolicy, RefreshDecision, SkipReason};

/// Amravati, the map's initial center.
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(20.9374, 77.7796);
pub const DEFAULT_ZOOM: u8 = 13;

pub const EMPTY_LOCATION_MESSAGE: &str = "Please enter a location!";
pub const SEARCH_FAILED_MESSAGE: &str =
    "Error fetching donors. Please check your location or backend.";

const SEARCH_LABEL: &str = "Find Donors";
const SEARCHING_LABEL: &str = "Searching...";

#[derive(Debug, Clone, PartialEq)]
pub enum SearchLocation {
    /// The device's current position.
    Here(Coordinate),
    /// Free text to geocode.
    Address(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Trigger {
    User,
    Proximity(PositionSample),
}

/// A finished registry round trip, ready for [`DonorSearch::apply`].
#[derive(Debug)]
pub struct SearchResponse {
    seq: u64,
    trigger: Trigger,
    result: Result<(Coordinate, Vec<Donor>), AppError>,
}

pub type PendingSearch = BoxFuture<'static, SearchResponse>;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The donor list was replaced with this many donors.
    Updated(usize),
    /// The search failed; list and refresh baseline are unchanged.
    Failed(AppError),
    /// A newer search was issued before this one finished.
    Superseded,
    /// The position sample did not warrant a refresh.
    Skipped(SkipReason),
}

/// One line of the results table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorRow {
    pub name: String,
    pub city: String,
    pub distance: String,
    pub contact: String,
}

pub struct DonorSearch<R, G> {
    registry: Arc<R>,
    geocoder: Arc<G>,
    policy: ProximityRefreshPolicy,
    donors: Vec<Donor>,
    center: Coordinate,
    loading: bool,
    last_error: Option<String>,
    issued: u64,
    refresh_in_flight: bool,
}

impl<R, G> DonorSearch<R, G>
where
    R: DonorRegistry + 'static,
    G: Geocoder + 'static,
{
    pub fn new(
        registry: Arc<R>,
        geocoder: Arc<G>,
        filter: SearchFilter,
        refresh_threshold_km: f64,
    ) -> Self {
        Self {
            registry,
            geocoder,
            policy: ProximityRefreshPolicy::new(filter, refresh_threshold_km),
            donors: Vec::new(),
            center: DEFAULT_CENTER,
            loading: false,
            last_error: None,
            issued: 0,
            refresh_in_flight: false,
        }
    }

    #[must_use]
    pub fn donors(&self) -> &[Donor] {
        &self.donors
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        self.center
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn button_label(&self) -> &'static str {
        if self.loading {
            SEARCHING_LABEL
        } else {
            SEARCH_LABEL
        }
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn filter(&self) -> SearchFilter {
        self.policy.filter()
    }

    /// Changes the filter used by the next search and by proximity refresh.
    pub fn set_filter(&mut self, filter: SearchFilter) {
        self.policy.set_filter(filter);
    }

    /// Where the displayed results were fetched.
    #[must_use]
    pub fn baseline(&self) -> Option<Coordinate> {
        self.policy.last_fetch()
    }

    /// Searches and refreshes started so far, including superseded ones.
    #[must_use]
    pub fn queries_issued(&self) -> u64 {
        self.issued
    }

    #[must_use]
    pub fn rows(&self) -> Vec<DonorRow> {
        self.donors
            .iter()
            .map(|d| DonorRow {
                name: d.name.clone(),
                city: d.city.clone(),
                distance: d.distance_label(),
                contact: d.contact.clone(),
            })
            .collect()
    }

    /// Starts a user-initiated search.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::LookupNotFound`] without doing any I/O when the
    /// address is blank.
    pub fn submit(&mut self, location: SearchLocation) -> Result<PendingSearch, AppError> {
        if let SearchLocation::Address(text) = &location {
            if text.trim().is_empty() {
                self.last_error = Some(EMPTY_LOCATION_MESSAGE.to_string());
                return Err(AppError::LookupNotFound(EMPTY_LOCATION_MESSAGE.to_string()));
            }
        }

        let seq = self.next_seq();
        self.loading = true;
        self.last_error = None;
        // A user search replaces whatever a refresh was about to deliver.
        self.refresh_in_flight = false;

        let registry = Arc::clone(&self.registry);
        let geocoder = Arc::clone(&self.geocoder);
        let filter = self.policy.filter();
        Ok(async move {
            let result = async {
                let center = match location {
                    SearchLocation::Here(coordinate) => coordinate,
                    SearchLocation::Address(text) => {
                        let query = text.trim();
                        geocoder
                            .forward(query)
                            .await
                            .map_err(|e| AppError::lookup(query, &e))?
                    }
                };
                let donors = registry
                    .nearby(&NearbyQuery { center, filter })
                    .await
                    .map_err(|e| AppError::registry(&e))?;
                Ok::<_, AppError>((center, donors))
            }
            .await;
            SearchResponse {
                seq,
                trigger: Trigger::User,
                result,
            }
        }
        .boxed())
    }

    /// Feeds a position sample to the refresh policy. Returns the registry
    /// query to run when the user has moved far enough.
    pub fn on_position(&mut self, sample: &PositionSample) -> Result<PendingSearch, SkipReason> {
        let at = match self.policy.evaluate(sample) {
            RefreshDecision::Skip(reason) => return Err(reason),
            RefreshDecision::Refresh { at, moved_km } => {
                if self.refresh_in_flight || self.loading {
                    return Err(SkipReason::InFlight);
                }
                tracing::debug!(moved_km, lat = at.latitude, lon = at.longitude, "proximity refresh");
                at
            }
        };

        let seq = self.next_seq();
        self.refresh_in_flight = true;
        let registry = Arc::clone(&self.registry);
        let query = NearbyQuery {
            center: at,
            filter: self.policy.filter(),
        };
        let trigger = Trigger::Proximity(*sample);
        Ok(async move {
            let result = registry
                .nearby(&query)
                .await
                .map(|donors| (at, donors))
                .map_err(|e| AppError::registry(&e));
            SearchResponse {
                seq,
                trigger,
                result,
            }
        }
        .boxed())
    }

    /// Applies a finished search to the screen.
    pub fn apply(&mut self, response: SearchResponse) -> SearchOutcome {
        if response.seq != self.issued {
            tracing::debug!(seq = response.seq, latest = self.issued, "dropping stale search");
            return SearchOutcome::Superseded;
        }
        self.loading = false;
        self.refresh_in_flight = false;

        match (response.trigger, response.result) {
            (Trigger::User, Ok((center, donors))) => {
                tracing::info!(
                    lat = center.latitude,
                    lon = center.longitude,
                    count = donors.len(),
                    "donor search complete"
                );
                self.center = center;
                self.policy.set_baseline(center);
                self.last_error = None;
                self.replace(donors)
            }
            (Trigger::Proximity(sample), Ok((_, donors))) => {
                self.policy.record_fetch(&sample);
                self.last_error = None;
                self.replace(donors)
            }
            (Trigger::User, Err(err)) => {
                tracing::warn!(error = %err, "donor search failed");
                self.last_error = Some(SEARCH_FAILED_MESSAGE.to_string());
                SearchOutcome::Failed(err)
            }
            (Trigger::Proximity(_), Err(err)) => {
                tracing::warn!(error = %err, "proximity refresh failed; will retry on next move");
                SearchOutcome::Failed(err)
            }
        }
    }

    /// Runs a user search to completion.
    pub async fn search(&mut self, location: SearchLocation) -> SearchOutcome {
        match self.submit(location) {
            Ok(pending) => {
                let response = pending.await;
                self.apply(response)
            }
            Err(err) => SearchOutcome::Failed(err),
        }
    }

    /// Runs the proximity refresh for one sample to completion.
    pub async fn refresh(&mut self, sample: &PositionSample) -> SearchOutcome {
        match self.on_position(sample) {
            Ok(pending) => {
                let response = pending.await;
                self.apply(response)
            }
            Err(reason) => SearchOutcome::Skipped(reason),
        }
    }

    fn replace(&mut self, donors: Vec<Donor>) -> SearchOutcome {
        self.donors = donors;
        SearchOutcome::Updated(self.donors.len())
    }

    fn next_seq(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
