//! The map screen: donor markers, the user's position, the route to the
//! selected donor and navigation mode, driven by one event loop.

use bloodbuddy_client::{tile_for, tile_url, DonorRegistry, Geocoder, RoutingEngine};
use bloodbuddy_core::{Coordinate, Donor, PositionSample, SearchFilter};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, watch};

use crate::error::GeolocationError;
use crate::geolocation::{PositionWatch, TrackerEvent};
use crate::navigation::{NavigationController, NavigationPanel};
use crate::route_overlay::{RouteOutcome, RouteOverlayController};
use crate::search::{
    DonorSearch, PendingSearch, SearchLocation, SearchOutcome, SearchResponse, DEFAULT_ZOOM,
};

pub const LOCATION_DENIED_BANNER: &str =
    "Location access denied or failed. Please enable permissions or enter address manually.";

const USER_MARKER_LABEL: &str = "You are here";

/// User input from whatever front end draws the map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    SetFilter(SearchFilter),
    /// Search around the current device position.
    SearchHere,
    SearchAddress(String),
    /// Select a donor by its index in the current result list.
    SelectDonor(usize),
    Deselect,
    ToggleNavigation,
    SetVoice(bool),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    User,
    Donor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub coordinate: Coordinate,
    pub label: String,
    pub popup: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteView {
    pub destination: Coordinate,
    pub geometry: Vec<Coordinate>,
    /// `🚗 x km • ⏱ y mins`, drawn at `popup_anchor`.
    pub label: String,
    pub popup_anchor: Option<Coordinate>,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSnapshot {
    pub center: Coordinate,
    pub zoom: u8,
    pub center_tile_url: String,
    pub markers: Vec<Marker>,
    pub route: Option<RouteView>,
    pub navigation: Option<NavigationPanel>,
    /// Map rotation in degrees.
    pub bearing_degrees: f64,
    pub search_label: &'static str,
    pub search_error: Option<String>,
    pub banner: Option<String>,
}

pub struct MapView<R, G, E> {
    search: DonorSearch<R, G>,
    routes: RouteOverlayController<E>,
    navigation: NavigationController,
    tile_template: String,
    zoom: u8,
    user_position: Option<PositionSample>,
    selected: Option<Donor>,
    banner: Option<String>,
    pending_routes: FuturesUnordered<BoxFuture<'static, RouteOutcome>>,
    pending_searches: FuturesUnordered<PendingSearch>,
}

impl<R, G, E> MapView<R, G, E> {
    /// Releases everything the view holds on to: navigation (speech and
    /// compass), the route overlay and any request still in flight.
    pub fn teardown(&mut self) {
        self.navigation.exit();
        self.routes.clear();
        self.pending_routes = FuturesUnordered::new();
        self.pending_searches = FuturesUnordered::new();
    }

    #[must_use]
    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    #[must_use]
    pub fn routes(&self) -> &RouteOverlayController<E> {
        &self.routes
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Donor> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn user_position(&self) -> Option<PositionSample> {
        self.user_position
    }

    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        !self.pending_routes.is_empty() || !self.pending_searches.is_empty()
    }
}

impl<R, G, E> Drop for MapView<R, G, E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<R, G, E> MapView<R, G, E>
where
    R: DonorRegistry + 'static,
    G: Geocoder + 'static,
    E: RoutingEngine + 'static,
{
    pub fn new(
        search: DonorSearch<R, G>,
        routes: RouteOverlayController<E>,
        navigation: NavigationController,
        tile_template: impl Into<String>,
    ) -> Self {
        Self {
            search,
            routes,
            navigation,
            tile_template: tile_template.into(),
            zoom: DEFAULT_ZOOM,
            user_position: None,
            selected: None,
            banner: None,
            pending_routes: FuturesUnordered::new(),
            pending_searches: FuturesUnordered::new(),
        }
    }

    #[must_use]
    pub fn search(&self) -> &DonorSearch<R, G> {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut DonorSearch<R, G> {
        &mut self.search
    }

    /// Applies one command. Returns `false` for [`MapCommand::Shutdown`].
    pub fn handle_command(&mut self, command: MapCommand) -> bool {
        match command {
            MapCommand::SetFilter(filter) => self.search.set_filter(filter),
            MapCommand::SearchHere => match self.user_position {
                Some(sample) => self.submit_search(SearchLocation::Here(sample.coordinate)),
                None => {
                    tracing::warn!("search around device position requested without a fix");
                    self.banner = Some(LOCATION_DENIED_BANNER.to_string());
                }
            },
            MapCommand::SearchAddress(text) => self.submit_search(SearchLocation::Address(text)),
            MapCommand::SelectDonor(index) => {
                self.select_donor(index);
            }
            MapCommand::Deselect => self.deselect(),
            MapCommand::ToggleNavigation => {
                self.toggle_navigation();
            }
            MapCommand::SetVoice(enabled) => self.navigation.set_voice(enabled),
            MapCommand::Shutdown => return false,
        }
        true
    }

    fn submit_search(&mut self, location: SearchLocation) {
        match self.search.submit(location) {
            Ok(pending) => self.pending_searches.push(pending),
            Err(err) => tracing::debug!(error = %err, "search rejected"),
        }
    }

    /// Selects the donor at `index` of the current results and routes to
    /// them. The previous route is torn down first.
    pub fn select_donor(&mut self, index: usize) -> bool {
        let Some(donor) = self.search.donors().get(index).cloned() else {
            tracing::warn!(index, "no donor at index");
            return false;
        };
        self.routes.clear();
        self.navigation.on_route_lost();
        match self.user_position {
            Some(sample) => self.request_route(sample.coordinate, donor.coordinate),
            None => tracing::debug!("no position fix yet; routing waits for the first one"),
        }
        tracing::info!(donor = %donor.name, blood_group = %donor.blood_group, "donor selected");
        self.selected = Some(donor);
        true
    }

    pub fn deselect(&mut self) {
        if self.selected.take().is_some() {
            self.routes.clear();
            self.navigation.on_route_lost();
        }
    }

    /// Enters or leaves navigation mode. Needs a computed route to enter.
    pub fn toggle_navigation(&mut self) -> bool {
        let summary = self.routes.summary();
        self.navigation.toggle(summary.as_ref())
    }

    pub fn handle_tracker_event(&mut self, event: TrackerEvent) {
        match event {
            TrackerEvent::Update(sample) => self.on_position(sample),
            TrackerEvent::Error(GeolocationError::PermissionDenied) => {
                tracing::warn!("location permission denied");
                self.user_position = None;
                self.banner = Some(LOCATION_DENIED_BANNER.to_string());
            }
            TrackerEvent::Error(err) => {
                tracing::warn!(error = %err, "position fix failed; still listening");
            }
        }
    }

    fn on_position(&mut self, sample: PositionSample) {
        let moved = self
            .user_position
            .is_none_or(|previous| previous.coordinate != sample.coordinate);
        self.user_position = Some(sample);
        if self.banner.as_deref() == Some(LOCATION_DENIED_BANNER) {
            self.banner = None;
        }

        if moved {
            if let Some(destination) = self.selected.as_ref().map(|d| d.coordinate) {
                self.request_route(sample.coordinate, destination);
            }
        }
        match self.search.on_position(&sample) {
            Ok(pending) => self.pending_searches.push(pending),
            Err(reason) => tracing::trace!(?reason, "no proximity refresh"),
        }
    }

    fn request_route(&mut self, origin: Coordinate, destination: Coordinate) {
        self.pending_routes
            .push(self.routes.set_route(origin, destination).boxed());
    }

    pub fn handle_route_outcome(&mut self, outcome: RouteOutcome) {
        match outcome {
            RouteOutcome::Applied(summary) => self.navigation.on_route_changed(&summary),
            RouteOutcome::Unavailable(_) => self.navigation.on_route_lost(),
            RouteOutcome::Superseded => {}
        }
    }

    pub fn handle_search_response(&mut self, response: SearchResponse) -> SearchOutcome {
        self.search.apply(response)
    }

    #[must_use]
    pub fn snapshot(&self) -> MapSnapshot {
        let center = match (self.navigation.is_active(), self.user_position) {
            (true, Some(sample)) => sample.coordinate,
            _ => self.search.center(),
        };

        let mut markers = Vec::with_capacity(self.search.donors().len() + 1);
        if let Some(sample) = self.user_position {
            markers.push(Marker {
                kind: MarkerKind::User,
                coordinate: sample.coordinate,
                label: USER_MARKER_LABEL.to_string(),
                popup: USER_MARKER_LABEL.to_string(),
                selected: false,
            });
        }
        markers.extend(self.search.donors().iter().map(|donor| Marker {
            kind: MarkerKind::Donor,
            coordinate: donor.coordinate,
            label: donor.blood_group.to_string(),
            popup: format!(
                "{}\nBlood Group: {}\nContact: {}",
                donor.name, donor.blood_group, donor.contact
            ),
            selected: self.selected.as_ref() == Some(donor),
        }));

        MapSnapshot {
            center,
            zoom: self.zoom,
            center_tile_url: tile_url(&self.tile_template, tile_for(center, self.zoom)),
            markers,
            route: self.routes.overlay().map(|overlay| RouteView {
                destination: overlay.destination,
                label: overlay.summary.label(),
                popup_anchor: overlay.popup_anchor,
                geometry: overlay.geometry,
            }),
            navigation: self.navigation.panel(),
            bearing_degrees: self.navigation.bearing(),
            search_label: self.search.button_label(),
            search_error: self.search.last_error().map(str::to_string),
            banner: self.banner.clone(),
        }
    }

    /// Waits for every in-flight search and route and applies them, without
    /// listening to any input.
    pub async fn settle(&mut self) {
        loop {
            tokio::select! {
                Some(outcome) = self.pending_routes.next(), if !self.pending_routes.is_empty() => {
                    self.handle_route_outcome(outcome);
                }
                Some(response) = self.pending_searches.next(), if !self.pending_searches.is_empty() => {
                    self.handle_search_response(response);
                }
                else => break,
            }
        }
    }

    /// Runs the map until [`MapCommand::Shutdown`], or until the command
    /// channel and the position watch have both closed and nothing is in
    /// flight. A snapshot is published after every event.
    ///
    /// Every subscription is released on the way out, whichever way the loop
    /// ends. Returns the final snapshot.
    pub async fn run(
        &mut self,
        mut positions: Option<PositionWatch>,
        mut commands: mpsc::Receiver<MapCommand>,
        snapshots: &watch::Sender<MapSnapshot>,
    ) -> MapSnapshot {
        let mut commands_open = true;
        snapshots.send_replace(self.snapshot());

        // Tears down even when this future is dropped mid-loop.
        let mut guard = TeardownOnDrop(&mut *self);
        let view = &mut *guard.0;
        loop {
            if !commands_open && positions.is_none() && !view.has_pending_work() {
                break;
            }

            tokio::select! {
                command = commands.recv(), if commands_open => match command {
                    Some(command) => {
                        if !view.handle_command(command) {
                            break;
                        }
                    }
                    None => commands_open = false,
                },
                event = next_tracker_event(&mut positions) => match event {
                    Some(event) => view.handle_tracker_event(event),
                    None => {
                        tracing::debug!("position watch closed");
                        positions = None;
                    }
                },
                Some(outcome) = view.pending_routes.next(), if !view.pending_routes.is_empty() => {
                    view.handle_route_outcome(outcome);
                }
                Some(response) = view.pending_searches.next(), if !view.pending_searches.is_empty() => {
                    view.handle_search_response(response);
                }
                heading = view.navigation.next_heading() => view.navigation.on_heading(heading),
            }

            snapshots.send_replace(view.snapshot());
        }

        drop(positions);
        drop(guard);
        let last = self.snapshot();
        snapshots.send_replace(last.clone());
        last
    }
}

struct TeardownOnDrop<'a, R, G, E>(&'a mut MapView<R, G, E>);

impl<R, G, E> Drop for TeardownOnDrop<'_, R, G, E> {
    fn drop(&mut self) {
        self.0.teardown();
    }
}

async fn next_tracker_event(watch: &mut Option<PositionWatch>) -> Option<TrackerEvent> {
    match watch {
        Some(watch) => watch.next().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "map_view_test.rs"]
mod tests;
