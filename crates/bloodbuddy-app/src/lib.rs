//! View-model layer of the donor finder: position tracking, the donor
//! search screen with its proximity refresh, the route overlay, navigation
//! mode and the map view that composes them, plus the registration flow.
//!
//! Everything here is front-end agnostic. A renderer drives a [`MapView`]
//! through [`MapCommand`]s and draws the [`MapSnapshot`]s it publishes.

pub mod error;
pub mod geolocation;
pub mod map_view;
pub mod navigation;
pub mod refresh;
pub mod registration;
pub mod route_overlay;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AppError, GeolocationError};
pub use geolocation::{
    current_position, ChannelPositionSource, GeolocationTracker, PositionSource, PositionStream,
    PositionWatch, TrackerEvent, TrackerOptions,
};
pub use map_view::{MapCommand, MapSnapshot, MapView, Marker, MarkerKind, RouteView};
pub use navigation::{
    HeadingStream, NavigationController, NavigationPanel, NavigationState, OrientationSource,
    SpeechSynthesizer,
};
pub use refresh::{ProximityRefreshPolicy, RefreshDecision, SkipReason};
pub use registration::{LocationStatus, RegistrationFlow};
pub use route_overlay::{RouteOutcome, RouteOverlay, RouteOverlayController};
pub use search::{
    DonorRow, DonorSearch, PendingSearch, SearchLocation, SearchOutcome, SearchResponse,
    DEFAULT_CENTER, DEFAULT_ZOOM,
};
