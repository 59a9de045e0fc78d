use bloodbuddy_client::ClientError;
use bloodbuddy_core::ValidationError;
use thiserror::Error;

/// Why a position fix could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("timed out waiting for a position fix")]
    Timeout,

    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// User-facing failures. Every one of them is recovered where it happens;
/// none ends the session.
///
/// A missing compass or speech engine is not represented here: those
/// collaborators are optional and their absence only disables a feature.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    /// Geolocation was refused; the user has to type an address instead.
    #[error("location permission denied")]
    PermissionDenied,

    /// The geocoder had no match, or the location text was blank.
    #[error("{0}")]
    LookupNotFound(String),

    /// The registry call failed or answered with a non-success status.
    #[error("{0}")]
    Registry(String),

    /// The routing engine found no path or could not be reached.
    #[error("route unavailable: {0}")]
    RouteUnavailable(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AppError {
    /// Maps a registry client failure, keeping the server's message.
    pub(crate) fn registry(err: &ClientError) -> Self {
        AppError::Registry(err.to_string())
    }

    /// Maps a geocoder failure for `query`.
    pub(crate) fn lookup(query: &str, err: &ClientError) -> Self {
        match err {
            ClientError::NotFound(_) => AppError::LookupNotFound(query.to_string()),
            other => AppError::LookupNotFound(format!("{query}: {other}")),
        }
    }
}
