pub mod app_config;
pub mod config;
pub mod donors;
pub mod geo;
pub mod registration;
pub mod route;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use donors::{BloodGroup, Donor, ResultLimit, SearchFilter};
pub use geo::{haversine_km, Coordinate, PositionSample, EARTH_RADIUS_KM};
pub use registration::{RegistrationForm, ValidatedRegistration, ValidationError};
pub use route::{ManeuverKind, RouteStep, RouteSummary};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid blood group: {0}")]
    InvalidBloodGroup(String),

    #[error("invalid result limit {0}: expected one of 10, 20, 50, 100")]
    InvalidResultLimit(u32),
}
