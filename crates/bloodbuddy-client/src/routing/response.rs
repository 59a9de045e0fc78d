//! OSRM `route/v1` response shapes.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct RouteResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OsrmRoute {
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    pub geometry: LineString,
    #[serde(default)]
    pub legs: Vec<Leg>,
}

/// GeoJSON line string; positions are `[lon, lat]`.
#[derive(Debug, Deserialize)]
pub(super) struct LineString {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Leg {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Step {
    #[serde(default)]
    pub name: String,
    pub maneuver: Maneuver,
}

#[derive(Debug, Deserialize)]
pub(super) struct Maneuver {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub modifier: Option<String>,
    /// `[lon, lat]`.
    pub location: [f64; 2],
    #[serde(default)]
    pub exit: Option<u32>,
}
