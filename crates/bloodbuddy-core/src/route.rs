//! Route summaries as shown by the map overlay and the navigation panel.

use serde::{Deserialize, Serialize};

/// Structured turn type for a route step.
///
/// Chosen by the routing client from the engine's maneuver data, so the view
/// never has to guess a direction from instruction text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverKind {
    Depart,
    Straight,
    SlightLeft,
    Left,
    SharpLeft,
    SlightRight,
    Right,
    SharpRight,
    UTurn,
    Roundabout,
    Merge,
    Fork,
    Arrive,
}

impl ManeuverKind {
    /// Arrow glyph for the navigation panel.
    #[must_use]
    pub fn glyph(self) -> &'static str {
        match self {
            ManeuverKind::Depart | ManeuverKind::Straight | ManeuverKind::Merge => "↑",
            ManeuverKind::SlightLeft | ManeuverKind::Fork => "↖",
            ManeuverKind::Left | ManeuverKind::SharpLeft => "←",
            ManeuverKind::SlightRight => "↗",
            ManeuverKind::Right | ManeuverKind::SharpRight => "→",
            ManeuverKind::UTurn => "↩",
            ManeuverKind::Roundabout => "⟳",
            ManeuverKind::Arrive => "⚑",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub text: String,
    pub maneuver: ManeuverKind,
}

/// Distance, ETA and ordered steps of the route from the user to the
/// selected donor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub eta_minutes: u32,
    pub steps: Vec<RouteStep>,
}

impl RouteSummary {
    /// Builds a summary from the engine's totals in meters and seconds.
    #[must_use]
    pub fn from_totals(distance_m: f64, duration_s: f64, steps: Vec<RouteStep>) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let eta_minutes = (duration_s.max(0.0) / 60.0).round() as u32;
        Self {
            distance_km: distance_m.max(0.0) / 1000.0,
            eta_minutes,
            steps,
        }
    }

    /// The step the navigation panel shows as current.
    #[must_use]
    pub fn current_step(&self) -> Option<&RouteStep> {
        self.steps.first()
    }

    /// Popup label for the route overlay, e.g. `🚗 2.41 km • ⏱ 7 mins`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("🚗 {:.2} km • ⏱ {} mins", self.distance_km, self.eta_minutes)
    }
}
