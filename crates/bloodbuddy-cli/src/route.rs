//! `bloodbuddy route`: one route through the overlay controller.

use bloodbuddy_app::{RouteOutcome, RouteOverlayController};
use bloodbuddy_core::{AppConfig, Coordinate};
use clap::Args;

use crate::output::print_route;

#[derive(Debug, Args)]
pub(crate) struct RouteArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub from_lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub from_lon: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub to_lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub to_lon: f64,
}

/// Prints the route summary and its turn-by-turn steps.
///
/// # Errors
///
/// Returns an error if the routing client cannot be built or no route exists.
pub(crate) async fn run_route(config: &AppConfig, args: &RouteArgs) -> anyhow::Result<()> {
    let origin = Coordinate::new(args.from_lat, args.from_lon);
    let destination = Coordinate::new(args.to_lat, args.to_lon);
    if !origin.is_valid() || !destination.is_valid() {
        anyhow::bail!("coordinates out of range: {origin} -> {destination}");
    }

    let routes = RouteOverlayController::new(crate::routing_client(config)?);
    match routes.set_route(origin, destination).await {
        RouteOutcome::Applied(summary) => {
            print_route(&summary);
            if let Some(anchor) = routes.overlay().and_then(|o| o.popup_anchor) {
                tracing::debug!(%anchor, "route label anchor");
            }
            Ok(())
        }
        RouteOutcome::Unavailable(err) => Err(err.into()),
        RouteOutcome::Superseded => anyhow::bail!("route request was superseded"),
    }
}
