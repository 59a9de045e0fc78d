//! Driving routes from an OSRM `route/v1` HTTP endpoint.

mod instructions;
mod response;

use std::time::Duration;

use bloodbuddy_core::Coordinate;
use reqwest::{Client, Url};

use crate::error::ClientError;
use crate::services::{RouteInstruction, RoutePlan, RoutingEngine};

use instructions::{instruction_text, maneuver_kind};
use response::{OsrmRoute, RouteResponse};

const PROFILE: &str = "driving";

pub struct OsrmClient {
    client: Client,
    base_url: Url,
}

impl OsrmClient {
    /// Creates a routing client for the OSRM server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built
    /// or [`ClientError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, user_agent: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { client, base_url })
    }

    fn route_url(&self, origin: Coordinate, destination: Coordinate) -> Result<Url, ClientError> {
        // OSRM takes `lon,lat` pairs separated by `;`.
        let path = format!(
            "route/v1/{PROFILE}/{},{};{},{}",
            origin.longitude, origin.latitude, destination.longitude, destination.latitude
        );
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("overview", "full")
            .append_pair("geometries", "geojson")
            .append_pair("steps", "true");
        Ok(url)
    }
}

fn to_coordinate(lon_lat: [f64; 2]) -> Coordinate {
    Coordinate::new(lon_lat[1], lon_lat[0])
}

fn into_plan(route: OsrmRoute) -> RoutePlan {
    let instructions = route
        .legs
        .into_iter()
        .flat_map(|leg| leg.steps)
        .map(|step| {
            let modifier = step.maneuver.modifier.as_deref();
            let maneuver = maneuver_kind(&step.maneuver.kind, modifier);
            RouteInstruction {
                text: instruction_text(
                    maneuver,
                    &step.maneuver.kind,
                    modifier,
                    &step.name,
                    step.maneuver.exit,
                ),
                maneuver,
                anchor: to_coordinate(step.maneuver.location),
            }
        })
        .collect();

    RoutePlan {
        distance_m: route.distance,
        duration_s: route.duration,
        geometry: route
            .geometry
            .coordinates
            .into_iter()
            .map(to_coordinate)
            .collect(),
        instructions,
    }
}

impl RoutingEngine for OsrmClient {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RoutePlan, ClientError> {
        let url = self.route_url(origin, destination)?;
        tracing::debug!(%origin, %destination, "requesting route");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // OSRM reports "no route" as a 400 with a JSON body, so parse before
        // looking at the status.
        let parsed: RouteResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(ClientError::Deserialize {
                    context: url.to_string(),
                    source: e,
                })
            }
            Err(_) => {
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message: format!("routing engine returned HTTP {status}"),
                })
            }
        };

        if parsed.code != "Ok" {
            let reason = parsed.message.unwrap_or(parsed.code);
            tracing::warn!(%origin, %destination, %reason, "routing engine found no route");
            return Err(ClientError::NoRoute(reason));
        }

        let route = parsed
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::NoRoute("empty route list".to_string()))?;
        Ok(into_plan(route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_url_uses_lon_lat_order() {
        let client = OsrmClient::new("https://router.example.com/", "test", 5).unwrap();
        let url = client
            .route_url(Coordinate::new(20.9374, 77.7796), Coordinate::new(20.932, 77.785))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://router.example.com/route/v1/driving/77.7796,20.9374;77.785,20.932?overview=full&geometries=geojson&steps=true"
        );
    }
}
