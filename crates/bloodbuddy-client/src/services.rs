//! Collaborator interfaces the view layer is written against.
//!
//! The HTTP clients in this crate implement them for production; tests plug
//! in in-memory fakes.

use std::future::Future;

use bloodbuddy_core::{BloodGroup, Coordinate, Donor, ManeuverKind, SearchFilter};
use serde::Serialize;

use crate::error::ClientError;

/// Payload of the registry's `add` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDonor {
    pub name: String,
    pub blood_group: BloodGroup,
    /// Free-text address; the registry stores it as the donor's city.
    pub city: String,
    pub contact: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Successful `add` response.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryAck {
    pub message: String,
    pub id: Option<String>,
}

/// Parameters of a nearby-donor search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQuery {
    pub center: Coordinate,
    pub filter: SearchFilter,
}

/// One turn instruction from the routing engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInstruction {
    pub text: String,
    pub maneuver: ManeuverKind,
    /// Where on the route the instruction applies.
    pub anchor: Coordinate,
}

/// A computed path between exactly two coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub distance_m: f64,
    pub duration_s: f64,
    /// Polyline of the route, origin first.
    pub geometry: Vec<Coordinate>,
    pub instructions: Vec<RouteInstruction>,
}

pub trait DonorRegistry: Send + Sync {
    /// Registers a new donor.
    fn add_donor(
        &self,
        donor: &NewDonor,
    ) -> impl Future<Output = Result<RegistryAck, ClientError>> + Send;

    /// Donors nearest to `query.center`, closest first, at most
    /// `query.filter.limit` of them.
    fn nearby(
        &self,
        query: &NearbyQuery,
    ) -> impl Future<Output = Result<Vec<Donor>, ClientError>> + Send;
}

pub trait Geocoder: Send + Sync {
    /// Free-text address to coordinate.
    fn forward(&self, address: &str)
        -> impl Future<Output = Result<Coordinate, ClientError>> + Send;

    /// Coordinate to a human-readable address.
    fn reverse(
        &self,
        coordinate: Coordinate,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

pub trait RoutingEngine: Send + Sync {
    /// Computes a route from `origin` to `destination`.
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> impl Future<Output = Result<RoutePlan, ClientError>> + Send;
}
