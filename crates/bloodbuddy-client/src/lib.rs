//! Clients for the services the donor-discovery front end talks to: the
//! donor registry, the geocoder, the routing engine and the tile server.

pub mod error;
pub mod geocoder;
pub mod registry;
pub mod routing;
pub mod services;
pub mod tiles;

pub use error::ClientError;
pub use geocoder::NominatimClient;
pub use registry::RegistryClient;
pub use routing::OsrmClient;
pub use services::{
    DonorRegistry, Geocoder, NearbyQuery, NewDonor, RegistryAck, RouteInstruction, RoutePlan,
    RoutingEngine,
};
pub use tiles::{tile_for, tile_url, TileIndex};
