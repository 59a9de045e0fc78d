//! Forward and reverse geocoding against a Nominatim-compatible service.

use std::time::Duration;

use bloodbuddy_core::Coordinate;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ClientError;
use crate::services::Geocoder;

pub struct NominatimClient {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    /// Nominatim returns coordinates as decimal strings.
    lat: String,
    lon: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<AddressParts>,
}

#[derive(Debug, Default, Deserialize)]
struct AddressParts {
    #[serde(default)]
    road: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl NominatimClient {
    /// Creates a geocoder client. Nominatim's usage policy requires a
    /// descriptive `user_agent`.
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

    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ClientError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("format", "json");
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ClientError> {
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

impl ReverseResponse {
    /// `display_name`, or `"road, city, country"` assembled from the address
    /// parts when the service left it out.
    fn into_label(self) -> Option<String> {
        if let Some(name) = self.display_name.filter(|n| !n.trim().is_empty()) {
            return Some(name);
        }
        let parts = self.address.unwrap_or_default();
        let present = [parts.road, parts.city, parts.country]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>();
        (!present.is_empty()).then(|| present.join(", "))
    }
}

fn parse_hit(hit: &SearchHit, query: &str) -> Result<Coordinate, ClientError> {
    let invalid = || ClientError::Api {
        status: 200,
        message: format!("geocoder returned malformed coordinates for '{query}'"),
    };
    let latitude = hit.lat.trim().parse::<f64>().map_err(|_| invalid())?;
    let longitude = hit.lon.trim().parse::<f64>().map_err(|_| invalid())?;
    let coordinate = Coordinate::new(latitude, longitude);
    if coordinate.is_valid() {
        Ok(coordinate)
    } else {
        Err(invalid())
    }
}

impl Geocoder for NominatimClient {
    async fn forward(&self, address: &str) -> Result<Coordinate, ClientError> {
        let query = address.trim();
        if query.is_empty() {
            return Err(ClientError::NotFound(address.to_string()));
        }
        let url = self.build_url("search", &[("q", query)])?;
        let hits: Vec<SearchHit> = self.get_json(&url).await?;
        let first = hits
            .first()
            .ok_or_else(|| ClientError::NotFound(query.to_string()))?;
        let coordinate = parse_hit(first, query)?;
        tracing::debug!(query, %coordinate, "geocoded address");
        Ok(coordinate)
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<String, ClientError> {
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();
        let url = self.build_url("reverse", &[("lat", &lat), ("lon", &lon)])?;
        let body: ReverseResponse = self.get_json(&url).await?;
        body.into_label()
            .ok_or_else(|| ClientError::NotFound(coordinate.to_string()))
    }
}
