//! HTTP client for the donor registry API.
//!
//! Two endpoints: `POST donors/add` and `GET donors/nearby`. Non-success
//! responses surface the server's own message as [`ClientError::Api`] so the
//! caller can show it verbatim.

use std::time::Duration;

use bloodbuddy_core::{BloodGroup, Coordinate, Donor};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::error::ClientError;
use crate::services::{DonorRegistry, NearbyQuery, NewDonor, RegistryAck};

const REGISTRATION_FAILED: &str = "Registration failed";

/// Client for the donor registry REST API.
pub struct RegistryClient {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    message: String,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NearbyResponse {
    Envelope { donors: Vec<DonorRecord> },
    Bare(Vec<DonorRecord>),
}

#[derive(Debug, Deserialize)]
struct DonorRecord {
    name: String,
    blood_group: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    contact: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    distance_km: Option<f64>,
}

impl RegistryClient {
    /// Creates a client for the registry at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(base_url: &str, user_agent: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so that `Url::join` appends to the
        // base path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    fn nearby_url(&self, query: &NearbyQuery) -> Result<Url, ClientError> {
        let mut url = self.endpoint("donors/nearby")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("lat", &query.center.latitude.to_string());
            pairs.append_pair("lon", &query.center.longitude.to_string());
            if let Some(group) = query.filter.blood_group {
                pairs.append_pair("blood_group", group.as_str());
            }
            pairs.append_pair("limit", &query.filter.limit.get().to_string());
        }
        Ok(url)
    }
}

/// Pulls a human-readable message out of an error body: `message` first,
/// then a string `detail` (FastAPI's shape).
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("detail"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

impl DonorRecord {
    fn into_donor(self) -> Option<Donor> {
        match self.blood_group.parse::<BloodGroup>() {
            Ok(blood_group) => Some(Donor {
                name: self.name,
                blood_group,
                contact: self.contact,
                city: self.city,
                coordinate: Coordinate::new(self.latitude, self.longitude),
                distance_km: self.distance_km,
            }),
            Err(e) => {
                tracing::warn!(donor = %self.name, error = %e, "skipping donor with unknown blood group");
                None
            }
        }
    }
}

impl DonorRegistry for RegistryClient {
    async fn add_donor(&self, donor: &NewDonor) -> Result<RegistryAck, ClientError> {
        let url = self.endpoint("donors/add")?;
        tracing::info!(blood_group = %donor.blood_group, "registering donor");

        let response = self.client.post(url.clone()).json(donor).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| REGISTRATION_FAILED.to_string());
            tracing::warn!(status = status.as_u16(), %message, "registry rejected donor");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let ack: AddResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;
        Ok(RegistryAck {
            message: ack.message,
            id: ack.id,
        })
    }

    async fn nearby(&self, query: &NearbyQuery) -> Result<Vec<Donor>, ClientError> {
        let url = self.nearby_url(query)?;
        tracing::debug!(%url, "querying nearby donors");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // The registry answers 404 when it has no donors at all.
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(&body)
                    .unwrap_or_else(|| format!("registry returned HTTP {status}")),
            });
        }

        let parsed: NearbyResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;
        let records = match parsed {
            NearbyResponse::Envelope { donors } | NearbyResponse::Bare(donors) => donors,
        };
        Ok(records
            .into_iter()
            .filter_map(DonorRecord::into_donor)
            .collect())
    }
}
