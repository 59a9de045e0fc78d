//! In-memory collaborators shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use bloodbuddy_client::{
    ClientError, DonorRegistry, Geocoder, NearbyQuery, NewDonor, RegistryAck, RouteInstruction,
    RoutePlan, RoutingEngine,
};
use bloodbuddy_core::{
    BloodGroup, Coordinate, Donor, ManeuverKind, PositionSample, EARTH_RADIUS_KM,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::stream::StreamExt;
use tokio::sync::{broadcast, oneshot};

use crate::error::GeolocationError;
use crate::geolocation::{PositionSource, PositionStream, TrackerOptions};
use crate::navigation::{HeadingStream, OrientationSource, SpeechSynthesizer};

pub(crate) const AMRAVATI: Coordinate = Coordinate::new(20.9374, 77.7796);

/// `km` due north of `from`.
pub(crate) fn north_of(from: Coordinate, km: f64) -> Coordinate {
    Coordinate::new(from.latitude + (km / EARTH_RADIUS_KM).to_degrees(), from.longitude)
}

pub(crate) fn at_minute(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
}

pub(crate) fn sample(coordinate: Coordinate, minute: i64) -> PositionSample {
    PositionSample::new(coordinate, at_minute(minute))
}

pub(crate) fn donor(name: &str, blood_group: BloodGroup, coordinate: Coordinate) -> Donor {
    Donor {
        name: name.to_string(),
        blood_group,
        contact: "9876543210".to_string(),
        city: "Amravati".to_string(),
        coordinate,
        distance_km: Some(AMRAVATI.distance_km(&coordinate)),
    }
}

/// Registry that answers `nearby` from a script and records every call.
#[derive(Default)]
pub(crate) struct FakeRegistry {
    nearby_results: Mutex<VecDeque<Result<Vec<Donor>, ClientError>>>,
    add_results: Mutex<VecDeque<Result<RegistryAck, ClientError>>>,
    pub queries: Mutex<Vec<NearbyQuery>>,
    pub added: Mutex<Vec<NewDonor>>,
}

impl FakeRegistry {
    pub(crate) fn push_nearby(&self, result: Result<Vec<Donor>, ClientError>) {
        self.nearby_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_add(&self, result: Result<RegistryAck, ClientError>) {
        self.add_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

impl DonorRegistry for FakeRegistry {
    async fn add_donor(&self, donor: &NewDonor) -> Result<RegistryAck, ClientError> {
        self.added.lock().unwrap().push(donor.clone());
        self.add_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(RegistryAck {
                    message: "Donor added successfully".to_string(),
                    id: Some("1".to_string()),
                })
            })
    }

    async fn nearby(&self, query: &NearbyQuery) -> Result<Vec<Donor>, ClientError> {
        self.queries.lock().unwrap().push(*query);
        self.nearby_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub(crate) fn registry_down() -> ClientError {
    ClientError::Api {
        status: 503,
        message: "registry unavailable".to_string(),
    }
}

#[derive(Default)]
pub(crate) struct FakeGeocoder {
    pub places: HashMap<String, Coordinate>,
    pub address: Option<String>,
}

impl FakeGeocoder {
    pub(crate) fn with_place(mut self, query: &str, coordinate: Coordinate) -> Self {
        self.places.insert(query.to_string(), coordinate);
        self
    }

    pub(crate) fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }
}

impl Geocoder for FakeGeocoder {
    async fn forward(&self, address: &str) -> Result<Coordinate, ClientError> {
        self.places
            .get(address.trim())
            .copied()
            .ok_or_else(|| ClientError::NotFound(address.to_string()))
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<String, ClientError> {
        self.address
            .clone()
            .ok_or_else(|| ClientError::NotFound(coordinate.to_string()))
    }
}

/// A two-step plan ending at `destination`, with the destination's
/// latitude baked into the first instruction so tests can tell plans apart.
pub(crate) fn plan_to(destination: Coordinate, distance_m: f64) -> RoutePlan {
    RoutePlan {
        distance_m,
        duration_s: 600.0,
        geometry: vec![AMRAVATI, north_of(AMRAVATI, 0.1), destination],
        instructions: vec![
            RouteInstruction {
                text: format!("Head out towards {:.4}", destination.latitude),
                maneuver: ManeuverKind::Depart,
                anchor: AMRAVATI,
            },
            RouteInstruction {
                text: "You have arrived at your destination".to_string(),
                maneuver: ManeuverKind::Arrive,
                anchor: destination,
            },
        ],
    }
}

type Gate = oneshot::Receiver<Result<RoutePlan, ClientError>>;

#[derive(Default)]
struct GatedState {
    gates: Mutex<Vec<(Coordinate, Gate)>>,
    calls: Mutex<Vec<(Coordinate, Coordinate)>>,
}

/// Routing engine whose answers are released by the test, per destination,
/// in whatever order the test chooses. Destinations without a gate are
/// answered at once. Clones share their gates.
#[derive(Clone, Default)]
pub(crate) struct GatedEngine {
    state: Arc<GatedState>,
}

impl GatedEngine {
    pub(crate) fn gate(
        &self,
        destination: Coordinate,
    ) -> oneshot::Sender<Result<RoutePlan, ClientError>> {
        let (tx, rx) = oneshot::channel();
        self.state.gates.lock().unwrap().push((destination, rx));
        tx
    }

    pub(crate) fn calls(&self) -> Vec<(Coordinate, Coordinate)> {
        self.state.calls.lock().unwrap().clone()
    }
}

impl RoutingEngine for GatedEngine {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RoutePlan, ClientError> {
        self.state.calls.lock().unwrap().push((origin, destination));
        let gate = {
            let mut gates = self.state.gates.lock().unwrap();
            let index = gates.iter().position(|(d, _)| *d == destination);
            index.map(|i| gates.remove(i).1)
        };
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ClientError::NoRoute("gate dropped".to_string()))),
            None => Ok(plan_to(destination, 1500.0)),
        }
    }
}

/// Speech engine that records what it was asked to do.
#[derive(Default)]
pub(crate) struct RecordingSpeech {
    pub log: Mutex<Vec<String>>,
}

impl RecordingSpeech {
    pub(crate) fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn spoken(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix("speak:").map(str::to_string))
            .collect()
    }
}

impl SpeechSynthesizer for RecordingSpeech {
    fn speak(&self, text: &str) {
        self.log.lock().unwrap().push(format!("speak:{text}"));
    }

    fn cancel(&self) {
        self.log.lock().unwrap().push("cancel".to_string());
    }
}

/// Compass fed through a broadcast channel.
pub(crate) struct FakeCompass {
    pub sender: broadcast::Sender<f64>,
}

impl FakeCompass {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    pub(crate) fn listeners(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl OrientationSource for FakeCompass {
    fn subscribe(&self) -> Option<HeadingStream> {
        let rx = self.sender.subscribe();
        Some(
            futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.ok().map(|heading| (heading, rx))
            })
            .boxed(),
        )
    }
}

/// Position sensor that plays back a fixed list of readings on every watch.
pub(crate) struct ScriptedSource(pub Vec<Result<PositionSample, GeolocationError>>);

impl PositionSource for ScriptedSource {
    fn watch(&self, _options: &TrackerOptions) -> PositionStream {
        futures::stream::iter(self.0.clone()).boxed()
    }
}
