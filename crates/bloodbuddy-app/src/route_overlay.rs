//! The single route drawn from the user to the selected donor.
//!
//! Requests are numbered. Only the response to the most recently issued
//! request may touch the overlay; anything older is dropped on arrival, and
//! its network call is aborted as soon as it is superseded.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bloodbuddy_client::{ClientError, RoutePlan, RoutingEngine};
use bloodbuddy_core::{Coordinate, RouteStep, RouteSummary};
use futures::future::{AbortHandle, Abortable};

use crate::error::AppError;

/// What is currently drawn on the map for the active route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOverlay {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub summary: RouteSummary,
    pub geometry: Vec<Coordinate>,
    /// Middle vertex of the geometry, where the distance/time popup sits.
    pub popup_anchor: Option<Coordinate>,
}

impl RouteOverlay {
    fn from_plan(origin: Coordinate, destination: Coordinate, plan: RoutePlan) -> Self {
        let steps = plan
            .instructions
            .into_iter()
            .map(|i| RouteStep {
                text: i.text,
                maneuver: i.maneuver,
            })
            .collect();
        let popup_anchor = plan.geometry.get(plan.geometry.len() / 2).copied();
        Self {
            origin,
            destination,
            summary: RouteSummary::from_totals(plan.distance_m, plan.duration_s, steps),
            geometry: plan.geometry,
            popup_anchor,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// The response was the latest and is now on the map.
    Applied(RouteSummary),
    /// A newer request (or a teardown) was issued first; nothing changed.
    Superseded,
    /// The latest request failed and the overlay has been cleared.
    Unavailable(AppError),
}

struct Inner<E> {
    engine: E,
    latest: AtomicU64,
    /// Abort handle of the latest request, tagged with its sequence number.
    in_flight: Mutex<Option<(u64, AbortHandle)>>,
    /// Lock order: `active` before `in_flight`.
    active: Mutex<Option<RouteOverlay>>,
}

/// Owns the route overlay of one map. Clones share the same overlay.
pub struct RouteOverlayController<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for RouteOverlayController<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<E> RouteOverlayController<E> {
    pub fn new(engine: E) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                latest: AtomicU64::new(0),
                in_flight: Mutex::new(None),
                active: Mutex::new(None),
            }),
        }
    }

    /// Removes the overlay and detaches any request still in flight.
    pub fn clear(&self) {
        let mut active = lock(&self.inner.active);
        let seq = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((_, handle)) = lock(&self.inner.in_flight).take() {
            handle.abort();
        }
        if active.take().is_some() {
            tracing::debug!(seq, "route overlay cleared");
        }
    }

    #[must_use]
    pub fn overlay(&self) -> Option<RouteOverlay> {
        lock(&self.inner.active).clone()
    }

    #[must_use]
    pub fn summary(&self) -> Option<RouteSummary> {
        lock(&self.inner.active).as_ref().map(|o| o.summary.clone())
    }
}

impl<E: RoutingEngine + 'static> RouteOverlayController<E> {
    /// Requests a route from `origin` to `destination`.
    ///
    /// The request is numbered when this is called, not when the returned
    /// future is first polled, so calling `set_route` twice in a row always
    /// makes the second call the winner. The overlay in place stays visible
    /// until the new response is applied.
    pub fn set_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> impl Future<Output = RouteOutcome> + Send + 'static {
        let seq = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let (handle, registration) = AbortHandle::new_pair();
        if let Some((_, previous)) = lock(&self.inner.in_flight).replace((seq, handle)) {
            previous.abort();
        }
        tracing::debug!(seq, %origin, %destination, "route requested");

        let inner = Arc::clone(&self.inner);
        async move {
            match Abortable::new(inner.engine.route(origin, destination), registration).await {
                Ok(result) => inner.apply(seq, origin, destination, result),
                Err(_aborted) => {
                    tracing::debug!(seq, "route request aborted");
                    RouteOutcome::Superseded
                }
            }
        }
    }
}

impl<E> Inner<E> {
    fn apply(
        &self,
        seq: u64,
        origin: Coordinate,
        destination: Coordinate,
        result: Result<RoutePlan, ClientError>,
    ) -> RouteOutcome {
        let mut active = lock(&self.active);
        let latest = self.latest.load(Ordering::SeqCst);
        if seq != latest {
            tracing::debug!(seq, latest, "dropping stale route response");
            return RouteOutcome::Superseded;
        }
        {
            let mut in_flight = lock(&self.in_flight);
            if in_flight.as_ref().is_some_and(|(tagged, _)| *tagged == seq) {
                in_flight.take();
            }
        }

        match result {
            Ok(plan) => {
                let overlay = RouteOverlay::from_plan(origin, destination, plan);
                let summary = overlay.summary.clone();
                tracing::debug!(
                    seq,
                    distance_km = summary.distance_km,
                    eta_minutes = summary.eta_minutes,
                    "route applied"
                );
                *active = Some(overlay);
                RouteOutcome::Applied(summary)
            }
            Err(err) => {
                *active = None;
                tracing::warn!(seq, %origin, %destination, error = %err, "route unavailable");
                RouteOutcome::Unavailable(AppError::RouteUnavailable(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
#[path = "route_overlay_test.rs"]
mod tests;
