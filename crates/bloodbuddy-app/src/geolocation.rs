//! Continuous device position sampling.
//!
//! A [`PositionSource`] is the platform sensor. [`GeolocationTracker::start`]
//! turns its raw stream into [`TrackerEvent`]s with per-attempt timeouts and
//! returns a [`PositionWatch`] handle; dropping the handle releases the
//! platform watch.

use std::time::Duration;

use bloodbuddy_core::PositionSample;
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::error::GeolocationError;

/// Acquisition timeout used when the configuration does not override it.
pub const DEFAULT_SAMPLE_TIMEOUT: Duration = Duration::from_secs(10);

const EVENT_BUFFER: usize = 32;

/// Raw readings from a platform sensor.
pub type PositionStream = BoxStream<'static, Result<PositionSample, GeolocationError>>;

/// Options handed to the platform when a watch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerOptions {
    pub high_accuracy: bool,
    /// How long one acquisition attempt may take before it is reported as
    /// [`GeolocationError::Timeout`].
    pub timeout: Duration,
    /// Largest age of a cached fix the platform may hand back. Zero asks for
    /// a fresh reading every time.
    pub maximum_age: Duration,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: DEFAULT_SAMPLE_TIMEOUT,
            maximum_age: Duration::ZERO,
        }
    }
}

impl TrackerOptions {
    #[must_use]
    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            ..Self::default()
        }
    }
}

/// A device position sensor.
pub trait PositionSource: Send + Sync {
    /// Starts a platform watch. The watch lives exactly as long as the
    /// returned stream.
    fn watch(&self, options: &TrackerOptions) -> PositionStream;
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    Update(PositionSample),
    Error(GeolocationError),
}

/// Handle to a running watch. Stopping or dropping it ends sampling.
#[derive(Debug)]
pub struct PositionWatch {
    events: mpsc::Receiver<TrackerEvent>,
    task: JoinHandle<()>,
}

impl PositionWatch {
    /// Next update or error; `None` once the source has closed.
    pub async fn next(&mut self) -> Option<TrackerEvent> {
        self.events.recv().await
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct GeolocationTracker;

impl GeolocationTracker {
    /// Begins continuous sampling from `source`.
    ///
    /// Each acquisition attempt that fails (permission refused, timeout,
    /// sensor error) yields exactly one [`TrackerEvent::Error`]; the tracker
    /// keeps listening afterwards. Samples whose timestamp is older than the
    /// last delivered one are discarded.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S>(source: &S, options: TrackerOptions) -> PositionWatch
    where
        S: PositionSource + ?Sized,
    {
        let stream = source.watch(&options);
        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let task = tokio::spawn(pump(stream, options.timeout, tx));
        PositionWatch { events, task }
    }
}

async fn pump(mut stream: PositionStream, timeout: Duration, tx: mpsc::Sender<TrackerEvent>) {
    let mut last_timestamp: Option<DateTime<Utc>> = None;

    loop {
        let event = match tokio::time::timeout(timeout, stream.next()).await {
            Err(_) => TrackerEvent::Error(GeolocationError::Timeout),
            Ok(None) => break,
            Ok(Some(Err(err))) => TrackerEvent::Error(err),
            Ok(Some(Ok(sample))) => {
                if last_timestamp.is_some_and(|last| sample.timestamp < last) {
                    tracing::debug!(timestamp = %sample.timestamp, "dropping out-of-order position sample");
                    continue;
                }
                last_timestamp = Some(sample.timestamp);
                TrackerEvent::Update(sample)
            }
        };
        if tx.send(event).await.is_err() {
            break;
        }
    }
}

/// One fresh fix: the first sample of a new watch, bounded by
/// `options.timeout`.
///
/// # Errors
///
/// Returns the sensor's error, [`GeolocationError::Timeout`] when no reading
/// arrives in time, or [`GeolocationError::Unavailable`] if the source closes
/// without producing one.
pub async fn current_position<S>(
    source: &S,
    options: TrackerOptions,
) -> Result<PositionSample, GeolocationError>
where
    S: PositionSource + ?Sized,
{
    let mut stream = source.watch(&options);
    match tokio::time::timeout(options.timeout, stream.next()).await {
        Err(_) => Err(GeolocationError::Timeout),
        Ok(None) => Err(GeolocationError::Unavailable(
            "position source closed".to_string(),
        )),
        Ok(Some(reading)) => reading,
    }
}

/// A [`PositionSource`] fed by hand: readings published on it are seen by
/// every watch that is open at the time.
#[derive(Debug, Clone)]
pub struct ChannelPositionSource {
    sender: broadcast::Sender<Result<PositionSample, GeolocationError>>,
}

impl ChannelPositionSource {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Delivers a reading to the open watches and returns how many saw it.
    pub fn publish(&self, reading: Result<PositionSample, GeolocationError>) -> usize {
        self.sender.send(reading).unwrap_or(0)
    }

    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl PositionSource for ChannelPositionSource {
    fn watch(&self, _options: &TrackerOptions) -> PositionStream {
        let receiver = self.sender.subscribe();
        futures::stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(reading) => return Some((reading, receiver)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "position watch lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}

#[cfg(test)]
#[path = "geolocation_test.rs"]
mod tests;
