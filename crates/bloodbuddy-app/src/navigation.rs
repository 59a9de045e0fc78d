//! Navigation mode: heading-up map rotation and spoken instructions.
//!
//! `Idle -> Active` needs a computed route. While active the controller
//! holds a compass subscription and narrates the first step of whatever
//! step list the latest route computation returned. Leaving the mode
//! releases the compass and silences the speech engine.

use std::sync::Arc;

use bloodbuddy_core::{ManeuverKind, RouteStep, RouteSummary};
use futures::stream::{BoxStream, StreamExt};

/// Compass headings in degrees clockwise from north.
pub type HeadingStream = BoxStream<'static, f64>;

pub trait OrientationSource: Send + Sync {
    /// Starts listening for heading changes. `None` when the device has no
    /// compass. Dropping the stream detaches the listener.
    fn subscribe(&self) -> Option<HeadingStream>;
}

pub trait SpeechSynthesizer: Send + Sync {
    fn speak(&self, text: &str);
    /// Stops the current utterance and drops anything queued.
    fn cancel(&self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    pub active: bool,
    pub current_step_index: usize,
    pub voice_enabled: bool,
    pub heading_degrees: f64,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            active: false,
            current_step_index: 0,
            voice_enabled: true,
            heading_degrees: 0.0,
        }
    }
}

/// The instruction banner shown while navigating.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationPanel {
    pub instruction: String,
    pub maneuver: ManeuverKind,
    pub glyph: &'static str,
    pub voice_enabled: bool,
}

pub struct NavigationController {
    orientation: Option<Arc<dyn OrientationSource>>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    state: NavigationState,
    heading: Option<HeadingStream>,
    current: Option<RouteStep>,
    narrated: Option<Vec<RouteStep>>,
}

impl NavigationController {
    #[must_use]
    pub fn new(
        orientation: Option<Arc<dyn OrientationSource>>,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            orientation,
            speech,
            state: NavigationState::default(),
            heading: None,
            current: None,
            narrated: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Whether a compass subscription is currently held.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.heading.is_some()
    }

    /// Enters or leaves navigation mode and returns the new `active` flag.
    ///
    /// Entering without a route is a no-op.
    pub fn toggle(&mut self, route: Option<&RouteSummary>) -> bool {
        if self.state.active {
            self.exit();
            return false;
        }
        let Some(route) = route else {
            tracing::debug!("navigation needs a route; ignoring toggle");
            return false;
        };

        self.state.active = true;
        self.state.current_step_index = 0;
        self.heading = self.orientation.as_ref().and_then(|o| o.subscribe());
        if self.heading.is_none() {
            tracing::debug!("no orientation sensor; map rotation disabled");
        }
        if self.speech.is_none() {
            tracing::debug!("no speech synthesizer; voice prompts disabled");
        }
        tracing::info!(steps = route.steps.len(), "navigation started");
        self.on_route_changed(route);
        true
    }

    /// Back to `Idle`: silence speech, drop the compass listener and reset to
    /// step 0. The voice preference survives.
    pub fn exit(&mut self) {
        if !self.state.active {
            return;
        }
        if let Some(speech) = &self.speech {
            speech.cancel();
        }
        self.heading = None;
        self.current = None;
        self.narrated = None;
        self.state = NavigationState {
            voice_enabled: self.state.voice_enabled,
            ..NavigationState::default()
        };
        tracing::info!("navigation stopped");
    }

    /// The selected donor or its route went away.
    pub fn on_route_lost(&mut self) {
        self.exit();
    }

    /// A route computation finished. Shows its first step and, with voice
    /// on, speaks it if the step list differs from the last one narrated.
    pub fn on_route_changed(&mut self, route: &RouteSummary) {
        if !self.state.active {
            return;
        }
        self.state.current_step_index = 0;
        self.current = route.current_step().cloned();

        if self.narrated.as_ref() == Some(&route.steps) {
            return;
        }
        self.narrated = Some(route.steps.clone());
        if self.state.voice_enabled {
            if let Some(step) = &self.current {
                self.say(&step.text);
            }
        }
    }

    pub fn set_voice(&mut self, enabled: bool) {
        self.state.voice_enabled = enabled;
        if !enabled && self.state.active {
            if let Some(speech) = &self.speech {
                speech.cancel();
            }
        }
    }

    pub fn on_heading(&mut self, degrees: f64) {
        if self.state.active && degrees.is_finite() {
            self.state.heading_degrees = degrees.rem_euclid(360.0);
        }
    }

    /// Map rotation in degrees: the negated heading while navigating so that
    /// up is the direction of travel, north-up otherwise.
    #[must_use]
    pub fn bearing(&self) -> f64 {
        if self.state.active {
            -self.state.heading_degrees
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn panel(&self) -> Option<NavigationPanel> {
        if !self.state.active {
            return None;
        }
        self.current.as_ref().map(|step| NavigationPanel {
            instruction: step.text.clone(),
            maneuver: step.maneuver,
            glyph: step.maneuver.glyph(),
            voice_enabled: self.state.voice_enabled,
        })
    }

    /// Waits for the next compass reading. Never resolves while no compass
    /// subscription is held, so it can sit in a `select!` unconditionally.
    pub async fn next_heading(&mut self) -> f64 {
        loop {
            if let Some(stream) = self.heading.as_mut() {
                if let Some(degrees) = stream.next().await {
                    return degrees;
                }
                tracing::debug!("orientation stream ended");
                self.heading = None;
            } else {
                std::future::pending::<()>().await;
            }
        }
    }

    fn say(&self, text: &str) {
        let Some(speech) = &self.speech else {
            return;
        };
        speech.cancel();
        speech.speak(text);
    }
}

impl Drop for NavigationController {
    fn drop(&mut self) {
        self.exit();
    }
}

#[cfg(test)]
#[path = "navigation_test.rs"]
mod tests;
