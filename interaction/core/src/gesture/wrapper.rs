//! Touch-Enabled Wrapper
//!
//! Adds gesture recognition to an existing contact handler without touching
//! its implementation. [`TouchEnabled`] forwards every contact to its
//! classifier and then to the wrapped handler, so the original handlers keep
//! running unchanged.

use serde::{Deserialize, Serialize};

use super::classifier::{
    GestureClassifier, GestureConfig, GestureMapping, GestureSink, GestureTimer, Point,
};
use super::dispatcher::{EventDispatcher, PointerTarget};
use super::timer::{DeadlineScheduler, TimerScheduler};

/// Receives raw contact events; every method defaults to a no-op
pub trait ContactHandler {
    /// A contact went down
    fn on_contact_start(&mut self, _position: Point, _timestamp_ms: u64) {}

    /// The active contact moved
    fn on_contact_move(&mut self, _position: Point) {}

    /// The active contact was lifted
    fn on_contact_end(&mut self, _position: Point, _timestamp_ms: u64) {}

    /// The platform cancelled the contact
    fn on_contact_cancel(&mut self) {}
}

impl ContactHandler for () {}

impl<K, S> ContactHandler for GestureClassifier<K, S>
where
    K: GestureSink,
    S: TimerScheduler<GestureTimer>,
{
    fn on_contact_start(&mut self, position: Point, timestamp_ms: u64) {
        GestureClassifier::on_contact_start(self, position, timestamp_ms);
    }

    fn on_contact_move(&mut self, position: Point) {
        GestureClassifier::on_contact_move(self, position);
    }

    fn on_contact_end(&mut self, position: Point, timestamp_ms: u64) {
        GestureClassifier::on_contact_end(self, position, timestamp_ms);
    }

    fn on_contact_cancel(&mut self) {
        GestureClassifier::on_contact_cancel(self);
    }
}

/// A raw contact event as data
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContactEvent {
    /// Contact down
    Start {
        /// Contact position
        position: Point,
        /// Monotonic timestamp in milliseconds
        timestamp_ms: u64,
    },
    /// Contact moved
    Move {
        /// Contact position
        position: Point,
    },
    /// Contact lifted
    End {
        /// Contact position
        position: Point,
        /// Monotonic timestamp in milliseconds
        timestamp_ms: u64,
    },
    /// Contact cancelled
    Cancel,
}

impl ContactEvent {
    /// Feed this event to a handler
    pub fn apply<H: ContactHandler + ?Sized>(self, handler: &mut H) {
        match self {
            Self::Start {
                position,
                timestamp_ms,
            } => handler.on_contact_start(position, timestamp_ms),
            Self::Move { position } => handler.on_contact_move(position),
            Self::End {
                position,
                timestamp_ms,
            } => handler.on_contact_end(position, timestamp_ms),
            Self::Cancel => handler.on_contact_cancel(),
        }
    }

    /// Timestamp carried by the event, if any
    #[must_use]
    pub fn timestamp_ms(&self) -> Option<u64> {
        match self {
            Self::Start { timestamp_ms, .. } | Self::End { timestamp_ms, .. } => {
                Some(*timestamp_ms)
            }
            Self::Move { .. } | Self::Cancel => None,
        }
    }
}

/// Decorator adding gesture recognition to a contact handler
pub struct TouchEnabled<H, K, S = DeadlineScheduler<GestureTimer>> {
    inner: H,
    classifier: GestureClassifier<K, S>,
}

impl<H, T> TouchEnabled<H, EventDispatcher<T>>
where
    H: ContactHandler,
    T: PointerTarget,
{
    /// Wrap `inner`, dispatching recognized gestures to `target`
    pub fn with_target(
        inner: H,
        config: GestureConfig,
        mapping: GestureMapping,
        target: T,
    ) -> Self {
        let dispatcher = EventDispatcher::new(mapping, target);
        Self::new(inner, GestureClassifier::new(config, mapping, dispatcher))
    }
}

impl<H, K, S> TouchEnabled<H, K, S>
where
    H: ContactHandler,
    K: GestureSink,
    S: TimerScheduler<GestureTimer>,
{
    /// Wrap `inner` with an existing classifier
    pub fn new(inner: H, classifier: GestureClassifier<K, S>) -> Self {
        Self { inner, classifier }
    }

    /// The wrapped handler
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// Mutable access to the wrapped handler
    pub fn inner_mut(&mut self) -> &mut H {
        &mut self.inner
    }

    /// The classifier
    pub fn classifier(&self) -> &GestureClassifier<K, S> {
        &self.classifier
    }

    /// Mutable access to the classifier
    pub fn classifier_mut(&mut self) -> &mut GestureClassifier<K, S> {
        &mut self.classifier
    }

    /// Fire gesture timers due at or before `now_ms`
    pub fn advance(&mut self, now_ms: u64) {
        self.classifier.advance(now_ms);
    }

    /// Drop pending timers and sequence state (e.g. when the element goes away)
    pub fn reset(&mut self) {
        self.classifier.reset();
    }

    /// Split back into handler and classifier
    pub fn into_parts(self) -> (H, GestureClassifier<K, S>) {
        (self.inner, self.classifier)
    }
}

impl<H, K, S> ContactHandler for TouchEnabled<H, K, S>
where
    H: ContactHandler,
    K: GestureSink,
    S: TimerScheduler<GestureTimer>,
{
    fn on_contact_start(&mut self, position: Point, timestamp_ms: u64) {
        self.classifier.on_contact_start(position, timestamp_ms);
        self.inner.on_contact_start(position, timestamp_ms);
    }

    fn on_contact_move(&mut self, position: Point) {
        self.classifier.on_contact_move(position);
        self.inner.on_contact_move(position);
    }

    fn on_contact_end(&mut self, position: Point, timestamp_ms: u64) {
        self.classifier.on_contact_end(position, timestamp_ms);
        self.inner.on_contact_end(position, timestamp_ms);
    }

    fn on_contact_cancel(&mut self) {
        self.classifier.on_contact_cancel();
        self.inner.on_contact_cancel();
    }
}
