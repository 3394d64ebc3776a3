//! Gesture Classifier
//!
//! Turns raw contact start/move/end/cancel events into semantic gestures
//! (single/double/triple tap, long-press) using only debounce timers and a
//! movement threshold.
//!
//! # Sequence rules
//!
//! - A contact start bumps the tap counter, cancels any pending tap-window
//!   timer and, if long-press is mapped, arms the long-press timer.
//! - The long-press timer firing while the contact is down marks the sequence
//!   as a long-press and emits immediately; it is the only non-debounced
//!   emission.
//! - A contact end either finishes the long-press, discards the sequence when
//!   the net displacement exceeds the threshold, or arms the tap-window timer.
//! - The tap-window timer firing emits the gesture for the final tap count
//!   (clamped to triple-tap) and resets the sequence.
//!
//! The counter is only reset when a tap-window timer fires, on a long-press
//! release, on a threshold violation, or on cancel. That is how consecutive
//! contacts accumulate into a double or triple tap.

use serde::{Deserialize, Serialize};

use super::timer::{DeadlineScheduler, TimerScheduler, TimerToken};

// ============================================================================
// Geometry
// ============================================================================

/// A position in logical pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Create a point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Timing and movement thresholds for one classifier
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Quiet window after a contact ends while the tap count is 1 or 2
    pub double_tap_window_ms: u64,
    /// Quiet window after the third contact ends
    pub triple_tap_window_ms: u64,
    /// How long a contact must be held to become a long-press
    pub long_press_delay_ms: u64,
    /// Maximum net displacement (start to end) for a contact to count as a tap
    pub move_threshold_px: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_tap_window_ms: 300,
            triple_tap_window_ms: 400,
            long_press_delay_ms: 500,
            move_threshold_px: 10.0,
        }
    }
}

/// Semantic gesture names
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Gesture {
    /// One tap followed by a quiet window
    SingleTap,
    /// Two taps within the double-tap window
    DoubleTap,
    /// Three (or more) taps within the tap windows
    TripleTap,
    /// A contact held past the long-press delay
    LongPress,
}

impl Gesture {
    /// Gesture for a settled tap cluster; counts above three clamp to triple
    #[must_use]
    pub fn from_tap_count(count: u32) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(Self::SingleTap),
            2 => Some(Self::DoubleTap),
            _ => Some(Self::TripleTap),
        }
    }
}

/// Pointer button a gesture is translated into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Left / primary button
    Primary,
    /// Right / context-menu button
    Secondary,
    /// Middle button
    Middle,
}

/// Which pointer button each gesture maps to; unmapped gestures are dropped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureMapping {
    /// Button for a single tap
    pub single_tap: Option<PointerButton>,
    /// Button for a double tap
    pub double_tap: Option<PointerButton>,
    /// Button for a triple tap
    pub triple_tap: Option<PointerButton>,
    /// Button held for a long-press
    pub long_press: Option<PointerButton>,
}

impl Default for GestureMapping {
    fn default() -> Self {
        Self {
            single_tap: None,
            double_tap: Some(PointerButton::Primary),
            triple_tap: Some(PointerButton::Middle),
            long_press: Some(PointerButton::Secondary),
        }
    }
}

impl GestureMapping {
    /// A mapping with every gesture unmapped
    #[must_use]
    pub fn none() -> Self {
        Self {
            single_tap: None,
            double_tap: None,
            triple_tap: None,
            long_press: None,
        }
    }

    /// Look up the button for a gesture
    #[must_use]
    pub fn get(&self, gesture: Gesture) -> Option<PointerButton> {
        match gesture {
            Gesture::SingleTap => self.single_tap,
            Gesture::DoubleTap => self.double_tap,
            Gesture::TripleTap => self.triple_tap,
            Gesture::LongPress => self.long_press,
        }
    }

    /// Map (or unmap) a gesture
    #[must_use]
    pub fn with(mut self, gesture: Gesture, button: Option<PointerButton>) -> Self {
        match gesture {
            Gesture::SingleTap => self.single_tap = button,
            Gesture::DoubleTap => self.double_tap = button,
            Gesture::TripleTap => self.triple_tap = button,
            Gesture::LongPress => self.long_press = button,
        }
        self
    }
}

// ============================================================================
// Sequence State
// ============================================================================

/// State of the contact sequence currently being classified
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TouchSequenceState {
    /// Contacts started since the last resolution
    pub tap_count: u32,
    /// Timestamp of the most recent contact start
    pub start_time_ms: Option<u64>,
    /// Position of the most recent contact start
    pub start_position: Option<Point>,
    /// Set once the long-press timer has fired for the current contact
    pub is_long_press: bool,
}

impl TouchSequenceState {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Output
// ============================================================================

/// Events emitted by the classifier
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    /// A gesture was recognized
    Recognized {
        /// Which gesture
        gesture: Gesture,
        /// Where it happened
        position: Point,
    },
    /// Contact moved while a long-press is held
    LongPressMove {
        /// Current contact position
        position: Point,
    },
    /// The contact holding a long-press was lifted
    LongPressRelease {
        /// Position at release
        position: Point,
    },
}

/// Receives classified gestures
pub trait GestureSink {
    /// Handle one gesture event
    fn on_gesture(&mut self, event: GestureEvent);

    /// The classifier abandoned its sequence without emitting anything
    fn on_reset(&mut self) {}
}

impl<F> GestureSink for F
where
    F: FnMut(GestureEvent),
{
    fn on_gesture(&mut self, event: GestureEvent) {
        self(event);
    }
}

impl GestureSink for Vec<GestureEvent> {
    fn on_gesture(&mut self, event: GestureEvent) {
        self.push(event);
    }
}

/// Timer payloads used by the classifier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureTimer {
    /// Quiet window after a contact ended
    TapWindow,
    /// Hold delay for long-press
    LongPress,
}

// ============================================================================
// Classifier
// ============================================================================

/// Single-pointer gesture classifier
pub struct GestureClassifier<K, S = DeadlineScheduler<GestureTimer>> {
    config: GestureConfig,
    mapping: GestureMapping,
    state: TouchSequenceState,
    scheduler: S,
    sink: K,
    tap_timer: Option<TimerToken>,
    long_press_timer: Option<TimerToken>,
    in_contact: bool,
    current_position: Point,
    now_ms: u64,
}

impl<K: GestureSink> GestureClassifier<K> {
    /// Create a classifier with its own deadline scheduler
    #[must_use]
    pub fn new(config: GestureConfig, mapping: GestureMapping, sink: K) -> Self {
        Self::with_scheduler(config, mapping, DeadlineScheduler::new(), sink)
    }
}

impl<K, S> GestureClassifier<K, S>
where
    K: GestureSink,
    S: TimerScheduler<GestureTimer>,
{
    /// Create a classifier on top of a caller-provided scheduler
    #[must_use]
    pub fn with_scheduler(
        config: GestureConfig,
        mapping: GestureMapping,
        scheduler: S,
        sink: K,
    ) -> Self {
        Self {
            config,
            mapping,
            state: TouchSequenceState::default(),
            scheduler,
            sink,
            tap_timer: None,
            long_press_timer: None,
            in_contact: false,
            current_position: Point::default(),
            now_ms: 0,
        }
    }

    /// Current configuration
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Current mapping
    #[must_use]
    pub fn mapping(&self) -> &GestureMapping {
        &self.mapping
    }

    /// Snapshot of the sequence state
    #[must_use]
    pub fn state(&self) -> TouchSequenceState {
        self.state
    }

    /// Whether a contact is currently down
    #[must_use]
    pub fn in_contact(&self) -> bool {
        self.in_contact
    }

    /// Deadline of the next pending timer
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// Borrow the sink
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Mutably borrow the sink
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Fire every timer due at or before `now_ms`
    pub fn advance(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        while let Some((token, timer)) = self.scheduler.pop_due(self.now_ms) {
            self.on_timer(token, timer);
        }
    }

    /// A contact went down
    pub fn on_contact_start(&mut self, position: Point, timestamp_ms: u64) {
        self.advance(timestamp_ms);
        self.clear_timers();

        self.state.start_time_ms = Some(timestamp_ms);
        self.state.start_position = Some(position);
        self.state.is_long_press = false;
        self.state.tap_count = self.state.tap_count.saturating_add(1);
        self.in_contact = true;
        self.current_position = position;

        if self.mapping.long_press.is_some() {
            self.long_press_timer = Some(self.scheduler.schedule(
                timestamp_ms,
                self.config.long_press_delay_ms,
                GestureTimer::LongPress,
            ));
        }

        tracing::trace!(
            tap_count = self.state.tap_count,
            x = position.x,
            y = position.y,
            "contact start"
        );
    }

    /// The active contact moved
    pub fn on_contact_move(&mut self, position: Point) {
        if !self.in_contact {
            return;
        }
        self.current_position = position;

        if self.state.is_long_press {
            self.emit(GestureEvent::LongPressMove { position });
        }
    }

    /// The active contact was lifted
    pub fn on_contact_end(&mut self, position: Point, timestamp_ms: u64) {
        self.advance(timestamp_ms);

        let Some(start) = self.state.start_position.filter(|_| self.in_contact) else {
            tracing::trace!("contact end without start, resetting");
            self.reset();
            return;
        };

        self.clear_timers();
        self.in_contact = false;
        self.current_position = position;

        if self.state.is_long_press {
            self.emit(GestureEvent::LongPressRelease { position });
            self.state.reset();
            return;
        }

        let distance = start.distance_to(position);
        if distance > self.config.move_threshold_px {
            tracing::debug!(
                distance,
                threshold = self.config.move_threshold_px,
                "contact moved too far, discarding sequence"
            );
            self.state.reset();
            return;
        }

        let window = if self.state.tap_count <= 2 {
            self.config.double_tap_window_ms
        } else {
            self.config.triple_tap_window_ms
        };
        self.tap_timer = Some(
            self.scheduler
                .schedule(timestamp_ms, window, GestureTimer::TapWindow),
        );
    }

    /// The contact was cancelled by the platform
    pub fn on_contact_cancel(&mut self) {
        tracing::trace!(tap_count = self.state.tap_count, "contact cancelled");
        self.reset();
    }

    /// Cancel all timers and forget the current sequence; emits nothing
    pub fn reset(&mut self) {
        self.clear_timers();
        self.state.reset();
        self.in_contact = false;
        self.sink.on_reset();
    }

    fn clear_timers(&mut self) {
        if let Some(token) = self.tap_timer.take() {
            self.scheduler.cancel(token);
        }
        if let Some(token) = self.long_press_timer.take() {
            self.scheduler.cancel(token);
        }
    }

    fn on_timer(&mut self, token: TimerToken, timer: GestureTimer) {
        tracing::trace!(token = token.as_u64(), ?timer, "timer fired");
        match timer {
            GestureTimer::LongPress => {
                if self.long_press_timer != Some(token) {
                    return;
                }
                self.long_press_timer = None;
                if !self.in_contact {
                    return;
                }

                self.state.is_long_press = true;
                let position = self.current_position;
                self.emit(GestureEvent::Recognized {
                    gesture: Gesture::LongPress,
                    position,
                });
            }
            GestureTimer::TapWindow => {
                if self.tap_timer != Some(token) {
                    return;
                }
                self.tap_timer = None;

                if let Some(gesture) = Gesture::from_tap_count(self.state.tap_count) {
                    if self.mapping.get(gesture).is_some() {
                        let position = self.current_position;
                        self.emit(GestureEvent::Recognized { gesture, position });
                    } else {
                        tracing::trace!(?gesture, "gesture unmapped, dropping");
                    }
                }
                self.state.reset();
            }
        }
    }

    fn emit(&mut self, event: GestureEvent) {
        tracing::debug!(event = ?event, "gesture event");
        self.sink.on_gesture(event);
    }
}
