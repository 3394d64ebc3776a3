//! Event Dispatcher
//!
//! Translates classified gestures into synthetic pointer events and delivers
//! them to a bound [`PointerTarget`]. Taps become clicks of the mapped
//! button. A long-press becomes a `press-start` / `move`* / `press-end`
//! sequence so drag-style consumers (e.g. a radial menu) can follow the whole
//! interaction.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::classifier::{Gesture, GestureEvent, GestureMapping, GestureSink, Point, PointerButton};

/// Kind of synthetic pointer event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointerEventKind {
    /// Primary button click
    PrimaryClick,
    /// Secondary (context) button click
    SecondaryClick,
    /// Middle button click
    MiddleClick,
    /// Button pressed and held
    PressStart,
    /// Held button released
    PressEnd,
    /// Pointer moved while a button is held
    Move,
}

impl PointerEventKind {
    /// Click kind for a button
    #[must_use]
    pub fn click(button: PointerButton) -> Self {
        match button {
            PointerButton::Primary => Self::PrimaryClick,
            PointerButton::Secondary => Self::SecondaryClick,
            PointerButton::Middle => Self::MiddleClick,
        }
    }

    /// Wire name of this kind
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrimaryClick => "primary-click",
            Self::SecondaryClick => "secondary-click",
            Self::MiddleClick => "middle-click",
            Self::PressStart => "press-start",
            Self::PressEnd => "press-end",
            Self::Move => "move",
        }
    }
}

impl std::fmt::Display for PointerEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer event handed to the host UI
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyntheticPointerEvent {
    /// Event kind
    pub kind: PointerEventKind,
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
    /// Button the event represents
    pub button: PointerButton,
}

impl SyntheticPointerEvent {
    /// Build an event at a position
    #[must_use]
    pub fn new(kind: PointerEventKind, position: Point, button: PointerButton) -> Self {
        Self {
            kind,
            x: position.x,
            y: position.y,
            button,
        }
    }

    /// Event position
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Something that accepts synthetic pointer events
pub trait PointerTarget {
    /// Deliver one event
    fn deliver(&mut self, event: SyntheticPointerEvent);
}

impl PointerTarget for Vec<SyntheticPointerEvent> {
    fn deliver(&mut self, event: SyntheticPointerEvent) {
        self.push(event);
    }
}

impl<T: PointerTarget> PointerTarget for Arc<Mutex<T>> {
    fn deliver(&mut self, event: SyntheticPointerEvent) {
        self.lock().deliver(event);
    }
}

impl PointerTarget for mpsc::UnboundedSender<SyntheticPointerEvent> {
    fn deliver(&mut self, event: SyntheticPointerEvent) {
        if self.send(event).is_err() {
            tracing::debug!(kind = %event.kind, "pointer target closed, event dropped");
        }
    }
}

/// Maps gestures to pointer events and delivers them to one target
pub struct EventDispatcher<T> {
    mapping: GestureMapping,
    target: T,
    held: Option<PointerButton>,
}

impl<T: PointerTarget> EventDispatcher<T> {
    /// Bind a dispatcher to a target
    pub fn new(mapping: GestureMapping, target: T) -> Self {
        Self {
            mapping,
            target,
            held: None,
        }
    }

    /// The bound target
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Mutable access to the bound target
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Button currently held by a long-press, if any
    #[must_use]
    pub fn held(&self) -> Option<PointerButton> {
        self.held
    }

    /// Dispatch a recognized gesture; unmapped gestures are a no-op
    pub fn dispatch(&mut self, gesture: Gesture, position: Point) -> Option<SyntheticPointerEvent> {
        let button = self.mapping.get(gesture)?;

        let kind = if gesture == Gesture::LongPress {
            self.held = Some(button);
            PointerEventKind::PressStart
        } else {
            PointerEventKind::click(button)
        };

        Some(self.deliver(SyntheticPointerEvent::new(kind, position, button)))
    }

    /// Forward movement of a held long-press
    pub fn drag(&mut self, position: Point) -> Option<SyntheticPointerEvent> {
        let button = self.held?;
        Some(self.deliver(SyntheticPointerEvent::new(
            PointerEventKind::Move,
            position,
            button,
        )))
    }

    /// Finish a held long-press
    pub fn release(&mut self, position: Point) -> Option<SyntheticPointerEvent> {
        let button = self.held.take()?;
        Some(self.deliver(SyntheticPointerEvent::new(
            PointerEventKind::PressEnd,
            position,
            button,
        )))
    }

    fn deliver(&mut self, event: SyntheticPointerEvent) -> SyntheticPointerEvent {
        tracing::debug!(kind = %event.kind, x = event.x, y = event.y, "dispatching pointer event");
        self.target.deliver(event);
        event
    }
}

impl<T: PointerTarget> GestureSink for EventDispatcher<T> {
    fn on_gesture(&mut self, event: GestureEvent) {
        match event {
            GestureEvent::Recognized { gesture, position } => {
                self.dispatch(gesture, position);
            }
            GestureEvent::LongPressMove { position } => {
                self.drag(position);
            }
            GestureEvent::LongPressRelease { position } => {
                self.release(position);
            }
        }
    }

    fn on_reset(&mut self) {
        if let Some(button) = self.held.take() {
            tracing::debug!(?button, "held press abandoned");
        }
    }
}
