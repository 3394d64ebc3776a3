//! Touch-Gesture Disambiguation
//!
//! Converts raw touch contacts into semantic pointer actions (single, double
//! and triple tap, long-press) without relying on platform multi-tap or
//! long-press primitives.
//!
//! # Architecture
//!
//! ```text
//! contact start/move/end/cancel
//!              │
//!              ▼
//! ┌───────────────────────────┐      ┌──────────────────┐
//! │     GestureClassifier     │◄────►│  TimerScheduler  │
//! │  (TouchSequenceState)     │      │ (tap / long-press│
//! └─────────────┬─────────────┘      │     deadlines)   │
//!               │ GestureEvent       └──────────────────┘
//!               ▼
//! ┌───────────────────────────┐
//! │      EventDispatcher      │──► PointerTarget (host UI)
//! │     (GestureMapping)      │    SyntheticPointerEvent
//! └───────────────────────────┘
//! ```
//!
//! The classifier is clock-agnostic: the host supplies millisecond
//! timestamps and calls `advance` to fire timers. [`GestureDriver`] does that
//! on a tokio task for hosts that want real time.
//!
//! # Example
//!
//! ```
//! use interaction_core::gesture::{
//!     ContactHandler, GestureConfig, GestureMapping, Point, PointerEventKind,
//!     SyntheticPointerEvent, TouchEnabled,
//! };
//!
//! let mut element = TouchEnabled::with_target(
//!     (),
//!     GestureConfig::default(),
//!     GestureMapping::default(),
//!     Vec::<SyntheticPointerEvent>::new(),
//! );
//!
//! element.on_contact_start(Point::new(10.0, 10.0), 0);
//! element.on_contact_end(Point::new(10.0, 10.0), 80);
//! element.on_contact_start(Point::new(11.0, 10.0), 180);
//! element.on_contact_end(Point::new(11.0, 10.0), 240);
//! element.advance(1_000);
//!
//! let events = element.classifier().sink().target();
//! assert_eq!(events[0].kind, PointerEventKind::PrimaryClick);
//! ```

mod classifier;
mod dispatcher;
mod driver;
mod timer;
mod wrapper;

pub use classifier::{
    Gesture, GestureClassifier, GestureConfig, GestureEvent, GestureMapping, GestureSink,
    GestureTimer, Point, PointerButton, TouchSequenceState,
};
pub use dispatcher::{EventDispatcher, PointerEventKind, PointerTarget, SyntheticPointerEvent};
pub use driver::{ContactInput, GestureDriver};
pub use timer::{DeadlineScheduler, TimerScheduler, TimerToken};
pub use wrapper::{ContactEvent, ContactHandler, TouchEnabled};
