//! Gesture scenarios driven through the public API with explicit timestamps

use interaction_core::gesture::{
    ContactHandler, Gesture, GestureClassifier, GestureConfig, GestureEvent, GestureMapping,
    Point, PointerButton, PointerEventKind, SyntheticPointerEvent, TouchEnabled,
};
use pretty_assertions::assert_eq;

const ORIGIN: Point = Point { x: 100.0, y: 200.0 };

fn every_gesture_mapped() -> GestureMapping {
    GestureMapping::default().with(Gesture::SingleTap, Some(PointerButton::Primary))
}

fn classifier(mapping: GestureMapping) -> GestureClassifier<Vec<GestureEvent>> {
    GestureClassifier::new(GestureConfig::default(), mapping, Vec::new())
}

fn recognized(events: &[GestureEvent]) -> Vec<Gesture> {
    events
        .iter()
        .filter_map(|e| match e {
            GestureEvent::Recognized { gesture, .. } => Some(*gesture),
            _ => None,
        })
        .collect()
}

fn tap(c: &mut GestureClassifier<Vec<GestureEvent>>, at: Point, down_ms: u64, up_ms: u64) {
    c.on_contact_start(at, down_ms);
    c.on_contact_end(at, up_ms);
}

#[test]
fn single_tap_fires_after_quiet_window() {
    let config = GestureConfig::default();
    let mut c = classifier(every_gesture_mapped());

    // Small jitter stays under the movement threshold
    c.on_contact_start(ORIGIN, 1_000);
    c.on_contact_move(Point::new(104.0, 203.0));
    c.on_contact_end(Point::new(104.0, 203.0), 1_120);

    c.advance(1_120 + config.double_tap_window_ms - 1);
    assert!(c.sink().is_empty());

    c.advance(1_120 + config.double_tap_window_ms);
    assert_eq!(recognized(c.sink()), vec![Gesture::SingleTap]);
}

#[test]
fn single_tap_unmapped_is_silent() {
    let mut c = classifier(GestureMapping::default());
    tap(&mut c, ORIGIN, 0, 50);
    c.advance(10_000);

    assert!(c.sink().is_empty());
    assert_eq!(c.state().tap_count, 0);
}

#[test]
fn double_tap_suppresses_single_taps() {
    let mut c = classifier(every_gesture_mapped());
    tap(&mut c, ORIGIN, 0, 60);
    tap(&mut c, ORIGIN, 200, 260);
    c.advance(5_000);

    assert_eq!(recognized(c.sink()), vec![Gesture::DoubleTap]);
}

#[test]
fn taps_outside_window_are_separate() {
    let mut c = classifier(every_gesture_mapped());
    tap(&mut c, ORIGIN, 0, 60);
    // Second contact starts after the 300ms window closed at 360
    tap(&mut c, ORIGIN, 400, 450);
    c.advance(5_000);

    assert_eq!(
        recognized(c.sink()),
        vec![Gesture::SingleTap, Gesture::SingleTap]
    );
}

#[test]
fn triple_tap_uses_longer_window() {
    let config = GestureConfig::default();
    let mut c = classifier(every_gesture_mapped());
    tap(&mut c, ORIGIN, 0, 50);
    tap(&mut c, ORIGIN, 150, 200);
    tap(&mut c, ORIGIN, 300, 350);

    // Past the double-tap window but inside the triple-tap window
    c.advance(350 + config.double_tap_window_ms + 50);
    assert!(c.sink().is_empty());

    c.advance(350 + config.triple_tap_window_ms);
    assert_eq!(recognized(c.sink()), vec![Gesture::TripleTap]);
}

#[test]
fn more_than_three_taps_clamp_to_triple() {
    let mut c = classifier(every_gesture_mapped());
    for i in 0..5 {
        tap(&mut c, ORIGIN, i * 150, i * 150 + 40);
    }
    c.advance(10_000);

    assert_eq!(recognized(c.sink()), vec![Gesture::TripleTap]);
}

#[test]
fn long_press_fires_once_and_blocks_taps() {
    let config = GestureConfig::default();
    let mut c = classifier(every_gesture_mapped());
    c.on_contact_start(ORIGIN, 0);

    c.advance(config.long_press_delay_ms - 1);
    assert!(c.sink().is_empty());

    c.advance(config.long_press_delay_ms);
    assert!(c.state().is_long_press);

    c.on_contact_end(ORIGIN, 900);
    c.advance(10_000);

    assert_eq!(
        c.sink().as_slice(),
        &[
            GestureEvent::Recognized {
                gesture: Gesture::LongPress,
                position: ORIGIN,
            },
            GestureEvent::LongPressRelease { position: ORIGIN },
        ]
    );
}

#[test]
fn long_press_after_a_tap_still_blocks_tap_gestures() {
    let mut c = classifier(every_gesture_mapped());
    tap(&mut c, ORIGIN, 0, 50);
    c.on_contact_start(ORIGIN, 150);
    c.on_contact_end(ORIGIN, 1_000);
    c.advance(10_000);

    assert_eq!(recognized(c.sink()), vec![Gesture::LongPress]);
}

#[test]
fn moved_contact_fires_nothing_and_resets() {
    let mut c = classifier(every_gesture_mapped());
    c.on_contact_start(ORIGIN, 0);
    c.on_contact_move(Point::new(130.0, 200.0));
    c.on_contact_end(Point::new(130.0, 200.0), 100);
    c.advance(10_000);

    assert!(c.sink().is_empty());
    assert_eq!(c.state(), Default::default());
}

#[test]
fn cancel_clears_pending_timers() {
    let mut c = classifier(every_gesture_mapped());
    tap(&mut c, ORIGIN, 0, 50);
    c.on_contact_start(ORIGIN, 100);
    c.on_contact_cancel();
    c.advance(10_000);

    assert!(c.sink().is_empty());
    assert_eq!(c.next_deadline(), None);
}

#[test]
fn end_without_start_is_noop() {
    let mut c = classifier(every_gesture_mapped());
    c.on_contact_end(ORIGIN, 10);
    c.on_contact_move(ORIGIN);
    c.advance(10_000);

    assert!(c.sink().is_empty());
    assert_eq!(c.state(), Default::default());
}

// ============================================================================
// Through the decorator and dispatcher
// ============================================================================

#[derive(Default)]
struct ExistingHandler {
    starts: u32,
    ends: u32,
}

impl ContactHandler for ExistingHandler {
    fn on_contact_start(&mut self, _position: Point, _timestamp_ms: u64) {
        self.starts += 1;
    }

    fn on_contact_end(&mut self, _position: Point, _timestamp_ms: u64) {
        self.ends += 1;
    }
}

#[test]
fn wrapped_element_receives_clicks_and_keeps_handlers() {
    let mut element = TouchEnabled::with_target(
        ExistingHandler::default(),
        GestureConfig::default(),
        GestureMapping::default(),
        Vec::<SyntheticPointerEvent>::new(),
    );

    // Double tap, then a long-press drag
    for (down, up) in [(0, 40), (120, 160)] {
        element.on_contact_start(ORIGIN, down);
        element.on_contact_end(ORIGIN, up);
    }
    element.on_contact_start(ORIGIN, 1_000);
    element.advance(1_500);
    element.on_contact_move(Point::new(140.0, 260.0));
    element.on_contact_end(Point::new(150.0, 270.0), 1_800);

    assert_eq!(element.inner().starts, 3);
    assert_eq!(element.inner().ends, 3);

    let kinds: Vec<_> = element
        .classifier()
        .sink()
        .target()
        .iter()
        .map(|e| (e.kind, e.button))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (PointerEventKind::PrimaryClick, PointerButton::Primary),
            (PointerEventKind::PressStart, PointerButton::Secondary),
            (PointerEventKind::Move, PointerButton::Secondary),
            (PointerEventKind::PressEnd, PointerButton::Secondary),
        ]
    );

    let release = element.classifier().sink().target()[3];
    assert_eq!(release.position(), Point::new(150.0, 270.0));
}

#[test]
fn cancel_during_long_press_releases_held_button() {
    let mut element = TouchEnabled::with_target(
        (),
        GestureConfig::default(),
        GestureMapping::default(),
        Vec::<SyntheticPointerEvent>::new(),
    );

    element.on_contact_start(ORIGIN, 0);
    element.advance(600);
    assert_eq!(
        element.classifier().sink().held(),
        Some(PointerButton::Secondary)
    );

    element.on_contact_cancel();
    assert_eq!(element.classifier().sink().held(), None);

    // A later double tap is a plain click, with no stray press-end
    for (down, up) in [(1_000, 1_040), (1_120, 1_160)] {
        element.on_contact_start(ORIGIN, down);
        element.on_contact_end(ORIGIN, up);
    }
    element.advance(5_000);

    let kinds: Vec<_> = element
        .classifier()
        .sink()
        .target()
        .iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![PointerEventKind::PressStart, PointerEventKind::PrimaryClick]
    );
}

#[test]
fn reset_while_held_emits_nothing() {
    let mut element = TouchEnabled::with_target(
        (),
        GestureConfig::default(),
        GestureMapping::default(),
        Vec::<SyntheticPointerEvent>::new(),
    );
    element.on_contact_start(ORIGIN, 0);
    element.advance(500);
    element.reset();

    assert_eq!(element.classifier().sink().held(), None);
    assert_eq!(element.classifier().sink().target().len(), 1);
    assert_eq!(element.classifier().next_deadline(), None);
}

#[test]
fn synthetic_events_serialize_to_host_shape() {
    let event = SyntheticPointerEvent::new(
        PointerEventKind::MiddleClick,
        Point::new(3.0, 4.5),
        PointerButton::Middle,
    );

    assert_eq!(
        serde_json::to_value(event).unwrap(),
        serde_json::json!({"kind": "middle-click", "x": 3.0, "y": 4.5, "button": "middle"})
    );
}
