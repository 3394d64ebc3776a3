//! Touch trace replay
//!
//! A trace is a text file with one contact sample per line:
//!
//! ```text
//! # double tap, then a long-press drag
//! start 100 200 0
//! end   100 200 60
//! start 101 200 180
//! end   101 200 240
//! start 50 50 1000
//! tick 1600
//! move 80 90
//! end  80 90 1900
//! cancel
//! ```
//!
//! Coordinates are logical pixels, timestamps milliseconds. `tick t` only
//! advances the clock. Blank lines and `#` comments are skipped.

use std::path::Path;

use anyhow::{bail, Context, Result};
use interaction_core::gesture::{
    ContactEvent, GestureConfig, GestureMapping, Point, SyntheticPointerEvent, TouchEnabled,
};

/// One parsed trace line
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraceStep {
    /// A contact event
    Contact(ContactEvent),
    /// Advance the clock
    Tick(u64),
}

impl TraceStep {
    fn timestamp_ms(&self) -> Option<u64> {
        match self {
            Self::Contact(event) => event.timestamp_ms(),
            Self::Tick(t) => Some(*t),
        }
    }
}

/// Read and parse a trace file
pub fn load_trace(path: &Path) -> Result<Vec<TraceStep>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trace {}", path.display()))?;
    parse_trace(&text).with_context(|| format!("invalid trace {}", path.display()))
}

/// Parse trace text
pub fn parse_trace(text: &str) -> Result<Vec<TraceStep>> {
    let mut steps = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step = parse_line(line).with_context(|| format!("line {}: `{line}`", idx + 1))?;
        steps.push(step);
    }
    Ok(steps)
}

fn parse_line(line: &str) -> Result<TraceStep> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        bail!("empty line");
    };
    let args: Vec<&str> = parts.collect();

    let step = match (verb, args.as_slice()) {
        ("start", [x, y, t]) => TraceStep::Contact(ContactEvent::Start {
            position: point(x, y)?,
            timestamp_ms: millis(t)?,
        }),
        ("move", [x, y]) => TraceStep::Contact(ContactEvent::Move {
            position: point(x, y)?,
        }),
        ("end", [x, y, t]) => TraceStep::Contact(ContactEvent::End {
            position: point(x, y)?,
            timestamp_ms: millis(t)?,
        }),
        ("cancel", []) => TraceStep::Contact(ContactEvent::Cancel),
        ("tick", [t]) => TraceStep::Tick(millis(t)?),
        ("start" | "end", _) => bail!("expected `{verb} <x> <y> <ms>`"),
        ("move", _) => bail!("expected `move <x> <y>`"),
        ("cancel", _) => bail!("`cancel` takes no arguments"),
        ("tick", _) => bail!("expected `tick <ms>`"),
        (other, _) => bail!("unknown sample kind `{other}`"),
    };
    Ok(step)
}

fn point(x: &str, y: &str) -> Result<Point> {
    let x: f64 = x.parse().with_context(|| format!("bad x coordinate `{x}`"))?;
    let y: f64 = y.parse().with_context(|| format!("bad y coordinate `{y}`"))?;
    Ok(Point::new(x, y))
}

fn millis(t: &str) -> Result<u64> {
    t.parse().with_context(|| format!("bad timestamp `{t}`"))
}

/// Run a trace through a touch-enabled element and collect the pointer events
///
/// Pending timers are flushed after the last sample so trailing taps resolve
/// even when the trace stops right after the final contact.
pub fn replay(
    steps: &[TraceStep],
    config: GestureConfig,
    mapping: GestureMapping,
) -> Vec<SyntheticPointerEvent> {
    let mut element =
        TouchEnabled::with_target((), config, mapping, Vec::<SyntheticPointerEvent>::new());

    for step in steps {
        match *step {
            TraceStep::Contact(event) => event.apply(&mut element),
            TraceStep::Tick(t) => element.advance(t),
        }
    }

    while let Some(deadline) = element.classifier().next_deadline() {
        element.advance(deadline);
    }
    if element.classifier().in_contact() {
        tracing::debug!("trace ended with a contact still down");
    }

    let last_ms = steps.iter().filter_map(TraceStep::timestamp_ms).max();
    tracing::debug!(steps = steps.len(), last_ms, "trace replayed");

    let (_, classifier) = element.into_parts();
    classifier.sink().target().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use interaction_core::gesture::{PointerButton, PointerEventKind};
    use std::io::Write;

    const TRACE: &str = "\
# double tap, then a long-press drag
start 100 200 0
end   100 200 60
start 101 200 180
end   101 200 240

start 50 50 1000
tick 1600
move 80 90
end  80 90 1900
";

    #[test]
    fn test_parse_trace() {
        let steps = parse_trace(TRACE).unwrap();
        assert_eq!(steps.len(), 8);
        assert_eq!(
            steps[0],
            TraceStep::Contact(ContactEvent::Start {
                position: Point::new(100.0, 200.0),
                timestamp_ms: 0,
            })
        );
        assert_eq!(steps[5], TraceStep::Tick(1600));
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let err = parse_trace("start 1 2 0\nend 1 two 5\n").unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("line 2"), "{message}");
        assert!(message.contains("bad y coordinate"), "{message}");

        assert!(parse_trace("hover 1 2").is_err());
        assert!(parse_trace("cancel now").is_err());
        assert!(parse_trace("tick").is_err());
    }

    #[test]
    fn test_replay_double_tap_and_long_press() {
        let steps = parse_trace(TRACE).unwrap();
        let events = replay(&steps, GestureConfig::default(), GestureMapping::default());

        let kinds: Vec<PointerEventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PointerEventKind::PrimaryClick,
                PointerEventKind::PressStart,
                PointerEventKind::Move,
                PointerEventKind::PressEnd,
            ]
        );
        assert_eq!(events[1].button, PointerButton::Secondary);
        assert_eq!(events[3].position(), Point::new(80.0, 90.0));
    }

    #[test]
    fn test_replay_flushes_trailing_tap() {
        let steps = parse_trace("start 5 5 0\nend 5 5 40\n").unwrap();
        let mapping = GestureMapping::none().with(
            interaction_core::gesture::Gesture::SingleTap,
            Some(PointerButton::Primary),
        );

        let events = replay(&steps, GestureConfig::default(), mapping);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, PointerEventKind::PrimaryClick);
    }

    #[test]
    fn test_load_trace_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"start 1 1 0\ncancel\n").unwrap();

        let steps = load_trace(file.path()).unwrap();
        assert_eq!(steps.len(), 2);
        assert!(load_trace(Path::new("/nonexistent/trace.txt")).is_err());
    }
}
