//! Async Gesture Driver
//!
//! Runs a [`GestureClassifier`] on a tokio task against the runtime clock.
//! Contacts are stamped when they are submitted through [`ContactInput`];
//! the task sleeps until the classifier's next timer deadline and forwards
//! every dispatched pointer event to an unbounded channel.
//!
//! Dropping every [`ContactInput`] cancels pending timers and ends the task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::classifier::{GestureClassifier, GestureConfig, GestureMapping, Point};
use super::dispatcher::{EventDispatcher, SyntheticPointerEvent};
use super::wrapper::ContactEvent;

/// Submits contacts to a running driver
#[derive(Clone, Debug)]
pub struct ContactInput {
    tx: mpsc::UnboundedSender<ContactEvent>,
    origin: Instant,
}

impl ContactInput {
    fn now_ms(&self) -> u64 {
        elapsed_ms(self.origin)
    }

    fn send(&self, event: ContactEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Contact down at `position`; returns `false` once the driver has stopped
    pub fn start(&self, position: Point) -> bool {
        self.send(ContactEvent::Start {
            position,
            timestamp_ms: self.now_ms(),
        })
    }

    /// Contact moved
    pub fn move_to(&self, position: Point) -> bool {
        self.send(ContactEvent::Move { position })
    }

    /// Contact lifted at `position`
    pub fn end(&self, position: Point) -> bool {
        self.send(ContactEvent::End {
            position,
            timestamp_ms: self.now_ms(),
        })
    }

    /// Contact cancelled
    pub fn cancel(&self) -> bool {
        self.send(ContactEvent::Cancel)
    }
}

/// A running gesture driver
pub struct GestureDriver {
    /// Contact submission handle
    pub input: ContactInput,
    /// Synthetic pointer events, in dispatch order
    pub events: mpsc::UnboundedReceiver<SyntheticPointerEvent>,
    task: JoinHandle<()>,
}

impl GestureDriver {
    /// Spawn a driver on the current tokio runtime
    #[must_use]
    pub fn spawn(config: GestureConfig, mapping: GestureMapping) -> Self {
        let (contact_tx, contact_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let origin = Instant::now();

        let dispatcher = EventDispatcher::new(mapping, event_tx);
        let classifier = GestureClassifier::new(config, mapping, dispatcher);
        let task = tokio::spawn(run(classifier, contact_rx, origin));

        Self {
            input: ContactInput {
                tx: contact_tx,
                origin,
            },
            events: event_rx,
            task,
        }
    }

    /// Stop accepting contacts and wait for the task to finish
    ///
    /// Other clones of the input keep the task alive until they are dropped.
    pub async fn shutdown(self) {
        drop(self.input);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "gesture driver task failed");
        }
    }
}

type DriverClassifier = GestureClassifier<EventDispatcher<mpsc::UnboundedSender<SyntheticPointerEvent>>>;

async fn run(
    mut classifier: DriverClassifier,
    mut contacts: mpsc::UnboundedReceiver<ContactEvent>,
    origin: Instant,
) {
    tracing::debug!("gesture driver started");

    loop {
        let deadline = classifier
            .next_deadline()
            .map(|ms| origin + Duration::from_millis(ms));

        tokio::select! {
            event = contacts.recv() => match event {
                Some(event) => event.apply(&mut classifier),
                None => {
                    classifier.reset();
                    break;
                }
            },
            () = sleep_until(deadline) => {
                classifier.advance(elapsed_ms(origin));
            }
        }
    }

    tracing::debug!("gesture driver stopped");
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn elapsed_ms(origin: Instant) -> u64 {
    u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX)
}
