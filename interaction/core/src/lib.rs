//! Interaction Core - Touch Gestures and Streaming Chat for snapfeed
//!
//! This crate holds the UI-independent interaction logic of the snapfeed
//! client. It can sit behind any surface that delivers touch contacts and
//! renders text.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Host UI surface                        │
//! │      touch contacts ▼               ▲ synthetic pointer events │
//! │                     │               │ streamed fragments       │
//! └─────────────────────┼───────────────┼──────────────────────────┘
//!                       │               │
//! ┌─────────────────────┼───────────────┼──────────────────────────┐
//! │                 INTERACTION CORE    │                          │
//! │  ┌──────────────────┴─────┐   ┌─────┴────────────────────────┐ │
//! │  │        gesture         │   │          streaming           │ │
//! │  │ TouchEnabled           │   │ StreamTransport              │ │
//! │  │  └ GestureClassifier   │   │  └ LineFramer                │ │
//! │  │     └ EventDispatcher  │   │     └ StreamHandler          │ │
//! │  └────────────────────────┘   └──────────────────────────────┘ │
//! │                         config (TOML + env)                    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`GestureClassifier`]: turns contacts into single/double/triple taps and
//!   long-presses using cancellable timers
//! - [`EventDispatcher`]: maps gestures to [`SyntheticPointerEvent`]s
//! - [`TouchEnabled`]: adds gesture handling to an existing contact handler
//! - [`StreamTransport`]: streams a chat completion into a [`StreamHandler`]
//! - [`InteractionConfig`]: configuration loaded from file and environment
//!
//! # Quick Start
//!
//! ```ignore
//! use interaction_core::{load_config, ChannelHandler, StreamEvent, StreamTransport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let transport = StreamTransport::from_config(&config.stream)?;
//!
//!     let (handler, mut events) = ChannelHandler::new();
//!     let handle = transport.start(config.stream.request("Summarize my feed"), handler);
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             StreamEvent::Fragment(text) => print!("{text}"),
//!             StreamEvent::Done => break,
//!             StreamEvent::Error(e) => return Err(e.into()),
//!         }
//!     }
//!     handle.wait().await;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod gesture;
pub mod streaming;

// Re-export commonly used types at crate root
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, InteractionConfig, StreamConfig,
};
pub use gesture::{
    ContactEvent, ContactHandler, EventDispatcher, Gesture, GestureClassifier, GestureConfig,
    GestureDriver, GestureEvent, GestureMapping, Point, PointerButton, PointerEventKind,
    SyntheticPointerEvent, TouchEnabled,
};
pub use streaming::{
    CancelHandle, ChannelHandler, ChatRequest, Completion, LineFramer, ProtocolParseError,
    ResponseSchema, SessionOutcome, StreamEvent, StreamHandle, StreamHandler, StreamRequest,
    StreamTransport, TransportError,
};
