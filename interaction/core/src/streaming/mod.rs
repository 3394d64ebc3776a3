//! Streaming Chat Transport
//!
//! Consumes a chat completions endpoint that streams its answer as
//! newline-delimited `data:` records.
//!
//! ```text
//! StreamRequest ──► StreamTransport::start ──► tokio task
//!                                                 │ bytes_stream()
//!                                                 ▼
//!                                            LineFramer
//!                                                 │ records
//!                                                 ▼
//!                                      parse_record / parse_fragment
//!                                                 │
//!                                                 ▼
//!                          StreamHandler::{on_fragment, on_done, on_error}
//! ```
//!
//! Cancellation goes through [`StreamHandle::cancel`]; it is idempotent and
//! never reported as an error.

mod completion;
mod error;
mod framer;
mod protocol;
mod transport;

pub use completion::{Completion, ResponseSchema, DEFAULT_SCHEMA_NAME};
pub use error::{ProtocolParseError, TransportError};
pub use framer::{LineFramer, Records};
pub use protocol::{
    parse_fragment, parse_record, ChatMessage, ChatRequest, ChatRole, Record, StreamRequest,
    DATA_PREFIX, DONE_SENTINEL,
};
pub use transport::{
    CancelHandle, ChannelHandler, SessionOutcome, StreamEvent, StreamHandle, StreamHandler,
    StreamTransport,
};
