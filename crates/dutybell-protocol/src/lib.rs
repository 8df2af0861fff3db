//! Protocol layer for Dutybell: the versioned opcode catalogue, the typed
//! event model, and the message decoder.
//!
//! Everything in this crate is pure data and pure functions. Capture I/O,
//! session lifecycle, and event fan-out live in the other Dutybell crates;
//! this one only answers the question "given these bytes and this protocol
//! version, which game event (if any) just happened?"
//!
//! # Key types
//!
//! - [`ProtocolVersion`]: one catalogue entry mapping message kinds to wire opcodes
//! - [`GameEvent`]: the normalized event a decoded message becomes
//! - [`EventRecord`]: a `GameEvent` tagged with its originating process
//! - [`decode`]: the decoder entry point
//! - [`DecodeError`]: malformed-input report (distinct from "not of interest")

mod decode;
mod error;
mod events;
mod types;
mod version;

pub use decode::{decode, BODY_OFFSET, MIN_MESSAGE_LEN, OPCODE_OFFSET};
pub use error::DecodeError;
pub use events::{EventRecord, GameEvent};
pub use types::{MessageKind, ProcessId};
pub use version::{catalog, selected, ProtocolVersion};
