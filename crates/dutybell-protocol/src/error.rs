//! Error types for the protocol layer.
//!
//! Only genuinely malformed input is an error here. Buffers that are
//! merely uninteresting (noise, unknown opcodes, sub-types we ignore) are
//! `Ok(None)` from [`decode`], because they make up almost all capture
//! traffic and reporting them would be meaningless.
//!
//! [`decode`]: crate::decode

use crate::types::MessageKind;

/// A recognized message whose body is too short for its declared layout.
///
/// The decode path treats this exactly like "no event" after logging it:
/// a single bad capture must never interrupt a live session. The error
/// type exists so that bad captures are visible in debug logs instead of
/// vanishing into the same silence as ordinary noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The body ends before a field the layout requires.
    #[error("{kind} body truncated: layout needs {needed} bytes, got {len}")]
    Truncated {
        /// Which layout was being decoded.
        kind: MessageKind,
        /// Bytes the layout needs up to and including the missing field.
        needed: usize,
        /// Actual body length.
        len: usize,
    },
}
