//! Identity and classification types shared across the Dutybell crates.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ProcessId
// ---------------------------------------------------------------------------

/// The OS process id of one attached game client.
///
/// A newtype over `u32` so a process id cannot be confused with an event
/// code or an opcode in a signature. Every [`EventRecord`] carries one so
/// downstream consumers can tell which client produced the event when
/// several are attached at once.
///
/// `#[serde(transparent)]` keeps the JSON form a plain number, which is
/// what host-side log consumers expect.
///
/// [`EventRecord`]: crate::EventRecord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// The logical kind of a captured message, as classified by its opcode.
///
/// The wire value of each kind changes between game client patches; the
/// [`ProtocolVersion`] catalogue owns the kind → opcode mapping, and this
/// enum is the patch-independent name used everywhere else (decoder
/// dispatch, error reports, logging).
///
/// [`ProtocolVersion`]: crate::ProtocolVersion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Entering or leaving an instanced duty.
    InstanceGate,
    /// A world event (transient open-world activity) changed state.
    WorldEvent,
    /// The player entered the matchmaking queue.
    DutyQueue,
    /// Matchmaking completed and an instance was assigned.
    MatchResult,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InstanceGate => "instance-gate",
            Self::WorldEvent => "world-event",
            Self::DutyQueue => "duty-queue",
            Self::MatchResult => "match-result",
        };
        f.write_str(name)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_id_serializes_as_plain_number() {
        // `#[serde(transparent)]` means ProcessId(42) → `42`, not `{"0":42}`.
        let json = serde_json::to_string(&ProcessId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_process_id_deserializes_from_plain_number() {
        let pid: ProcessId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, ProcessId(42));
    }

    #[test]
    fn test_process_id_display() {
        assert_eq!(ProcessId(9408).to_string(), "pid-9408");
    }

    #[test]
    fn test_message_kind_display_names() {
        assert_eq!(MessageKind::InstanceGate.to_string(), "instance-gate");
        assert_eq!(MessageKind::WorldEvent.to_string(), "world-event");
        assert_eq!(MessageKind::DutyQueue.to_string(), "duty-queue");
        assert_eq!(MessageKind::MatchResult.to_string(), "match-result");
    }
}
