//! The normalized event model produced by the decoder.
//!
//! A captured buffer either decodes into exactly one [`GameEvent`] or into
//! nothing. Events are plain values: once produced they are never mutated,
//! and the session layer wraps them in an [`EventRecord`] so consumers know
//! which game-client process they came from.

use serde::{Deserialize, Serialize};

use crate::types::{MessageKind, ProcessId};

// ---------------------------------------------------------------------------
// GameEvent
// ---------------------------------------------------------------------------

/// One recognized game-state transition.
///
/// Each variant carries the integer codes read from the wire; turning a
/// code into a display name is the name-resolution collaborator's job, not
/// this crate's.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, e.g.
/// `{ "type": "QueueEnteredRoulette", "roulette": 3 }`, which host-side
/// consumers can dispatch on without a second lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// The player entered an instanced duty.
    InstanceEnter { instance: u16 },

    /// The player left an instanced duty.
    InstanceLeave { instance: u16 },

    /// A world event began somewhere in the player's zone.
    WorldEventOccurred { world_event: u16 },

    /// The player queued for a roulette category.
    QueueEnteredRoulette { roulette: u16 },

    /// The player queued for a specific selection of instances.
    /// `instances` preserves the order the client listed them in.
    QueueEnteredAssignment { instances: Vec<u16> },

    /// Matchmaking finished; `instance` is the duty that popped.
    /// `roulette` is 0 when the queue was an assignment rather than
    /// a roulette category.
    MatchCompleted { roulette: u16, instance: u16 },
}

impl GameEvent {
    /// The message kind this event was decoded from.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::InstanceEnter { .. } | Self::InstanceLeave { .. } => MessageKind::InstanceGate,
            Self::WorldEventOccurred { .. } => MessageKind::WorldEvent,
            Self::QueueEnteredRoulette { .. } | Self::QueueEnteredAssignment { .. } => {
                MessageKind::DutyQueue
            }
            Self::MatchCompleted { .. } => MessageKind::MatchResult,
        }
    }

    /// `true` for world-event occurrences, the only kind subject to the
    /// opt-in filter.
    pub fn is_world_event(&self) -> bool {
        matches!(self, Self::WorldEventOccurred { .. })
    }
}

// ---------------------------------------------------------------------------
// EventRecord
// ---------------------------------------------------------------------------

/// A [`GameEvent`] tagged with the process that produced it.
///
/// This is the unit handed to dispatch listeners. With several game clients
/// attached the same event can legitimately arrive once per process, so the
/// tag is part of the record rather than ambient context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// The originating game-client process.
    pub process: ProcessId,

    /// The decoded event.
    pub event: GameEvent,
}

impl EventRecord {
    pub fn new(process: ProcessId, event: GameEvent) -> Self {
        Self { process, event }
    }
}

// =========================================================================
// Tests
// =========================================================================
