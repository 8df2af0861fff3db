//! The message decoder: raw captured bytes in, at most one event out.
//!
//! Every captured buffer shares a fixed envelope; everything after the
//! envelope is a kind-specific body:
//!
//! ```text
//! byte 0                    18      20            32
//! ┌─────────────────────────┬───────┬─────────────┬──────────────────┐
//! │ routing / segment header│ opcode│  (reserved) │ body…            │
//! └─────────────────────────┴───────┴─────────────┴──────────────────┘
//!                            u16 LE                 layout depends on
//!                                                   the opcode's kind
//! ```
//!
//! Decoding is deliberately fail-open. Capture hands us every message the
//! client exchanges, so almost everything is noise: too short, an opcode
//! we do not track, or a sub-type we do not care about. All of that is
//! `Ok(None)`. Only a *recognized* opcode whose body ends before a field
//! its layout requires is an error, and callers treat even that as "no
//! event" once it has been logged. Nothing here can fault the capture
//! path.
//!
//! All functions are pure: no state, no I/O, the selected
//! [`ProtocolVersion`] arrives as an argument.

use crate::error::DecodeError;
use crate::events::GameEvent;
use crate::types::MessageKind;
use crate::version::ProtocolVersion;

/// Messages shorter than this cannot carry the envelope and are noise.
pub const MIN_MESSAGE_LEN: usize = 32;

/// Byte offset of the little-endian u16 opcode within the envelope.
pub const OPCODE_OFFSET: usize = 18;

/// Byte offset where the kind-specific body begins.
pub const BODY_OFFSET: usize = 32;

/// World-event sub-type that marks an occurrence (the event spawning).
/// Progress ticks and despawns use other values and are ignored.
const OCCURRENCE_SUB_TYPE: u8 = 0x74;

/// Instance-gate sub-types for entering and leaving a duty.
const ENTER_SUB_TYPE: u8 = 0x0B;
const LEAVE_SUB_TYPE: u8 = 0x0C;

/// Accepted values of the duty-queue region discriminator at body
/// offset 15. The two client distributions mark the byte differently.
const REGION_MARKERS: [u8; 2] = [0x00, 0x40];

/// Byte offset of the region discriminator within the duty-queue body.
const REGION_OFFSET: usize = 15;

/// Instance-id slots in an assignment queue entry: up to five u16 values
/// starting at body offset 12, one every 4 bytes, zero-terminated.
const ASSIGNMENT_BASE: usize = 12;
const ASSIGNMENT_STRIDE: usize = 4;
const ASSIGNMENT_SLOTS: usize = 5;

/// Decodes one captured message against one catalogue entry.
///
/// Returns `Ok(Some(event))` for the handful of messages that matter,
/// `Ok(None)` for everything uninteresting, and `Err` only when a
/// recognized opcode's body is truncated (see [`DecodeError`]).
pub fn decode(
    raw: &[u8],
    version: &ProtocolVersion,
) -> Result<Option<GameEvent>, DecodeError> {
    if raw.len() < MIN_MESSAGE_LEN {
        return Ok(None);
    }

    // Safe to index directly: the length guard above covers offset 18..20.
    let opcode = u16::from_le_bytes([raw[OPCODE_OFFSET], raw[OPCODE_OFFSET + 1]]);
    let Some(kind) = version.kind_of(opcode) else {
        return Ok(None);
    };

    let body = &raw[BODY_OFFSET..];
    match kind {
        MessageKind::InstanceGate => decode_instance_gate(body),
        MessageKind::WorldEvent => decode_world_event(body),
        MessageKind::DutyQueue => decode_duty_queue(body, version.roulette_offset),
        MessageKind::MatchResult => decode_match_result(body),
    }
}

// ---------------------------------------------------------------------------
// Per-kind body layouts
// ---------------------------------------------------------------------------

/// World-event body: sub-type at 0, world-event id at 4.
fn decode_world_event(body: &[u8]) -> Result<Option<GameEvent>, DecodeError> {
    let kind = MessageKind::WorldEvent;
    let sub_type = body_u8(body, 0, kind)?;
    if sub_type != OCCURRENCE_SUB_TYPE {
        return Ok(None);
    }
    let world_event = body_u16(body, 4, kind)?;
    Ok(Some(GameEvent::WorldEventOccurred { world_event }))
}

/// Duty-queue body: roulette id at the version's offset, region byte at
/// 15, instance-id slots from 12.
///
/// A non-zero roulette id with a plausible region byte means the player
/// queued a roulette category. Otherwise the slot list is scanned; the
/// first zero slot ends it. An entry with no roulette and no instances
/// decodes to nothing (the client sends such frames during queue
/// withdrawal).
fn decode_duty_queue(
    body: &[u8],
    roulette_offset: usize,
) -> Result<Option<GameEvent>, DecodeError> {
    let kind = MessageKind::DutyQueue;

    let roulette = body_u16(body, roulette_offset, kind)?;
    if roulette != 0 {
        let region = body_u8(body, REGION_OFFSET, kind)?;
        if REGION_MARKERS.contains(&region) {
            return Ok(Some(GameEvent::QueueEnteredRoulette { roulette }));
        }
    }

    let mut instances = Vec::new();
    for slot in 0..ASSIGNMENT_SLOTS {
        let id = body_u16(body, ASSIGNMENT_BASE + slot * ASSIGNMENT_STRIDE, kind)?;
        if id == 0 {
            break;
        }
        instances.push(id);
    }
    if instances.is_empty() {
        return Ok(None);
    }
    Ok(Some(GameEvent::QueueEnteredAssignment { instances }))
}

/// Match-result body: roulette id at 2 (zero for assignment queues),
/// matched instance id at 20.
fn decode_match_result(body: &[u8]) -> Result<Option<GameEvent>, DecodeError> {
    let kind = MessageKind::MatchResult;
    let roulette = body_u16(body, 2, kind)?;
    let instance = body_u16(body, 20, kind)?;
    Ok(Some(GameEvent::MatchCompleted { roulette, instance }))
}

/// Instance-gate body: instance id at 4, direction sub-type at 8.
fn decode_instance_gate(body: &[u8]) -> Result<Option<GameEvent>, DecodeError> {
    let kind = MessageKind::InstanceGate;
    let instance = body_u16(body, 4, kind)?;
    match body_u8(body, 8, kind)? {
        ENTER_SUB_TYPE => Ok(Some(GameEvent::InstanceEnter { instance })),
        LEAVE_SUB_TYPE => Ok(Some(GameEvent::InstanceLeave { instance })),
        _ => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Field readers
// ---------------------------------------------------------------------------

fn body_u16(body: &[u8], offset: usize, kind: MessageKind) -> Result<u16, DecodeError> {
    body.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(DecodeError::Truncated {
            kind,
            needed: offset + 2,
            len: body.len(),
        })
}

fn body_u8(body: &[u8], offset: usize, kind: MessageKind) -> Result<u8, DecodeError> {
    body.get(offset).copied().ok_or(DecodeError::Truncated {
        kind,
        needed: offset + 1,
        len: body.len(),
    })
}

// =========================================================================
// Tests
// =========================================================================
