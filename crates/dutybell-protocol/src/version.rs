//! The versioned opcode catalogue.
//!
//! The game's wire opcodes are renumbered between client patches, and a
//! passive capture observes no version handshake it could negotiate from.
//! So the mapping is a flat, hand-maintained catalogue: one entry per
//! tracked client version, newest first. Which entry is in effect is an
//! out-of-band configuration decision made by whoever runs the monitor;
//! the decoder itself never selects or mutates anything here.
//!
//! The catalogue is `'static` and append-only: shipping support for a new
//! patch means adding one entry at index 0. Nothing is synchronized
//! because nothing is ever written at run time.

use crate::types::MessageKind;

// ---------------------------------------------------------------------------
// ProtocolVersion
// ---------------------------------------------------------------------------

/// One catalogue entry: the opcodes and layout quirks of a single tracked
/// game-client version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    /// Display name of the client patch, e.g. `"5.18"`.
    pub name: &'static str,

    /// Opcode for instance enter/leave messages.
    pub instance: u16,

    /// Opcode for world-event state messages.
    pub world_event: u16,

    /// Opcode for matchmaking-queue entry messages.
    pub duty_queue: u16,

    /// Opcode for matchmaking-completion messages.
    pub match_result: u16,

    /// Byte offset of the roulette id within the duty-queue body.
    /// Moved between patches, so it is per-version data rather than a
    /// layout constant.
    pub roulette_offset: usize,
}

impl ProtocolVersion {
    /// Classifies a wire opcode, or `None` if this version does not track
    /// that opcode.
    pub fn kind_of(&self, opcode: u16) -> Option<MessageKind> {
        match opcode {
            op if op == self.instance => Some(MessageKind::InstanceGate),
            op if op == self.world_event => Some(MessageKind::WorldEvent),
            op if op == self.duty_queue => Some(MessageKind::DutyQueue),
            op if op == self.match_result => Some(MessageKind::MatchResult),
            _ => None,
        }
    }

    /// The wire opcode this version uses for `kind`.
    pub fn opcode(&self, kind: MessageKind) -> u16 {
        match kind {
            MessageKind::InstanceGate => self.instance,
            MessageKind::WorldEvent => self.world_event,
            MessageKind::DutyQueue => self.duty_queue,
            MessageKind::MatchResult => self.match_result,
        }
    }

    /// Looks a version up by display name, for out-of-band overrides
    /// ("the client is still on 5.11, decode with that table").
    pub fn by_name(name: &str) -> Option<&'static ProtocolVersion> {
        catalog().iter().find(|v| v.name == name)
    }
}

// ---------------------------------------------------------------------------
// The catalogue
// ---------------------------------------------------------------------------

/// Every tracked client version, newest first. `5.0` also covers earlier
/// clients that shared its numbering.
static CATALOG: [ProtocolVersion; 6] = [
    ProtocolVersion {
        name: "5.18",
        instance: 0x0339,
        world_event: 0x00E3,
        duty_queue: 0x0228,
        match_result: 0x01F8,
        roulette_offset: 8,
    },
    ProtocolVersion {
        name: "5.15",
        instance: 0x0339,
        world_event: 0x00E3,
        duty_queue: 0x0193,
        match_result: 0x0135,
        roulette_offset: 8,
    },
    ProtocolVersion {
        name: "5.11hf",
        instance: 0x0339,
        world_event: 0x00E3,
        duty_queue: 0x0164,
        match_result: 0x02B0,
        roulette_offset: 8,
    },
    ProtocolVersion {
        name: "5.11",
        instance: 0x0339,
        world_event: 0x00E3,
        duty_queue: 0x0164,
        match_result: 0x032D,
        roulette_offset: 8,
    },
    ProtocolVersion {
        name: "5.1",
        instance: 0x022F,
        world_event: 0x00E3,
        duty_queue: 0x008F,
        match_result: 0x00B3,
        roulette_offset: 8,
    },
    ProtocolVersion {
        name: "5.0",
        instance: 0x022F,
        world_event: 0x0143,
        duty_queue: 0x0078,
        match_result: 0x0080,
        roulette_offset: 20,
    },
];

/// The full ordered catalogue, newest first.
pub fn catalog() -> &'static [ProtocolVersion] {
    &CATALOG
}

/// The active catalogue entry. Index 0 (the newest tracked version) unless
/// the monitor was configured with an explicit override.
pub fn selected() -> &'static ProtocolVersion {
    &CATALOG[0]
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_is_newest_entry() {
        assert_eq!(selected().name, "5.18");
        assert_eq!(selected(), &catalog()[0]);
    }

    #[test]
    fn test_catalog_names_are_unique() {
        let names: Vec<_> = catalog().iter().map(|v| v.name).collect();
        for (i, name) in names.iter().enumerate() {
            assert!(
                !names[i + 1..].contains(name),
                "duplicate catalogue name {name}"
            );
        }
    }

    #[test]
    fn test_by_name_finds_every_entry() {
        for version in catalog() {
            assert_eq!(ProtocolVersion::by_name(version.name), Some(version));
        }
    }

    #[test]
    fn test_by_name_unknown_returns_none() {
        assert_eq!(ProtocolVersion::by_name("9.99"), None);
    }

    #[test]
    fn test_kind_of_recognizes_all_four_opcodes() {
        let v = selected();
        assert_eq!(v.kind_of(v.instance), Some(MessageKind::InstanceGate));
        assert_eq!(v.kind_of(v.world_event), Some(MessageKind::WorldEvent));
        assert_eq!(v.kind_of(v.duty_queue), Some(MessageKind::DutyQueue));
        assert_eq!(v.kind_of(v.match_result), Some(MessageKind::MatchResult));
    }

    #[test]
    fn test_kind_of_unknown_opcode_returns_none() {
        assert_eq!(selected().kind_of(0xFFFF), None);
    }

    #[test]
    fn test_opcode_is_inverse_of_kind_of() {
        for version in catalog() {
            for kind in [
                MessageKind::InstanceGate,
                MessageKind::WorldEvent,
                MessageKind::DutyQueue,
                MessageKind::MatchResult,
            ] {
                assert_eq!(version.kind_of(version.opcode(kind)), Some(kind));
            }
        }
    }

    #[test]
    fn test_oldest_entry_uses_moved_roulette_offset() {
        // 5.0 predates the layout change that parked the roulette id at
        // offset 8.
        let v = ProtocolVersion::by_name("5.0").unwrap();
        assert_eq!(v.roulette_offset, 20);
        for newer in &catalog()[..5] {
            assert_eq!(newer.roulette_offset, 8);
        }
    }
}
