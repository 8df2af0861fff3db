//! World-event opt-in filter.
//!
//! Only world-event occurrences are filtered; every duty-queue, match,
//! and instance-gate event always reaches the listeners. The selection is
//! shared between the monitor's pump tasks and whatever surface lets the
//! user toggle it, so both halves sit behind lock-free containers and
//! every method takes `&self`.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashSet;
use dutybell_protocol::GameEvent;

/// Which world events the user wants to hear about.
///
/// Starts empty with capture-all off, matching a fresh install where no
/// world event has been selected yet.
#[derive(Debug, Default)]
pub struct EventFilter {
    selected: DashSet<u16>,
    capture_all: AtomicBool,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects one world event. Returns `false` if it was already selected.
    pub fn opt_in(&self, world_event: u16) -> bool {
        self.selected.insert(world_event)
    }

    /// Deselects one world event. Returns `false` if it was not selected.
    pub fn opt_out(&self, world_event: u16) -> bool {
        self.selected.remove(&world_event).is_some()
    }

    /// Drops every individual selection. Does not touch capture-all.
    pub fn clear(&self) {
        self.selected.clear();
    }

    /// Turns the capture-all switch on or off. While on, individual
    /// selections are kept but not consulted.
    pub fn set_capture_all(&self, on: bool) {
        self.capture_all.store(on, Ordering::Relaxed);
    }

    pub fn capture_all(&self) -> bool {
        self.capture_all.load(Ordering::Relaxed)
    }

    /// Whether `world_event` would currently pass the filter.
    pub fn is_selected(&self, world_event: u16) -> bool {
        self.capture_all() || self.selected.contains(&world_event)
    }

    /// The individually selected ids, ascending.
    pub fn selected(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.selected.iter().map(|id| *id).collect();
        ids.sort_unstable();
        ids
    }

    /// The dispatch decision for one decoded event.
    ///
    /// World-event occurrences pass only if selected; everything else is
    /// duty progress the user explicitly asked to be notified about, and
    /// always passes.
    pub fn should_emit(&self, event: &GameEvent) -> bool {
        match event {
            GameEvent::WorldEventOccurred { world_event } => self.is_selected(*world_event),
            _ => true,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
