//! A scripted process provider.

use std::sync::Arc;

use dashmap::DashMap;
use dutybell_protocol::ProcessId;

use crate::{GameProcess, ProcessProvider};

/// An in-memory [`ProcessProvider`] whose process list is driven by the
/// test or demo: `launch` a process, later `exit` it, and the monitor's
/// discovery sees the change on its next pass.
///
/// Clones share one process list, so the copy handed to the monitor and
/// the copy kept by the test observe the same launches and exits.
#[derive(Clone, Default)]
pub struct ScriptedProcesses {
    processes: Arc<DashMap<ProcessId, String>>,
}

impl ScriptedProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a running process.
    pub fn launch(&self, id: ProcessId, name: impl Into<String>) {
        self.processes.insert(id, name.into());
    }

    /// Removes a process, as if it exited.
    pub fn exit(&self, id: ProcessId) {
        self.processes.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

impl ProcessProvider for ScriptedProcesses {
    fn discover(&self) -> Vec<GameProcess> {
        let mut found: Vec<GameProcess> = self
            .processes
            .iter()
            .map(|entry| GameProcess::new(*entry.key(), entry.value().clone()))
            .collect();
        // Deterministic order keeps discovery logs and tests stable.
        found.sort_by_key(|process| process.id);
        found
    }

    fn is_alive(&self, id: ProcessId) -> bool {
        self.processes.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_lists_launched_processes_in_pid_order() {
        let provider = ScriptedProcesses::new();
        provider.launch(ProcessId(30), "ffxiv_dx11");
        provider.launch(ProcessId(10), "ffxiv");
        provider.launch(ProcessId(20), "ffxiv_dx11");

        let names: Vec<u32> = provider.discover().iter().map(|p| p.id.0).collect();
        assert_eq!(names, vec![10, 20, 30]);
    }

    #[test]
    fn test_exit_removes_liveness() {
        let provider = ScriptedProcesses::new();
        provider.launch(ProcessId(1), "ffxiv_dx11");
        assert!(provider.is_alive(ProcessId(1)));

        provider.exit(ProcessId(1));
        assert!(!provider.is_alive(ProcessId(1)));
        assert!(provider.is_empty());
    }

    #[test]
    fn test_relaunch_with_same_pid_replaces_entry() {
        let provider = ScriptedProcesses::new();
        provider.launch(ProcessId(1), "ffxiv");
        provider.launch(ProcessId(1), "ffxiv_dx11");

        let found = provider.discover();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "ffxiv_dx11");
    }
}
