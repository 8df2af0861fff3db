//! The session table: one entry per attached game-client process.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dutybell_capture::GameProcess;
use dutybell_protocol::ProcessId;

use crate::{CaptureSession, SessionControl, SessionError, SessionSnapshot, SessionState};

/// The arena of capture sessions, keyed by process id.
///
/// The table is the single source of truth for "which processes are we
/// capturing". The reconciliation loop inserts and removes entries while
/// status readers snapshot them from other tasks, so the map is sharded
/// (`DashMap`) rather than guarded by one lock.
///
/// All state changes go through the transition methods below; each one
/// checks the state machine's ordering and rejects anything else. The
/// absent states never appear in the table: a process with no entry is
/// `Unattached`, and `finish_stop` removing the entry is the `Removed`
/// transition.
///
/// `H` is the capture backend's handle type. The table itself never calls
/// into the handle; it only stores and hands it back.
pub struct SessionTable<H> {
    sessions: DashMap<ProcessId, CaptureSession<H>>,
}

impl<H> SessionTable<H> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    // -----------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------

    /// `Unattached → Attaching`: claims the process id and inserts an
    /// entry with no control half yet.
    ///
    /// The claim is atomic on the map entry, which is what enforces the
    /// one-session-per-process invariant even if two attach paths race.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyAttached`] if any entry exists for
    /// this process id, whatever its state.
    pub fn begin_attach(&self, process: GameProcess) -> Result<(), SessionError> {
        match self.sessions.entry(process.id) {
            Entry::Occupied(_) => Err(SessionError::AlreadyAttached(process.id)),
            Entry::Vacant(slot) => {
                tracing::debug!(%process, "attach started");
                slot.insert(CaptureSession::attaching(process));
                Ok(())
            }
        }
    }

    /// `Attaching → Capturing`: stores the control half delivered by a
    /// successful backend start.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] if there is no entry for `id`
    /// - [`SessionError::InvalidState`] if the entry is not `Attaching`
    pub fn activate(&self, id: ProcessId, control: SessionControl<H>) -> Result<(), SessionError> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or(SessionError::NotFound(id))?;

        if session.state != SessionState::Attaching {
            return Err(SessionError::InvalidState {
                process: id,
                state: session.state,
            });
        }

        session.state = SessionState::Capturing;
        session.control = Some(control);
        tracing::info!(process = %session.process, "capture session active");
        Ok(())
    }

    /// `Attaching → Unattached`: drops the entry after a failed backend
    /// start so the next reconciliation pass can retry.
    ///
    /// Returns `false` if the entry is missing or has moved on past
    /// `Attaching` (then nothing is dropped).
    pub fn abort_attach(&self, id: ProcessId) -> bool {
        let aborted = self
            .sessions
            .remove_if(&id, |_, session| session.state == SessionState::Attaching)
            .is_some();
        if aborted {
            tracing::debug!(process = %id, "attach aborted");
        }
        aborted
    }

    /// `Capturing → Stopping`: takes the control half out so the caller
    /// can run teardown (stop the handle, signal the pump, await it).
    ///
    /// Returns `None` unless the session is `Capturing`; calling it again
    /// mid-teardown finds `Stopping` and gets `None`, which is what makes
    /// stop idempotent at this layer.
    pub fn begin_stop(&self, id: ProcessId) -> Option<SessionControl<H>> {
        let mut session = self.sessions.get_mut(&id)?;
        if session.state != SessionState::Capturing {
            return None;
        }
        session.state = SessionState::Stopping;
        tracing::info!(process = %session.process, "stopping capture session");
        session.control.take()
    }

    /// `Stopping → Removed`: drops the entry once teardown has finished.
    ///
    /// Returns `false` if the entry is missing or not `Stopping`.
    pub fn finish_stop(&self, id: ProcessId) -> bool {
        let removed = self
            .sessions
            .remove_if(&id, |_, session| session.state == SessionState::Stopping)
            .is_some();
        if removed {
            tracing::info!(process = %id, "capture session removed");
        }
        removed
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// The state for `id`; `Unattached` when there is no entry.
    pub fn state(&self, id: ProcessId) -> SessionState {
        self.sessions
            .get(&id)
            .map(|session| session.state)
            .unwrap_or(SessionState::Unattached)
    }

    /// Whether any entry exists for `id`.
    pub fn contains(&self, id: ProcessId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// The process recorded for `id`, if an entry exists.
    pub fn process(&self, id: ProcessId) -> Option<GameProcess> {
        self.sessions.get(&id).map(|session| session.process.clone())
    }

    /// Runs `f` against the live backend handle for `id`.
    ///
    /// Returns `None` if there is no entry or the control half is taken
    /// (teardown in progress). `f` runs under the entry's shard guard and
    /// must not block or await.
    pub fn with_handle<R>(&self, id: ProcessId, f: impl FnOnce(&H) -> R) -> Option<R> {
        let session = self.sessions.get(&id)?;
        session.control.as_ref().map(|control| f(&control.handle))
    }

    /// All tracked process ids, ascending.
    pub fn pids(&self) -> Vec<ProcessId> {
        let mut pids: Vec<ProcessId> = self.sessions.iter().map(|entry| *entry.key()).collect();
        pids.sort();
        pids
    }

    /// Point-in-time snapshots of every session, ascending by process id.
    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        let mut all: Vec<SessionSnapshot> = self
            .sessions
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();
        all.sort_by_key(|snapshot| snapshot.process.id);
        all
    }

    /// Number of entries (any stored state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// `true` when no sessions are tracked.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<H> Default for SessionTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
