//! One capture session: a process bound to a capture stream.

use std::time::{Duration, Instant};

use dutybell_capture::GameProcess;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::SessionState;

/// The teardown bundle of an active session.
///
/// Created by the monitor when a session goes live and taken back out of
/// the table when it stops. Stopping uses all three parts in order: stop
/// the backend `handle`, signal `shutdown`, then await `pump` so no event
/// for this process can be published after teardown returns.
pub struct SessionControl<H> {
    /// The backend's control half.
    pub handle: H,
    /// Shutdown signal watched by the pump task.
    pub shutdown: watch::Sender<bool>,
    /// The pump task itself.
    pub pump: JoinHandle<()>,
}

/// One entry in the [`SessionTable`]: a game-client process and the
/// capture attached to it.
///
/// Sessions move through their states only via the table's transition
/// methods, which is what keeps the per-process uniqueness and ordering
/// invariants checkable in one place.
///
/// [`SessionTable`]: crate::SessionTable
pub struct CaptureSession<H> {
    pub(crate) process: GameProcess,
    pub(crate) state: SessionState,
    pub(crate) attached_at: Instant,
    pub(crate) control: Option<SessionControl<H>>,
}

impl<H> CaptureSession<H> {
    /// A fresh entry in the `Attaching` state, no control half yet.
    pub(crate) fn attaching(process: GameProcess) -> Self {
        Self {
            process,
            state: SessionState::Attaching,
            attached_at: Instant::now(),
            control: None,
        }
    }

    /// The process this session captures.
    pub fn process(&self) -> &GameProcess {
        &self.process
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Time since the attach began.
    pub fn uptime(&self) -> Duration {
        self.attached_at.elapsed()
    }

    /// Point-in-time copy for status display.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            process: self.process.clone(),
            state: self.state,
            uptime: self.uptime(),
        }
    }
}

/// A point-in-time view of one session, detached from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub process: GameProcess,
    pub state: SessionState,
    pub uptime: Duration,
}
