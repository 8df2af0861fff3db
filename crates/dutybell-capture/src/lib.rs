//! Capture abstraction layer for Dutybell.
//!
//! The actual packet-capture machinery (raw socket taps, stream
//! reassembly, per-process connection tracking) lives outside this
//! workspace. This crate defines the seam it plugs into: the
//! [`CaptureBackend`] family of traits the session manager drives, and the
//! [`ProcessProvider`] trait it discovers game clients through.
//!
//! The split between [`CaptureHandle`] and [`CaptureStream`] is
//! deliberate: the handle (stop / liveness / connection refresh) stays
//! with the session table, while the stream moves into the per-session
//! pump task that reads it. Handle methods are synchronous so lifecycle
//! code never awaits while it holds a table entry.
//!
//! # Feature flags
//!
//! - `replay` (default): scripted in-memory backend and process provider
//!   used by the integration tests and the demo binary

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "replay")]
mod replay;
#[cfg(feature = "replay")]
mod scripted;

pub use error::CaptureError;
#[cfg(feature = "replay")]
pub use replay::{ReplayBackend, ReplayControl, ReplayHandle, ReplayStream};
#[cfg(feature = "replay")]
pub use scripted::ScriptedProcesses;

use std::fmt;

use dutybell_protocol::ProcessId;

// ---------------------------------------------------------------------------
// Data carriers
// ---------------------------------------------------------------------------

/// One discovered game-client process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProcess {
    /// OS process id.
    pub id: ProcessId,
    /// Executable name the process was discovered under.
    pub name: String,
}

impl GameProcess {
    pub fn new(id: ProcessId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for GameProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// One reassembled application-layer message captured from a process.
///
/// The backend performs TCP reassembly; by the time a message reaches
/// this type it is a complete protocol frame, tagged with the process it
/// was captured from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMessage {
    /// The process the message was captured from.
    pub process: ProcessId,
    /// The whole application-layer frame.
    pub payload: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Capture traits
// ---------------------------------------------------------------------------

/// Attaches capture to game-client processes.
pub trait CaptureBackend: Send + Sync + 'static {
    /// The control half handed to the session table.
    type Handle: CaptureHandle;
    /// The message stream handed to the pump task.
    type Stream: CaptureStream;

    /// Begins capturing `process`'s traffic.
    ///
    /// On success the process's messages flow through the returned stream
    /// until the handle is stopped or the process exits. Attach failures
    /// (permissions, capture device state) are transient from the
    /// caller's perspective: the session manager retries on its next
    /// reconciliation pass.
    fn start(
        &self,
        process: &GameProcess,
    ) -> impl Future<Output = Result<(Self::Handle, Self::Stream), CaptureError>> + Send;
}

/// Control half of one capture session.
pub trait CaptureHandle: Send + Sync + 'static {
    /// Stops capturing. Idempotent. After `stop` returns the paired
    /// stream drains and then reports end-of-stream; no new messages are
    /// produced.
    fn stop(&self);

    /// Whether the backend is still actively capturing this process.
    fn is_running(&self) -> bool;

    /// Tells the backend to re-scan the process's network connections.
    ///
    /// Game clients open new server connections when the player changes
    /// zones; backends that track sockets per process need this nudge.
    /// Called periodically for every live session.
    fn refresh_connections(&self, process: &GameProcess) -> Result<(), CaptureError>;
}

/// Message half of one capture session.
pub trait CaptureStream: Send + 'static {
    /// Receives the next captured message.
    ///
    /// Returns `Ok(None)` when the stream has ended (the handle was
    /// stopped or the process went away). Messages arrive in capture
    /// order for this process.
    fn recv(&mut self)
        -> impl Future<Output = Result<Option<CapturedMessage>, CaptureError>> + Send;
}

// ---------------------------------------------------------------------------
// Process discovery
// ---------------------------------------------------------------------------

/// Enumerates live game-client processes.
///
/// Production integrations wrap whatever the platform offers (toolhelp
/// snapshots, /proc walks); the in-tree [`ScriptedProcesses`] drives tests
/// and demos.
pub trait ProcessProvider: Send + Sync + 'static {
    /// All candidate game-client processes currently running.
    fn discover(&self) -> Vec<GameProcess>;

    /// Whether `id` is still alive.
    fn is_alive(&self, id: ProcessId) -> bool;
}
