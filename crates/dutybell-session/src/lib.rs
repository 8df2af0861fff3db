//! Capture-session lifecycle for Dutybell.
//!
//! One session binds one live game-client process to one capture stream.
//! This crate owns the session state machine and the concurrent table the
//! reconciliation loop drives; the loop itself (discovery, timers, the
//! decode pump) lives in the `dutybell` crate.
//!
//! ```text
//! Unattached ──→ Attaching ──→ Capturing ──→ Stopping ──→ Removed
//!     ▲              │
//!     └──────────────┘  attach failed; retried next pass
//! ```
//!
//! `Unattached` and `Removed` are the absent states: the table stores an
//! entry only between `begin_attach` and `finish_stop`, so "no entry" and
//! "no session" are the same fact and cannot drift apart.
//!
//! # Key types
//!
//! - [`SessionState`]: the lifecycle state machine
//! - [`CaptureSession`]: one table entry (process, state, control half)
//! - [`SessionControl`]: the take-able teardown bundle (handle, shutdown, pump)
//! - [`SessionTable`]: the process-id-keyed arena with transition methods
//! - [`SessionError`]: transition violations

mod error;
mod session;
mod state;
mod table;

pub use error::SessionError;
pub use session::{CaptureSession, SessionControl, SessionSnapshot};
pub use state::SessionState;
pub use table::SessionTable;
