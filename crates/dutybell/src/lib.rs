//! # Dutybell
//!
//! Duty-event capture core for FFXIV game clients.
//!
//! Dutybell watches for running game clients, taps their network traffic
//! through a pluggable capture backend, decodes the messages that matter,
//! and hands the results to your listeners:
//!
//! ```text
//! ProcessProvider ──► Monitor ──► SessionTable
//!                        │             │ one per game client
//!                        │             ▼
//!                        │       CaptureStream ──► decode ──► EventFilter
//!                        │                                        │
//!                        └── reconciles every 10s                 ▼
//!                                                          EventDispatcher
//!                                                                 │
//!                                                             listeners
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dutybell::prelude::*;
//!
//! # async fn run() -> Result<(), MonitorError> {
//! let (backend, _control) = ReplayBackend::new();
//! let (monitor, handle) = MonitorBuilder::new()
//!     .capture_all_world_events()
//!     .listener(|record: &EventRecord| {
//!         println!("[{}] {:?}", record.process, record.event);
//!         Ok(())
//!     })
//!     .build(backend, ScriptedProcesses::new());
//!
//! tokio::spawn(monitor.run());
//! // ... later:
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod error;
mod filter;
mod monitor;
mod names;
mod pump;

pub use dispatch::{EventDispatcher, EventListener, ListenerId};
pub use error::MonitorError;
pub use filter::EventFilter;
pub use monitor::{
    Monitor, MonitorBuilder, MonitorConfig, MonitorHandle, MonitorStatus, DEFAULT_PROCESS_NAMES,
};
pub use names::{CatalogError, GameCatalog, NameResolver, PlaceholderResolver};

// The layer crates, re-exported so applications depend on `dutybell` alone.
pub use dutybell_capture::{
    CaptureBackend, CaptureError, CaptureHandle, CaptureStream, CapturedMessage, GameProcess,
    ProcessProvider, ReplayBackend, ReplayControl, ScriptedProcesses,
};
pub use dutybell_protocol::{
    catalog, decode, selected, DecodeError, EventRecord, GameEvent, MessageKind, ProcessId,
    ProtocolVersion, BODY_OFFSET, MIN_MESSAGE_LEN, OPCODE_OFFSET,
};
pub use dutybell_session::{SessionError, SessionSnapshot, SessionState};
pub use dutybell_tick::{TickConfig, TickInfo, TickMetrics, TickScheduler};

/// Everything needed to assemble and run a monitor.
pub mod prelude {
    pub use crate::{
        CaptureBackend, CaptureHandle, CaptureStream, EventListener, EventRecord, GameCatalog,
        GameEvent, GameProcess, Monitor, MonitorBuilder, MonitorError, MonitorHandle,
        MonitorStatus, NameResolver, ProcessId, ProcessProvider, ReplayBackend, ReplayControl,
        ScriptedProcesses, SessionState,
    };
}
