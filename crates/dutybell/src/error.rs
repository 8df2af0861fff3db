//! Unified error type for the Dutybell monitor.

use dutybell_capture::CaptureError;
use dutybell_session::SessionError;

/// Top-level error that wraps the sub-crate errors a monitor can surface.
///
/// When using the `dutybell` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
///
/// Decode errors never appear here: an undecodable capture is logged and
/// dropped inside the pump, it is not a fault of the monitor.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// A capture-level error (attach, backend, stream).
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// A session-level error (duplicate attach, invalid transition).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The monitor's run loop has already exited.
    #[error("monitor is not running")]
    NotRunning,
}
