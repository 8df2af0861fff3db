//! Error type for the capture boundary.

use dutybell_protocol::ProcessId;

/// Errors that can occur in a capture backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// Capture could not attach to the process (permissions, capture
    /// device unavailable, backend left in a bad state). Transient: the
    /// next reconciliation pass retries.
    #[error("could not attach capture to {process}: {reason}")]
    AttachFailed { process: ProcessId, reason: String },

    /// The backend failed mid-stream.
    #[error("capture backend failed: {0}")]
    Backend(String),

    /// The operation targeted a capture session that is already stopped.
    #[error("capture session already stopped")]
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_failed_names_the_process() {
        let err = CaptureError::AttachFailed {
            process: ProcessId(77),
            reason: "permission denied".into(),
        };
        assert_eq!(
            err.to_string(),
            "could not attach capture to pid-77: permission denied"
        );
    }
}
