//! Error types for the session layer.

use dutybell_protocol::ProcessId;

use crate::SessionState;

/// Errors that can occur when driving session lifecycle transitions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A session already exists for this process id. The table holds at
    /// most one entry per live process.
    #[error("session for {0} already exists")]
    AlreadyAttached(ProcessId),

    /// No session exists for this process id.
    #[error("no session for {0}")]
    NotFound(ProcessId),

    /// The session is not in the state the transition requires.
    #[error("session for {process} is {state}, transition rejected")]
    InvalidState {
        process: ProcessId,
        state: SessionState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message_names_process_and_state() {
        let err = SessionError::InvalidState {
            process: ProcessId(4),
            state: SessionState::Stopping,
        };
        assert_eq!(
            err.to_string(),
            "session for pid-4 is stopping, transition rejected"
        );
    }
}
