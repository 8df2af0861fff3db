//! A scripted capture backend.
//!
//! `ReplayBackend` implements the full [`CaptureBackend`] contract over
//! in-memory channels instead of a packet tap. The paired
//! [`ReplayControl`] is the test's (or demo's) side of the wire: it feeds
//! frames, injects faults, and ends streams, exercising every path a real
//! backend can take without touching a socket.
//!
//! The backend and its control share one map of per-process feeds.
//! Stopping a handle removes the feed, which closes the channel; the
//! stream drains whatever was already queued and then reports
//! end-of-stream, exactly the drain-then-close behavior a real capture
//! library exhibits.

use std::sync::Arc;

use dashmap::DashMap;
use dutybell_protocol::ProcessId;
use tokio::sync::mpsc;

use crate::{CaptureBackend, CaptureError, CaptureHandle, CaptureStream};
use crate::{CapturedMessage, GameProcess};

enum Frame {
    Data(Vec<u8>),
    Fault(String),
}

#[derive(Debug, Default)]
struct Shared {
    /// Live feeds, keyed by process. Presence doubles as the running flag.
    feeds: DashMap<ProcessId, mpsc::UnboundedSender<Frame>>,
    /// Scripted one-shot attach failures.
    attach_failures: DashMap<ProcessId, String>,
    /// How often each live session was asked to refresh connections.
    refresh_counts: DashMap<ProcessId, u64>,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// The scripted backend. Hand this to the monitor; keep the
/// [`ReplayControl`] to drive traffic.
pub struct ReplayBackend {
    shared: Arc<Shared>,
}

impl ReplayBackend {
    /// Creates a backend plus the control handle that scripts it.
    pub fn new() -> (Self, ReplayControl) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                shared: Arc::clone(&shared),
            },
            ReplayControl { shared },
        )
    }
}

impl CaptureBackend for ReplayBackend {
    type Handle = ReplayHandle;
    type Stream = ReplayStream;

    async fn start(
        &self,
        process: &GameProcess,
    ) -> Result<(Self::Handle, Self::Stream), CaptureError> {
        if let Some((_, reason)) = self.shared.attach_failures.remove(&process.id) {
            return Err(CaptureError::AttachFailed {
                process: process.id,
                reason,
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        // Replacing an existing feed drops its sender, ending the old
        // stream. The session layer never double-attaches, but a stray
        // restart must not leave two writers for one process.
        self.shared.feeds.insert(process.id, tx);
        tracing::debug!(%process, "replay capture attached");

        Ok((
            ReplayHandle {
                process: process.id,
                shared: Arc::clone(&self.shared),
            },
            ReplayStream {
                process: process.id,
                rx,
            },
        ))
    }
}

// ---------------------------------------------------------------------------
// Handle + stream
// ---------------------------------------------------------------------------

/// Control half of a scripted session.
#[derive(Debug)]
pub struct ReplayHandle {
    process: ProcessId,
    shared: Arc<Shared>,
}

impl CaptureHandle for ReplayHandle {
    fn stop(&self) {
        if self.shared.feeds.remove(&self.process).is_some() {
            tracing::debug!(process = %self.process, "replay capture stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.shared.feeds.contains_key(&self.process)
    }

    fn refresh_connections(&self, process: &GameProcess) -> Result<(), CaptureError> {
        if !self.shared.feeds.contains_key(&process.id) {
            return Err(CaptureError::Stopped);
        }
        *self.shared.refresh_counts.entry(process.id).or_insert(0) += 1;
        Ok(())
    }
}

/// Message half of a scripted session.
#[derive(Debug)]
pub struct ReplayStream {
    process: ProcessId,
    rx: mpsc::UnboundedReceiver<Frame>,
}

impl CaptureStream for ReplayStream {
    async fn recv(&mut self) -> Result<Option<CapturedMessage>, CaptureError> {
        match self.rx.recv().await {
            Some(Frame::Data(payload)) => Ok(Some(CapturedMessage {
                process: self.process,
                payload,
            })),
            Some(Frame::Fault(reason)) => Err(CaptureError::Backend(reason)),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// The scripting side of a [`ReplayBackend`].
#[derive(Clone)]
pub struct ReplayControl {
    shared: Arc<Shared>,
}

impl ReplayControl {
    /// Queues one captured frame for `id`. Returns `false` if no session
    /// is attached to that process (the frame is dropped, as a real tap
    /// would drop traffic for an unwatched process).
    pub fn feed(&self, id: ProcessId, payload: impl Into<Vec<u8>>) -> bool {
        match self.shared.feeds.get(&id) {
            Some(tx) => tx.send(Frame::Data(payload.into())).is_ok(),
            None => false,
        }
    }

    /// Queues a backend fault; the stream's next `recv` after draining
    /// earlier frames returns `CaptureError::Backend(reason)`.
    pub fn fail_stream(&self, id: ProcessId, reason: impl Into<String>) -> bool {
        match self.shared.feeds.get(&id) {
            Some(tx) => tx.send(Frame::Fault(reason.into())).is_ok(),
            None => false,
        }
    }

    /// Ends `id`'s stream from the backend side, as if the capture
    /// library lost the process.
    pub fn end_stream(&self, id: ProcessId) {
        self.shared.feeds.remove(&id);
    }

    /// Makes the next `start` for `id` fail with the given reason.
    /// One-shot: the attempt after that succeeds again.
    pub fn fail_next_attach(&self, id: ProcessId, reason: impl Into<String>) {
        self.shared.attach_failures.insert(id, reason.into());
    }

    /// Whether a session is currently attached to `id`.
    pub fn is_attached(&self, id: ProcessId) -> bool {
        self.shared.feeds.contains_key(&id)
    }

    /// How many times `id`'s session was asked to refresh connections.
    pub fn refresh_count(&self, id: ProcessId) -> u64 {
        self.shared
            .refresh_counts
            .get(&id)
            .map(|count| *count)
            .unwrap_or(0)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn process(n: u32) -> GameProcess {
        GameProcess::new(ProcessId(n), "ffxiv_dx11")
    }

    #[tokio::test]
    async fn test_fed_frames_arrive_in_order_with_process_tag() {
        let (backend, control) = ReplayBackend::new();
        let (_handle, mut stream) = backend.start(&process(7)).await.unwrap();

        control.feed(ProcessId(7), vec![1, 2]);
        control.feed(ProcessId(7), vec![3]);

        let first = stream.recv().await.unwrap().unwrap();
        assert_eq!(first.process, ProcessId(7));
        assert_eq!(first.payload, vec![1, 2]);

        let second = stream.recv().await.unwrap().unwrap();
        assert_eq!(second.payload, vec![3]);
    }

    #[tokio::test]
    async fn test_stop_drains_queued_frames_then_ends_stream() {
        let (backend, control) = ReplayBackend::new();
        let (handle, mut stream) = backend.start(&process(7)).await.unwrap();

        control.feed(ProcessId(7), vec![9]);
        handle.stop();

        // Queued frame still arrives, then clean end-of-stream.
        assert!(stream.recv().await.unwrap().is_some());
        assert!(stream.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_flips_is_running() {
        let (backend, _control) = ReplayBackend::new();
        let (handle, _stream) = backend.start(&process(7)).await.unwrap();

        assert!(handle.is_running());
        handle.stop();
        handle.stop();
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_feed_after_stop_reports_dropped_frame() {
        let (backend, control) = ReplayBackend::new();
        let (handle, _stream) = backend.start(&process(7)).await.unwrap();

        handle.stop();
        assert!(!control.feed(ProcessId(7), vec![1]));
    }

    #[tokio::test]
    async fn test_scripted_attach_failure_is_one_shot() {
        let (backend, control) = ReplayBackend::new();
        control.fail_next_attach(ProcessId(7), "capture device busy");

        let err = backend.start(&process(7)).await.unwrap_err();
        assert!(matches!(err, CaptureError::AttachFailed { .. }));

        // The retry succeeds.
        assert!(backend.start(&process(7)).await.is_ok());
    }

    #[tokio::test]
    async fn test_stream_fault_surfaces_as_backend_error() {
        let (backend, control) = ReplayBackend::new();
        let (_handle, mut stream) = backend.start(&process(7)).await.unwrap();

        control.fail_stream(ProcessId(7), "tap desynced");
        let err = stream.recv().await.unwrap_err();
        assert_eq!(err, CaptureError::Backend("tap desynced".into()));
    }

    #[tokio::test]
    async fn test_refresh_counts_per_process_and_fails_after_stop() {
        let (backend, control) = ReplayBackend::new();
        let p = process(7);
        let (handle, _stream) = backend.start(&p).await.unwrap();

        handle.refresh_connections(&p).unwrap();
        handle.refresh_connections(&p).unwrap();
        assert_eq!(control.refresh_count(ProcessId(7)), 2);

        handle.stop();
        assert_eq!(
            handle.refresh_connections(&p),
            Err(CaptureError::Stopped)
        );
    }

    #[tokio::test]
    async fn test_end_stream_simulates_backend_side_loss() {
        let (backend, control) = ReplayBackend::new();
        let (handle, mut stream) = backend.start(&process(7)).await.unwrap();

        control.end_stream(ProcessId(7));
        assert!(stream.recv().await.unwrap().is_none());
        assert!(!handle.is_running());
    }
}
