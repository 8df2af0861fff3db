//! Per-session capture pump: read, decode, filter, dispatch.
//!
//! Each activated capture session gets its own Tokio task running this
//! pump. The flow is:
//!   1. Receive a captured message (or the shutdown signal)
//!   2. Decode it against the configured opcode table
//!   3. Apply the world-event filter
//!   4. Publish the surviving event to the listeners
//!
//! The pump exits on shutdown, on clean end-of-stream, or on a stream
//! error; in every case the reconciliation loop notices and retires the
//! session. Shutdown is checked before pending messages, so once the
//! session layer has signalled stop, nothing further is dispatched.

use std::sync::Arc;

use dutybell_capture::{CaptureStream, CapturedMessage};
use dutybell_protocol::{decode, EventRecord, ProcessId, ProtocolVersion};
use tokio::sync::watch;

use crate::dispatch::EventDispatcher;
use crate::filter::EventFilter;

/// Pumps a single session's stream until it ends or stop is signalled.
pub(crate) async fn pump_session<S: CaptureStream>(
    mut stream: S,
    process: ProcessId,
    version: &'static ProtocolVersion,
    filter: Arc<EventFilter>,
    dispatcher: Arc<EventDispatcher>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::debug!(%process, "capture pump started");

    loop {
        tokio::select! {
            biased;

            // Also fires when the sender side is dropped.
            _ = shutdown.changed() => {
                break;
            }

            next = stream.recv() => match next {
                Ok(Some(message)) => {
                    handle_message(&message, version, &filter, &dispatcher).await;
                }
                Ok(None) => {
                    tracing::debug!(%process, "capture stream ended");
                    break;
                }
                Err(error) => {
                    tracing::warn!(%process, %error, "capture stream failed");
                    break;
                }
            }
        }
    }

    tracing::debug!(%process, "capture pump stopped");
}

/// Decodes one captured message and publishes the event, if any.
async fn handle_message(
    message: &CapturedMessage,
    version: &ProtocolVersion,
    filter: &EventFilter,
    dispatcher: &EventDispatcher,
) {
    let event = match decode(&message.payload, version) {
        Ok(Some(event)) => event,
        // The tap sees the whole connection; nearly everything is noise.
        Ok(None) => return,
        Err(error) => {
            tracing::debug!(
                process = %message.process,
                %error,
                "dropping undecodable message"
            );
            return;
        }
    };

    if !filter.should_emit(&event) {
        tracing::trace!(
            process = %message.process,
            kind = %event.kind(),
            "event filtered out"
        );
        return;
    }

    dispatcher
        .publish(&EventRecord::new(message.process, event))
        .await;
}
