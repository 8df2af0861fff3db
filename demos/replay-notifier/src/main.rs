//! Replays a scripted play session through the full capture pipeline and
//! prints a desktop-notification line for each duty event, with ids
//! resolved to names through a catalog.
//!
//! Run with `RUST_LOG=debug` to watch the monitor's own logs interleave
//! with the notifications.

use std::sync::Arc;
use std::time::Duration;

use dutybell::prelude::*;
use dutybell::{selected, MIN_MESSAGE_LEN, OPCODE_OFFSET};

// ---------------------------------------------------------------------------
// Catalog and notifier
// ---------------------------------------------------------------------------

/// A slice of the real duty catalog, enough for the scripted session.
const CATALOG: &str = r#"{
    "instances": {
        "4": "Sastasha",
        "55": "The Vault"
    },
    "roulettes": {
        "1": "Duty Roulette: Leveling"
    },
    "areas": {
        "397": {
            "name": "Coerthas Western Highlands",
            "world_events": {
                "705": "Rime of the Ancient Wyrm"
            }
        }
    }
}"#;

/// Prints one line per duty event, names resolved through the catalog.
struct NotifyListener {
    catalog: Arc<GameCatalog>,
}

impl EventListener for NotifyListener {
    fn on_event(&self, record: &EventRecord) -> anyhow::Result<()> {
        println!("[{}] {}", record.process, self.catalog.describe(&record.event));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scripted wire frames
// ---------------------------------------------------------------------------

fn frame(opcode: u16, body: &[u8]) -> Vec<u8> {
    let mut raw = vec![0u8; MIN_MESSAGE_LEN];
    raw[OPCODE_OFFSET..OPCODE_OFFSET + 2].copy_from_slice(&opcode.to_le_bytes());
    raw.extend_from_slice(body);
    raw
}

fn roulette_queue_frame(roulette: u16) -> Vec<u8> {
    let mut body = vec![0u8; 40];
    let at = selected().roulette_offset;
    body[at..at + 2].copy_from_slice(&roulette.to_le_bytes());
    frame(selected().duty_queue, &body)
}

fn match_frame(roulette: u16, instance: u16) -> Vec<u8> {
    let mut body = vec![0u8; 24];
    body[2..4].copy_from_slice(&roulette.to_le_bytes());
    body[20..22].copy_from_slice(&instance.to_le_bytes());
    frame(selected().match_result, &body)
}

fn gate_frame(instance: u16, sub_type: u8) -> Vec<u8> {
    let mut body = vec![0u8; 12];
    body[4..6].copy_from_slice(&instance.to_le_bytes());
    body[8] = sub_type;
    frame(selected().instance, &body)
}

fn world_event_frame(id: u16) -> Vec<u8> {
    let mut body = vec![0u8; 8];
    body[0] = 0x74;
    body[4..6].copy_from_slice(&id.to_le_bytes());
    frame(selected().world_event, &body)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let catalog = Arc::new(GameCatalog::from_json(CATALOG)?);
    let (backend, control) = ReplayBackend::new();
    let processes = ScriptedProcesses::new();

    let (monitor, handle) = MonitorBuilder::new()
        .manual_reconcile()
        .capture_all_world_events()
        .listener(NotifyListener {
            catalog: Arc::clone(&catalog),
        })
        .build(backend, processes.clone());
    let monitor = tokio::spawn(monitor.run());

    // The game client appears; the next pass attaches to it.
    let client = ProcessId(9408);
    processes.launch(client, "ffxiv_dx11");
    handle.reconcile_now().await?;

    // One evening of duty finder, replayed off the wire.
    control.feed(client, roulette_queue_frame(1));
    tokio::time::sleep(Duration::from_millis(50)).await;
    control.feed(client, match_frame(1, 55));
    control.feed(client, gate_frame(55, 0x0B));
    tokio::time::sleep(Duration::from_millis(50)).await;
    control.feed(client, world_event_frame(705));
    control.feed(client, gate_frame(55, 0x0C));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let status = handle.status().await?;
    eprintln!(
        "capturing {} client(s), up {:?}",
        status.capturing(),
        status.uptime
    );

    let stopped = handle.shutdown().await?;
    eprintln!("stopped {stopped} capture session(s)");
    monitor.await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_parses_and_names_the_vault() {
        let catalog = GameCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.instance_name(55), Some("The Vault"));
        assert_eq!(catalog.world_event_name(705), Some("Rime of the Ancient Wyrm"));
    }

    #[test]
    fn test_describe_formats_a_match_notification() {
        let catalog = GameCatalog::from_json(CATALOG).unwrap();
        let text = catalog.describe(&GameEvent::MatchCompleted {
            roulette: 1,
            instance: 55,
        });
        assert_eq!(text, "match found for Duty Roulette: Leveling: The Vault");
    }

    #[test]
    fn test_scripted_frames_decode_to_the_expected_events() {
        let raw = roulette_queue_frame(1);
        assert_eq!(
            dutybell::decode(&raw, selected()).unwrap(),
            Some(GameEvent::QueueEnteredRoulette { roulette: 1 })
        );

        let raw = world_event_frame(705);
        assert_eq!(
            dutybell::decode(&raw, selected()).unwrap(),
            Some(GameEvent::WorldEventOccurred { world_event: 705 })
        );
    }
}
