//! Turning wire ids into display names.
//!
//! The decoder only ever sees integer ids; everything that renders a
//! notification needs words. [`NameResolver`] is that seam, with two
//! implementations: [`PlaceholderResolver`] for logs and tests, and
//! [`GameCatalog`], which loads the shipped name tables from JSON.

use std::collections::HashMap;
use std::path::Path;

use dutybell_protocol::GameEvent;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Resolver trait
// ---------------------------------------------------------------------------

/// Resolves ids to display names.
///
/// Every method returns an owned `String` so implementations are free to
/// fall back to a generated placeholder when an id is missing from their
/// tables; a newly patched-in duty must never break notifications.
pub trait NameResolver: Send + Sync + 'static {
    fn world_event(&self, id: u16) -> String;
    fn instance(&self, id: u16) -> String;
    fn roulette(&self, id: u16) -> String;

    /// The zone a world event takes place in, when known.
    fn world_event_area(&self, _id: u16) -> Option<String> {
        None
    }

    /// One human-readable line for an event, for toasts and logs.
    fn describe(&self, event: &GameEvent) -> String {
        match event {
            GameEvent::InstanceEnter { instance } => {
                format!("entered {}", self.instance(*instance))
            }
            GameEvent::InstanceLeave { instance } => {
                format!("left {}", self.instance(*instance))
            }
            GameEvent::WorldEventOccurred { world_event } => {
                let name = self.world_event(*world_event);
                match self.world_event_area(*world_event) {
                    Some(area) => format!("{name} appeared in {area}"),
                    None => format!("{name} appeared"),
                }
            }
            GameEvent::QueueEnteredRoulette { roulette } => {
                format!("queued for {}", self.roulette(*roulette))
            }
            GameEvent::QueueEnteredAssignment { instances } => {
                let names: Vec<String> =
                    instances.iter().map(|id| self.instance(*id)).collect();
                format!("queued for {}", names.join(", "))
            }
            GameEvent::MatchCompleted { roulette: 0, instance } => {
                format!("match found: {}", self.instance(*instance))
            }
            GameEvent::MatchCompleted { roulette, instance } => {
                format!(
                    "match found for {}: {}",
                    self.roulette(*roulette),
                    self.instance(*instance)
                )
            }
        }
    }
}

/// Resolves every id to a deterministic placeholder.
pub struct PlaceholderResolver;

impl NameResolver for PlaceholderResolver {
    fn world_event(&self, id: u16) -> String {
        format!("world event {id}")
    }

    fn instance(&self, id: u16) -> String {
        format!("instance {id}")
    }

    fn roulette(&self, id: u16) -> String {
        format!("roulette {id}")
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Errors from loading a [`GameCatalog`].
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk catalog layout. World events are grouped under the area they
/// spawn in, which is also how the game's own data sheets organize them.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    instances: HashMap<u16, String>,
    #[serde(default)]
    roulettes: HashMap<u16, String>,
    #[serde(default)]
    areas: HashMap<u16, AreaFile>,
}

#[derive(Debug, Deserialize)]
struct AreaFile {
    name: String,
    #[serde(default)]
    world_events: HashMap<u16, String>,
}

#[derive(Debug)]
struct WorldEventEntry {
    name: String,
    area: String,
}

/// Name tables for instances, roulettes, and world events, loaded from a
/// catalog JSON document.
///
/// Ids missing from the tables resolve to the same placeholders
/// [`PlaceholderResolver`] produces, so a catalog that lags behind a game
/// patch degrades to numbers instead of failing.
#[derive(Debug)]
pub struct GameCatalog {
    instances: HashMap<u16, String>,
    roulettes: HashMap<u16, String>,
    world_events: HashMap<u16, WorldEventEntry>,
}

impl GameCatalog {
    /// Parses a catalog from its JSON form.
    ///
    /// # Errors
    /// Returns [`CatalogError::Parse`] if the document is not valid JSON
    /// or does not match the catalog layout.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;

        let mut world_events = HashMap::new();
        for area in file.areas.into_values() {
            for (id, name) in area.world_events {
                world_events.insert(
                    id,
                    WorldEventEntry {
                        name,
                        area: area.name.clone(),
                    },
                );
            }
        }

        Ok(Self {
            instances: file.instances,
            roulettes: file.roulettes,
            world_events,
        })
    }

    /// Reads and parses a catalog file.
    ///
    /// # Errors
    /// Returns [`CatalogError::Io`] if the file cannot be read, or
    /// [`CatalogError::Parse`] if its contents are not a valid catalog.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn instance_name(&self, id: u16) -> Option<&str> {
        self.instances.get(&id).map(String::as_str)
    }

    pub fn roulette_name(&self, id: u16) -> Option<&str> {
        self.roulettes.get(&id).map(String::as_str)
    }

    pub fn world_event_name(&self, id: u16) -> Option<&str> {
        self.world_events.get(&id).map(|entry| entry.name.as_str())
    }

    /// Every world-event id in the catalog, ascending. Selection surfaces
    /// list these for the user to opt in to.
    pub fn world_event_ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.world_events.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl NameResolver for GameCatalog {
    fn world_event(&self, id: u16) -> String {
        match self.world_event_name(id) {
            Some(name) => name.to_string(),
            None => format!("world event {id}"),
        }
    }

    fn instance(&self, id: u16) -> String {
        match self.instance_name(id) {
            Some(name) => name.to_string(),
            None => format!("instance {id}"),
        }
    }

    fn roulette(&self, id: u16) -> String {
        match self.roulette_name(id) {
            Some(name) => name.to_string(),
            None => format!("roulette {id}"),
        }
    }

    fn world_event_area(&self, id: u16) -> Option<String> {
        self.world_events.get(&id).map(|entry| entry.area.clone())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "instances": { "55": "The Vault" },
        "roulettes": { "1": "Duty Roulette: Leveling" },
        "areas": {
            "397": {
                "name": "Coerthas Western Highlands",
                "world_events": { "705": "Rime of the Ancient Wyrm" }
            }
        }
    }"#;

    fn catalog() -> GameCatalog {
        GameCatalog::from_json(SAMPLE).expect("sample catalog should parse")
    }

    // =====================================================================
    // Parsing
    // =====================================================================

    #[test]
    fn test_catalog_parses_names_and_areas() {
        let catalog = catalog();

        assert_eq!(catalog.instance_name(55), Some("The Vault"));
        assert_eq!(catalog.roulette_name(1), Some("Duty Roulette: Leveling"));
        assert_eq!(catalog.world_event_name(705), Some("Rime of the Ancient Wyrm"));
        assert_eq!(
            catalog.world_event_area(705).as_deref(),
            Some("Coerthas Western Highlands")
        );
        assert_eq!(catalog.world_event_ids(), vec![705]);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let catalog = GameCatalog::from_json("{}").unwrap();
        assert_eq!(catalog.instance_name(55), None);
        assert!(catalog.world_event_ids().is_empty());
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let err = GameCatalog::from_json("{ not json").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    // =====================================================================
    // Resolution and fallbacks
    // =====================================================================

    #[test]
    fn test_unknown_ids_fall_back_to_placeholders() {
        let catalog = catalog();
        assert_eq!(catalog.instance(999), "instance 999");
        assert_eq!(catalog.roulette(999), "roulette 999");
        assert_eq!(catalog.world_event(999), "world event 999");
        assert_eq!(catalog.world_event_area(999), None);
    }

    #[test]
    fn test_placeholder_resolver_is_deterministic() {
        let resolver = PlaceholderResolver;
        assert_eq!(resolver.instance(55), "instance 55");
        assert_eq!(resolver.roulette(1), "roulette 1");
        assert_eq!(resolver.world_event(705), "world event 705");
    }

    // =====================================================================
    // describe()
    // =====================================================================

    #[test]
    fn test_describe_covers_every_event_shape() {
        let resolver = PlaceholderResolver;

        assert_eq!(
            resolver.describe(&GameEvent::InstanceEnter { instance: 55 }),
            "entered instance 55"
        );
        assert_eq!(
            resolver.describe(&GameEvent::InstanceLeave { instance: 55 }),
            "left instance 55"
        );
        assert_eq!(
            resolver.describe(&GameEvent::WorldEventOccurred { world_event: 705 }),
            "world event 705 appeared"
        );
        assert_eq!(
            resolver.describe(&GameEvent::QueueEnteredRoulette { roulette: 1 }),
            "queued for roulette 1"
        );
        assert_eq!(
            resolver.describe(&GameEvent::QueueEnteredAssignment { instances: vec![55, 4] }),
            "queued for instance 55, instance 4"
        );
        assert_eq!(
            resolver.describe(&GameEvent::MatchCompleted { roulette: 1, instance: 55 }),
            "match found for roulette 1: instance 55"
        );
    }

    #[test]
    fn test_describe_omits_zero_roulette_on_assignment_matches() {
        let resolver = PlaceholderResolver;
        assert_eq!(
            resolver.describe(&GameEvent::MatchCompleted { roulette: 0, instance: 55 }),
            "match found: instance 55"
        );
    }

    #[test]
    fn test_catalog_describe_names_the_area() {
        let catalog = catalog();
        assert_eq!(
            catalog.describe(&GameEvent::WorldEventOccurred { world_event: 705 }),
            "Rime of the Ancient Wyrm appeared in Coerthas Western Highlands"
        );
        assert_eq!(
            catalog.describe(&GameEvent::MatchCompleted { roulette: 1, instance: 55 }),
            "match found for Duty Roulette: Leveling: The Vault"
        );
    }
}
