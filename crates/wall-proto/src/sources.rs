//! Source persistence bridge.
//!
//! Loads and saves the list of raw source references through an opaque
//! key-value store.  References are stored verbatim; nothing here
//! normalizes or validates them.

use tracing::{debug, warn};

use crate::protocol::TILE_COUNT;
use crate::store::KeyValueStore;

/// Store key holding the JSON array of tile sources.
pub const SOURCES_KEY: &str = "tilewall.sources";

pub struct SourceBridge {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl SourceBridge {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self::with_key(store, SOURCES_KEY)
    }

    pub fn with_key(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Stored list if present and well-formed (a JSON array of exactly
    /// `TILE_COUNT` strings), otherwise `defaults`.
    pub fn load(&self, defaults: &[String]) -> Vec<String> {
        let Some(raw) = self.store.get(&self.key) else {
            debug!("no saved sources under {:?}, using defaults", self.key);
            return defaults.to_vec();
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(sources) if sources.len() == TILE_COUNT => sources,
            Ok(sources) => {
                warn!(
                    "saved sources hold {} entries, expected {}; using defaults",
                    sources.len(),
                    TILE_COUNT
                );
                defaults.to_vec()
            }
            Err(e) => {
                warn!("saved sources are not a string array ({}); using defaults", e);
                defaults.to_vec()
            }
        }
    }

    pub fn save(&mut self, sources: &[String]) -> anyhow::Result<()> {
        let json = serde_json::to_string(sources)?;
        self.store.set(&self.key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn defaults() -> Vec<String> {
        (0..TILE_COUNT).map(|i| format!("default-{i}")).collect()
    }

    #[test]
    fn empty_store_yields_defaults() {
        let bridge = SourceBridge::new(Box::new(MemoryStore::new()));
        assert_eq!(bridge.load(&defaults()), defaults());
    }

    #[test]
    fn save_then_load_preserves_order_and_bytes() {
        let mut bridge = SourceBridge::new(Box::new(MemoryStore::new()));
        let sources: Vec<String> = vec![
            "https://youtu.be/xKERvEPF898".into(),
            "".into(),
            "  not normalized \u{200B}".into(),
            "dAfq7g3JQI8".into(),
            "\"quoted\"".into(),
            "https://www.youtube.com/embed/CDrm8RhonZU".into(),
        ];
        bridge.save(&sources).unwrap();
        assert_eq!(bridge.load(&defaults()), sources);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        for raw in ["not json", "{\"a\":1}", "[1,2,3,4,5,6]", "[\"only\",\"two\"]"] {
            let mut store = MemoryStore::new();
            store.set(SOURCES_KEY, raw).unwrap();
            let bridge = SourceBridge::new(Box::new(store));
            assert_eq!(bridge.load(&defaults()), defaults(), "raw = {raw}");
        }
    }

    #[test]
    fn custom_key_is_isolated() {
        let mut store = MemoryStore::new();
        store
            .set(SOURCES_KEY, &serde_json::to_string(&defaults()).unwrap())
            .unwrap();
        let bridge = SourceBridge::with_key(Box::new(store), "other");
        let fallback: Vec<String> = vec![String::new(); TILE_COUNT];
        assert_eq!(bridge.load(&fallback), fallback);
    }
}
