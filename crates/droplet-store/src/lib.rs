//! Data stores for droplet agents
//!
//! This crate provides:
//! - JSONL chunk stores loaded once at startup and served read-only
//! - Hydration log persistence (flat JSON file or REST table backend)
//! - A flat-file weather observation sink

pub mod chunks;
pub mod hydration;
pub mod weather_log;

pub use chunks::{BrandField, ChunkMetadata, ChunkStore, DrinkChunk};
pub use hydration::{
    FileHydrationStore, HydrationLogEntry, HydrationLogStore, TableHydrationStore,
    hydration_total_ml,
};
pub use weather_log::{WeatherLog, WeatherLogEntry};

/// Errors surfaced by store loading. Malformed data aborts startup rather
/// than being skipped.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid chunk at {path}:{line}: {source}")]
    Parse {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_basic_integration() {
        let dir = tempfile::tempdir().unwrap();

        // Chunk store
        let chunks_path = dir.path().join("chunks.jsonl");
        let mut file = std::fs::File::create(&chunks_path).unwrap();
        writeln!(
            file,
            r#"{{"id":"c1","text":"sugar-free electrolyte mix","metadata":{{"brand":"Humantra"}}}}"#
        )
        .unwrap();
        let store = ChunkStore::load(&chunks_path).unwrap();
        assert_eq!(store.search("humantra").len(), 1);

        // Hydration log
        let hydration = FileHydrationStore::new(dir.path().join("hydration_logs.json"));
        hydration
            .append(HydrationLogEntry::new("u1", 250, None))
            .await
            .unwrap();
        let entries = hydration.for_user("u1").await.unwrap();
        assert_eq!(hydration_total_ml(&entries), 250.0);
    }
}
