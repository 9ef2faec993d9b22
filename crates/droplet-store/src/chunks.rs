//! JSONL-backed chunk store
//!
//! Each agent that answers from a knowledge base loads its chunks from a
//! JSONL file at startup (one chunk per line) and serves them read-only from
//! memory. Lookup is by exact id; search is a case-insensitive substring scan
//! over the chunk text and brand metadata, returned in file order.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::StoreError;

/// A short text-plus-metadata record used as a retrieval unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrinkChunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Loosely-typed metadata bag. Fields vary by chunk type (brand, price,
/// sodium, ...); only `brand` and `data_type` are interpreted, the rest is
/// carried as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Brand appears in source data as either a single string or a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BrandField {
    One(String),
    Many(Vec<String>),
}

impl BrandField {
    /// Case-insensitive substring match against any brand name.
    pub fn matches(&self, query_lower: &str) -> bool {
        match self {
            Self::One(b) => b.to_lowercase().contains(query_lower),
            Self::Many(brands) => brands
                .iter()
                .any(|b| b.to_lowercase().contains(query_lower)),
        }
    }
}

/// In-memory chunk list loaded once from a JSONL file. Immutable after load.
#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    chunks: Vec<DrinkChunk>,
}

impl ChunkStore {
    /// Load a store from a JSONL file. A line that fails to parse aborts the
    /// load with the file path and 1-based line number.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut chunks = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let chunk: DrinkChunk =
                serde_json::from_str(line).map_err(|source| StoreError::Parse {
                    path: path.display().to_string(),
                    line: idx + 1,
                    source,
                })?;
            chunks.push(chunk);
        }

        info!("Loaded {} chunks from {}", chunks.len(), path.display());
        Ok(Self { chunks })
    }

    /// Build a store from already-parsed chunks (used by tests and the CLI).
    pub fn from_chunks(chunks: Vec<DrinkChunk>) -> Self {
        Self { chunks }
    }

    /// Exact-id lookup.
    pub fn get(&self, id: &str) -> Option<&DrinkChunk> {
        self.chunks.iter().find(|c| c.id == id)
    }

    /// All chunk ids, in file order.
    pub fn ids(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.id.clone()).collect()
    }

    /// Case-insensitive substring search across chunk text and brand
    /// metadata. First-match order equals file order; no ranking.
    pub fn search(&self, query: &str) -> Vec<&DrinkChunk> {
        let query_lower = query.to_lowercase();
        self.chunks
            .iter()
            .filter(|c| {
                c.text.to_lowercase().contains(&query_lower)
                    || c.metadata
                        .brand
                        .as_ref()
                        .is_some_and(|b| b.matches(&query_lower))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
