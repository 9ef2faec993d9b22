//! Hydration log persistence
//!
//! Append-only log of fluid intake events. Two backends sit behind the
//! `HydrationLogStore` trait: a flat JSON array file for single-process
//! setups, and a REST table client for an external Postgres-over-HTTP table
//! service. No update or delete path; ordering is append order.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// A single logged intake event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrationLogEntry {
    pub id: String,
    pub user_id: String,
    pub volume_ml: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drink_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hydration_multiplier: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl HydrationLogEntry {
    pub fn new(user_id: &str, volume_ml: u32, drink_type: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            volume_ml,
            drink_type,
            hydration_multiplier: None,
            timestamp: Utc::now(),
        }
    }
}

/// Effective hydration across entries: volume scaled by the per-drink
/// multiplier (missing multiplier counts as 1.0).
pub fn hydration_total_ml(entries: &[HydrationLogEntry]) -> f64 {
    entries
        .iter()
        .map(|e| f64::from(e.volume_ml) * e.hydration_multiplier.unwrap_or(1.0))
        .sum()
}

/// Storage backend for hydration events.
#[async_trait]
pub trait HydrationLogStore: Send + Sync {
    async fn append(&self, entry: HydrationLogEntry) -> Result<()>;
    async fn for_user(&self, user_id: &str) -> Result<Vec<HydrationLogEntry>>;
}

// ── File backend ────────────────────────────────────────────────

/// Flat JSON array file. The whole file is read, appended to, and rewritten
/// on each insert; a Mutex serializes writers within the process.
pub struct FileHydrationStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileHydrationStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<HydrationLogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read hydration log at {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse hydration log at {}", self.path.display()))
    }
}

#[async_trait]
impl HydrationLogStore for FileHydrationStore {
    async fn append(&self, entry: HydrationLogEntry) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.push(entry);
        let json = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write hydration log at {}", self.path.display()))?;
        debug!("Hydration log now has {} entries", entries.len());
        Ok(())
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<HydrationLogEntry>> {
        let _guard = self.lock.lock().await;
        let entries = self.read_all().await?;
        Ok(entries.into_iter().filter(|e| e.user_id == user_id).collect())
    }
}

// ── REST table backend ──────────────────────────────────────────

/// Client for a PostgREST-style table endpoint
/// (`POST /rest/v1/{table}`, `GET /rest/v1/{table}?user_id=eq.{id}`).
pub struct TableHydrationStore {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl std::fmt::Debug for TableHydrationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableHydrationStore")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("table", &self.table)
            .finish()
    }
}

impl TableHydrationStore {
    pub fn new(base_url: String, api_key: String, table: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        info!("Hydration log backed by table '{}' at {}", table, base_url);
        Ok(Self {
            client,
            base_url,
            api_key,
            table,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), self.table)
    }
}

#[async_trait]
impl HydrationLogStore for TableHydrationStore {
    async fn append(&self, entry: HydrationLogEntry) -> Result<()> {
        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&entry)
            .send()
            .await
            .context("Failed to insert hydration log entry")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Table insert failed with status {}: {}", status, body));
        }
        Ok(())
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<HydrationLogEntry>> {
        let response = self
            .client
            .get(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[("user_id", format!("eq.{}", user_id)), ("select", "*".to_string())])
            .send()
            .await
            .context("Failed to query hydration log")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Table query failed with status {}: {}", status, body));
        }

        response
            .json()
            .await
            .context("Failed to parse hydration log rows")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user: &str, ml: u32, multiplier: Option<f64>) -> HydrationLogEntry {
        let mut e = HydrationLogEntry::new(user, ml, Some("water".to_string()));
        e.hydration_multiplier = multiplier;
        e
    }

    #[test]
    fn test_total_defaults_multiplier_to_one() {
        let entries = vec![entry("u1", 250, None), entry("u1", 500, None)];
        assert_eq!(hydration_total_ml(&entries), 750.0);
    }

    #[test]
    fn test_total_applies_multiplier() {
        let entries = vec![entry("u1", 200, Some(0.5)), entry("u1", 100, Some(1.5))];
        assert_eq!(hydration_total_ml(&entries), 250.0);
    }

    #[test]
    fn test_total_empty() {
        assert_eq!(hydration_total_ml(&[]), 0.0);
    }

    #[tokio::test]
    async fn test_file_store_append_and_filter() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHydrationStore::new(dir.path().join("hydration_logs.json"));

        store.append(entry("alice", 250, None)).await.unwrap();
        store.append(entry("bob", 400, None)).await.unwrap();
        store.append(entry("alice", 100, None)).await.unwrap();

        let alice = store.for_user("alice").await.unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(hydration_total_ml(&alice), 350.0);

        let carol = store.for_user("carol").await.unwrap();
        assert!(carol.is_empty());
    }

    #[tokio::test]
    async fn test_file_store_preserves_append_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHydrationStore::new(dir.path().join("hydration_logs.json"));

        store.append(entry("u", 100, None)).await.unwrap();
        store.append(entry("u", 200, None)).await.unwrap();

        let entries = store.for_user("u").await.unwrap();
        assert_eq!(entries[0].volume_ml, 100);
        assert_eq!(entries[1].volume_ml, 200);
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHydrationStore::new(dir.path().join("never_written.json"));
        assert!(store.for_user("u").await.unwrap().is_empty());
    }

    #[test]
    fn test_entry_serde_skips_absent_options() {
        let e = HydrationLogEntry::new("u", 250, None);
        let json = serde_json::to_value(&e).unwrap();
        assert!(json.get("drink_type").is_none());
        assert!(json.get("hydration_multiplier").is_none());
        assert_eq!(json["volume_ml"], 250);
    }

    #[test]
    fn test_table_store_debug_masks_key() {
        let store = TableHydrationStore::new(
            "https://example.supabase.co".to_string(),
            "service-role-secret".to_string(),
            "hydration_logs".to_string(),
        )
        .unwrap();
        let debug = format!("{:?}", store);
        assert!(debug.contains("***"));
        assert!(!debug.contains("service-role-secret"));
    }

    #[test]
    fn test_table_url_join() {
        let store = TableHydrationStore::new(
            "https://example.supabase.co/".to_string(),
            "k".to_string(),
            "hydration_logs".to_string(),
        )
        .unwrap();
        assert_eq!(
            store.table_url(),
            "https://example.supabase.co/rest/v1/hydration_logs"
        );
    }
}
