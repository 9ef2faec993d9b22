//! Weather observation sink
//!
//! Observations fetched for a user are appended to a flat JSON array file.
//! Read-modify-write of the whole file per append, serialized by a Mutex.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// One logged weather observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherLogEntry {
    pub user_id: String,
    pub lat: f64,
    pub lon: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: DateTime<Utc>,
}

pub struct WeatherLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl WeatherLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub async fn append(&self, entry: WeatherLogEntry) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_unlocked().await?;
        entries.push(entry);
        let json = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write weather log at {}", self.path.display()))
    }

    pub async fn entries(&self) -> Result<Vec<WeatherLogEntry>> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    async fn read_unlocked(&self) -> Result<Vec<WeatherLogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read weather log at {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse weather log at {}", self.path.display()))
    }
}
