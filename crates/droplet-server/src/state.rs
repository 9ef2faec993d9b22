//! Shared state for all agent handlers

use std::sync::Arc;

use droplet_core::Orchestrator;
use droplet_providers::WeatherClient;
use droplet_store::{ChunkStore, HydrationLogStore, WeatherLog};

/// State shared by every route. Chunk stores are immutable after load; the
/// log stores serialize their own writes.
#[derive(Clone)]
pub struct AppState {
    pub drinks: Arc<ChunkStore>,
    pub activity: Arc<ChunkStore>,
    pub nutrition: Arc<ChunkStore>,
    pub hydration: Arc<dyn HydrationLogStore>,
    pub weather_log: Arc<WeatherLog>,
    /// None when no provider key is configured; weather replies degrade to
    /// readable error text.
    pub weather: Option<WeatherClient>,
    pub orchestrator: Arc<Orchestrator>,
    pub start_time: std::time::Instant,
}
