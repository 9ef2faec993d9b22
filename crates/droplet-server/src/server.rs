//! Agent HTTP server — Axum router over the shared state
//!
//! All agents and the orchestrator live on one listener; the orchestrator's
//! endpoint map decides whether agent calls loop back here or go to remote
//! instances.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::state::AppState;
use crate::{activity, chat, drinks, hydration, nutrition, weather};

/// The agent server
pub struct AgentServer {
    state: AppState,
    bind: SocketAddr,
}

impl AgentServer {
    pub fn new(bind: SocketAddr, state: AppState) -> Self {
        Self { state, bind }
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        Router::new()
            // Orchestrator
            .route("/api/chat", post(chat::chat))
            .route("/api/status", get(status_handler))
            // Per-agent chat endpoints
            .route("/agent/hydration", post(hydration::agent_chat))
            .route("/agent/weather", post(weather::agent_chat))
            .route("/agent/activity", post(activity::agent_chat))
            .route("/agent/nutrition", post(nutrition::agent_chat))
            .route("/agent/drinks", post(drinks::agent_chat))
            // Drinks agent
            .route("/get_drink_info", get(drinks::get_drink_info))
            .route("/list_drinks", get(drinks::list_drinks))
            .route("/search_drinks", get(drinks::search_drinks))
            .route("/analyze_drink_label", post(drinks::analyze_drink_label))
            .route("/log_hydration_event", post(drinks::log_hydration_event))
            // Hydration agent
            .route("/log_hydration", post(hydration::log_hydration))
            .route("/get_hydration_status", get(hydration::get_hydration_status))
            // Weather agent
            .route("/log_weather", post(weather::log_weather))
            // Knowledge-base search
            .route("/search_activity", get(activity::search))
            .route("/search_nutrition", get(nutrition::search))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Start the server (blocks until shutdown)
    pub async fn run(self) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.bind).await?;
        info!("Agent server listening on {}", self.bind);

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Start the server in the background, returning a handle
    pub fn spawn(self) -> tokio::task::JoinHandle<anyhow::Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    axum::Json(serde_json::json!({
        "status": "ok",
        "agents": ["hydration", "weather", "activity", "nutrition", "drinks"],
        "chunks": {
            "drinks": state.drinks.len(),
            "activity": state.activity.len(),
            "nutrition": state.nutrition.len(),
        },
        "uptime_secs": uptime,
    }))
}
