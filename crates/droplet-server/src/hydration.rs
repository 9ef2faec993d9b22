//! Hydration agent — intake logging and running totals

use std::sync::LazyLock;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use droplet_core::{ChatRequest, ChatResponse};
use droplet_store::{HydrationLogEntry, hydration_total_ml};

use crate::state::AppState;

/// Matches "250ml", "250 ml", "250mL" in a chat message.
static VOLUME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?i:ml)\b").expect("valid volume regex"));

#[derive(Debug, Deserialize)]
pub struct LogHydrationBody {
    pub user_id: String,
    /// Current field name
    #[serde(default)]
    pub volume_ml: Option<u32>,
    /// Legacy alias still sent by older clients; mapped onto volume_ml
    #[serde(default)]
    pub fluid_ml: Option<u32>,
    #[serde(default)]
    pub drink_type: Option<String>,
    #[serde(default)]
    pub hydration_multiplier: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub user_id: String,
}

/// POST /log_hydration
pub async fn log_hydration(
    State(state): State<AppState>,
    Json(body): Json<LogHydrationBody>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Some(volume_ml) = body.volume_ml.or(body.fluid_ml) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing volume_ml"})),
        ));
    };

    let mut entry = HydrationLogEntry::new(&body.user_id, volume_ml, body.drink_type);
    entry.hydration_multiplier = body.hydration_multiplier;

    if let Err(e) = state.hydration.append(entry).await {
        warn!("Failed to log hydration: {}", e);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Hydration event logged."
    })))
}

/// GET /get_hydration_status?user_id=
pub async fn get_hydration_status(
    State(state): State<AppState>,
    Query(params): Query<StatusQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let logs = match state.hydration.for_user(&params.user_id).await {
        Ok(logs) => logs,
        Err(e) => {
            warn!("Failed to read hydration log: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            ));
        }
    };

    Ok(Json(json!({
        "user_id": params.user_id,
        "total_hydration_ml": hydration_total_ml(&logs),
        "log_count": logs.len(),
        "logs": logs,
    })))
}

/// POST /agent/hydration — chat entry point. Parses a volume from the
/// message, logs it, and reports the running total. Failures become
/// readable text, never error codes.
pub async fn agent_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let Some(volume_ml) = parse_volume_ml(&request.message) else {
        return Json(ChatResponse {
            response: "Please specify how many milliliters you drank, e.g. \"I drank 250ml of water\"."
                .to_string(),
        });
    };

    let entry = HydrationLogEntry::new(&request.user_id, volume_ml, Some("water".to_string()));
    let response = match state.hydration.append(entry).await {
        Ok(()) => match state.hydration.for_user(&request.user_id).await {
            Ok(logs) => format!(
                "Logged {}ml of water. Your total today is {} ml.",
                volume_ml,
                hydration_total_ml(&logs)
            ),
            Err(e) => format!("Logged {}ml of water, but could not read your total: {}", volume_ml, e),
        },
        Err(e) => format!("Error logging hydration: {}", e),
    };
    Json(ChatResponse { response })
}

fn parse_volume_ml(message: &str) -> Option<u32> {
    VOLUME_RE
        .captures(message)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
