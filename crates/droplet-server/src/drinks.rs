//! Drinks agent — knowledge-base lookups and the label-analysis stub

use axum::Json;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use droplet_core::{ChatRequest, ChatResponse};
use droplet_store::{DrinkChunk, HydrationLogEntry};

use crate::kb;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DrinkInfoQuery {
    pub drink_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

/// Nutrition facts extracted from a drink label. The analysis itself is a
/// stub; values are fixed placeholders until OCR is wired in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionInfo {
    pub sodium_mg: Option<i64>,
    pub potassium_mg: Option<i64>,
    pub sugar_g: Option<i64>,
    pub caffeine_mg: Option<i64>,
    pub eco_score: Option<String>,
}

fn stub_nutrition() -> NutritionInfo {
    NutritionInfo {
        sodium_mg: Some(200),
        potassium_mg: Some(100),
        sugar_g: Some(0),
        caffeine_mg: Some(50),
        eco_score: Some("B".to_string()),
    }
}

/// GET /get_drink_info?drink_id=
pub async fn get_drink_info(
    State(state): State<AppState>,
    Query(params): Query<DrinkInfoQuery>,
) -> Result<Json<DrinkChunk>, (StatusCode, Json<Value>)> {
    match state.drinks.get(&params.drink_id) {
        Some(chunk) => Ok(Json(chunk.clone())),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Drink not found"})),
        )),
    }
}

/// GET /list_drinks
pub async fn list_drinks(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.drinks.ids())
}

/// GET /search_drinks?query=
pub async fn search_drinks(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<DrinkChunk>> {
    let results: Vec<DrinkChunk> = state
        .drinks
        .search(&params.query)
        .into_iter()
        .cloned()
        .collect();
    debug!("search_drinks '{}' -> {} results", params.query, results.len());
    Json(results)
}

/// POST /analyze_drink_label — multipart form with `user_id` and `image`.
/// OCR is out of scope; the image is drained and fixed nutrition facts are
/// returned.
pub async fn analyze_drink_label(
    State(_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<NutritionInfo>, (StatusCode, Json<Value>)> {
    let mut user_id: Option<String> = None;
    let mut image_bytes: usize = 0;

    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name() {
            Some("user_id") => {
                user_id = field.text().await.ok();
            }
            Some("image") => {
                if let Ok(bytes) = field.bytes().await {
                    image_bytes = bytes.len();
                }
            }
            _ => {}
        }
    }

    let Some(user_id) = user_id else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing user_id"})),
        ));
    };

    debug!(
        "analyze_drink_label for '{}' ({} image bytes, stubbed)",
        user_id, image_bytes
    );
    Ok(Json(stub_nutrition()))
}

#[derive(Debug, Deserialize)]
pub struct HydrationEventBody {
    pub user_id: String,
    pub drink_id: String,
    pub volume_ml: u32,
}

/// POST /log_hydration_event
pub async fn log_hydration_event(
    State(state): State<AppState>,
    Json(body): Json<HydrationEventBody>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let entry = HydrationLogEntry::new(&body.user_id, body.volume_ml, Some(body.drink_id.clone()));
    if let Err(e) = state.hydration.append(entry.clone()).await {
        warn!("Failed to log hydration event: {}", e);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        ));
    }
    Ok(Json(json!({"status": "success", "event": entry})))
}

/// POST /agent/drinks — chat entry point
pub async fn agent_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let lower = request.message.to_lowercase();
    let response = if lower.contains("label") || lower.contains("scan") {
        "Send a photo of the drink label to /analyze_drink_label and I'll read the nutrition facts."
            .to_string()
    } else if let Some(chunk) = kb::first_match(&state.drinks, &request.message) {
        chunk.text.clone()
    } else {
        "I couldn't find that drink. Try a brand name, or /list_drinks for everything I know."
            .to_string()
    };
    Json(ChatResponse { response })
}
