//! Nutrition agent — answers from its own chunk store

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use droplet_core::{ChatRequest, ChatResponse};
use droplet_store::DrinkChunk;

use crate::kb;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

/// GET /search_nutrition?query=
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<DrinkChunk>> {
    Json(state.nutrition.search(&params.query).into_iter().cloned().collect())
}

/// POST /agent/nutrition — chat entry point
pub async fn agent_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let response = match kb::first_match(&state.nutrition, &request.message) {
        Some(chunk) => chunk.text.clone(),
        None => "Ask me about a food, meal or nutrient and I'll look it up.".to_string(),
    };
    Json(ChatResponse { response })
}
