//! Activity agent — answers from its own chunk store

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

/// GET /search_activity?query=
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<DrinkChunk>> {
    Json(state.activity.search(&params.query).into_iter().cloned().collect())
}

/// POST /agent/activity — chat entry point
pub async fn agent_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let response = match kb::first_match(&state.activity, &request.message) {
        Some(chunk) => chunk.text.clone(),
        None => "Tell me about your workout, steps or exercise and I'll look it up.".to_string(),
    };
    Json(ChatResponse { response })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testutil::state_in;

    #[tokio::test]
    async fn test_chat_finds_activity_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let response = agent_chat(
            State(state),
            Json(ChatRequest::new("u", "how much does walking burn?")),
        )
        .await
        .0;
        assert!(response.response.contains("8000 steps"));
    }

    #[tokio::test]
    async fn test_chat_no_match_is_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let response = agent_chat(State(state), Json(ChatRequest::new("u", "zzz"))).await.0;
        assert!(response.response.contains("workout"));
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let results = search(
            State(state),
            Query(SearchQuery {
                query: "steps".to_string(),
            }),
        )
        .await
        .0;
        assert_eq!(results.len(), 1);
    }
}
