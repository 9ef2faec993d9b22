//! Orchestrator chat endpoint

use axum::Json;
use axum::extract::State;

use droplet_core::{ChatRequest, ChatResponse};

use crate::state::AppState;

/// POST /api/chat — route the message, fan out to the matching agents, and
/// return the joined reply.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    Json(state.orchestrator.dispatch(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testutil::state_in;

    #[tokio::test]
    async fn test_chat_single_agent() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let response = chat(State(state), Json(ChatRequest::new("u", "water please"))).await.0;
        assert_eq!(response.response, "[Hydration Agent]: echo from hydration");
    }

    #[tokio::test]
    async fn test_chat_fans_out() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let response = chat(
            State(state),
            Json(ChatRequest::new("u", "water in this heat")),
        )
        .await
        .0;
        assert_eq!(
            response.response,
            "[Hydration Agent]: echo from hydration\n---\n[Weather Agent]: echo from weather"
        );
    }
}
