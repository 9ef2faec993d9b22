//! Weather agent — current conditions via the provider, logged per user

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use droplet_core::{ChatRequest, ChatResponse};
use droplet_providers::Observation;
use droplet_store::WeatherLogEntry;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LogWeatherBody {
    pub user_id: String,
    pub lat: f64,
    pub lon: f64,
}

/// Fetch current weather and append it to the weather log. Shared by the
/// REST endpoint and the chat handler.
async fn fetch_and_log(
    state: &AppState,
    user_id: &str,
    lat: f64,
    lon: f64,
) -> anyhow::Result<Observation> {
    let client = state
        .weather
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("weather provider not configured"))?;

    let observation = client.current(lat, lon).await?;

    state
        .weather_log
        .append(WeatherLogEntry {
            user_id: user_id.to_string(),
            lat,
            lon,
            temperature: observation.temperature,
            humidity: observation.humidity,
            timestamp: observation.timestamp,
        })
        .await?;

    Ok(observation)
}

/// POST /log_weather
pub async fn log_weather(
    State(state): State<AppState>,
    Json(body): Json<LogWeatherBody>,
) -> Result<Json<Observation>, (StatusCode, Json<Value>)> {
    match fetch_and_log(&state, &body.user_id, body.lat, body.lon).await {
        Ok(observation) => Ok(Json(observation)),
        Err(e) => {
            warn!("Weather lookup failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            ))
        }
    }
}

/// POST /agent/weather — chat entry point. Needs the request to carry a
/// location; provider failures degrade to readable text.
pub async fn agent_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let (Some(lat), Some(lon)) = (request.lat, request.lon) else {
        return Json(ChatResponse {
            response: "Location or user info missing for weather lookup.".to_string(),
        });
    };

    let response = match fetch_and_log(&state, &request.user_id, lat, lon).await {
        Ok(observation) => format!(
            "Current temp: {}°C, humidity: {}%",
            observation.temperature, observation.humidity
        ),
        Err(e) => format!("Could not fetch weather. {}", e),
    };
    Json(ChatResponse { response })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testutil::state_in;

    #[tokio::test]
    async fn test_chat_without_location() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let response = agent_chat(
            State(state),
            Json(ChatRequest::new("alice", "what's the weather?")),
        )
        .await
        .0;
        assert_eq!(response.response, "Location or user info missing for weather lookup.");
    }

    #[tokio::test]
    async fn test_chat_without_provider_degrades_to_text() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path()); // no weather client configured
        let mut request = ChatRequest::new("alice", "weather please");
        request.lat = Some(25.2);
        request.lon = Some(55.27);

        let response = agent_chat(State(state), Json(request)).await.0;
        assert!(response.response.starts_with("Could not fetch weather."));
        assert!(response.response.contains("not configured"));
    }

    #[tokio::test]
    async fn test_log_weather_without_provider_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let err = log_weather(
            State(state),
            Json(LogWeatherBody {
                user_id: "alice".to_string(),
                lat: 25.2,
                lon: 55.27,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.1.0["error"].as_str().unwrap().contains("not configured"));
    }
}
