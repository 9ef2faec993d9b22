//! Shared types for droplet-core

use serde::{Deserialize, Serialize};

/// Incoming chat request. Stateless; no conversation is persisted.
/// `lat`/`lon` are carried so the weather agent can answer without a
/// separate location lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl ChatRequest {
    pub fn new(user_id: &str, message: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            message: message.to_string(),
            lat: None,
            lon: None,
        }
    }
}

/// Aggregate chat reply returned by the orchestrator and by each agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// The narrow topic services a message can be routed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Hydration,
    Weather,
    Activity,
    Nutrition,
    Drinks,
}

impl AgentKind {
    pub const ALL: [AgentKind; 5] = [
        Self::Hydration,
        Self::Weather,
        Self::Activity,
        Self::Nutrition,
        Self::Drinks,
    ];

    /// Parse an agent name from a string (e.g. from a config endpoint map).
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hydration" => Some(Self::Hydration),
            "weather" => Some(Self::Weather),
            "activity" => Some(Self::Activity),
            "nutrition" => Some(Self::Nutrition),
            "drinks" => Some(Self::Drinks),
            _ => None,
        }
    }

    /// Capitalized label used in aggregated reply fragments.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hydration => "Hydration",
            Self::Weather => "Weather",
            Self::Activity => "Activity",
            Self::Nutrition => "Nutrition",
            Self::Drinks => "Drinks",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hydration => write!(f, "hydration"),
            Self::Weather => write!(f, "weather"),
            Self::Activity => write!(f, "activity"),
            Self::Nutrition => write!(f, "nutrition"),
            Self::Drinks => write!(f, "drinks"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_kind_roundtrip() {
        for kind in AgentKind::ALL {
            assert_eq!(AgentKind::from_string(&kind.to_string()), Some(kind));
        }
        assert_eq!(AgentKind::from_string("WEATHER"), Some(AgentKind::Weather));
        assert_eq!(AgentKind::from_string("unknown"), None);
    }

    #[test]
    fn test_agent_kind_serde_lowercase() {
        let json = serde_json::to_string(&AgentKind::Drinks).unwrap();
        assert_eq!(json, "\"drinks\"");
        let kind: AgentKind = serde_json::from_str("\"hydration\"").unwrap();
        assert_eq!(kind, AgentKind::Hydration);
    }

    #[test]
    fn test_chat_request_omits_absent_location() {
        let req = ChatRequest::new("u1", "hello");
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("lat").is_none());
        assert!(json.get("lon").is_none());
    }
}
