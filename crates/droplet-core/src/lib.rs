//! droplet-core - routing and orchestration for droplet agents
//!
//! This crate provides:
//! - Shared chat types (`ChatRequest`, `ChatResponse`, `AgentKind`)
//! - The keyword router that selects which agents answer a message
//! - The orchestrator that fans a message out to the selected agents
//!   concurrently and joins their replies

pub mod orchestrator;
pub mod router;
pub mod types;

// Re-export main types for convenience
pub use orchestrator::{AgentInvoker, AgentOutcome, HttpAgentInvoker, Orchestrator};
pub use router::{RouterConfig, route_message};
pub use types::{AgentKind, ChatRequest, ChatResponse};
