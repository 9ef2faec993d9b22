//! HTTP surface for droplet agents
//!
//! This crate provides:
//! - Per-agent routes (drinks, hydration, weather, activity, nutrition)
//! - The orchestrator chat endpoint (`POST /api/chat`)
//! - A status endpoint and the server runner

pub mod activity;
pub mod chat;
pub mod drinks;
pub mod hydration;
mod kb;
pub mod nutrition;
pub mod server;
pub mod state;
pub mod weather;

pub use server::AgentServer;
pub use state::AppState;
