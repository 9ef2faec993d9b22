//! External API adapters for droplet
//!
//! This crate provides:
//! - `WeatherClient`: OpenWeatherMap current-weather wrapper
//! - `OpenAiClient`: chunk generation via function calling, and file upload

pub mod llm;
pub mod weather;

pub use llm::OpenAiClient;
pub use weather::{Observation, WeatherClient};
