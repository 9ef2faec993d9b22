use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DropletConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub stores: StoresConfig,
    #[serde(default)]
    pub hydration: HydrationConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Base URL the orchestrator reaches agents on. The default points back
    /// at this process; set per-agent overrides to split agents out.
    #[serde(default = "default_agent_base_url")]
    pub agent_base_url: String,
    /// Per-agent endpoint overrides keyed by agent name
    /// (hydration, weather, activity, nutrition, drinks).
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

fn default_agent_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            agent_base_url: default_agent_base_url(),
            endpoints: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoresConfig {
    #[serde(default = "default_drinks_path")]
    pub drinks: String,
    #[serde(default = "default_activity_path")]
    pub activity: String,
    #[serde(default = "default_nutrition_path")]
    pub nutrition: String,
    #[serde(default = "default_weather_log_path")]
    pub weather_log: String,
}

fn default_drinks_path() -> String {
    "~/.droplet/data/drink_chunks.jsonl".to_string()
}

fn default_activity_path() -> String {
    "~/.droplet/data/activity_chunks.jsonl".to_string()
}

fn default_nutrition_path() -> String {
    "~/.droplet/data/nutrition_chunks.jsonl".to_string()
}

fn default_weather_log_path() -> String {
    "~/.droplet/data/weather_logs.json".to_string()
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            drinks: default_drinks_path(),
            activity: default_activity_path(),
            nutrition: default_nutrition_path(),
            weather_log: default_weather_log_path(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct HydrationConfig {
    /// "file" or "table"
    #[serde(default = "default_hydration_backend")]
    pub backend: String,
    #[serde(default = "default_hydration_log_path")]
    pub file_path: String,
    #[serde(default)]
    pub table_base_url: String,
    #[serde(default)]
    pub table_api_key: String,
    #[serde(default = "default_hydration_table")]
    pub table: String,
}

impl std::fmt::Debug for HydrationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HydrationConfig")
            .field("backend", &self.backend)
            .field("file_path", &self.file_path)
            .field("table_base_url", &self.table_base_url)
            .field("table_api_key", &mask_secret(&self.table_api_key))
            .field("table", &self.table)
            .finish()
    }
}

fn default_hydration_backend() -> String {
    "file".to_string()
}

fn default_hydration_log_path() -> String {
    "~/.droplet/data/hydration_logs.json".to_string()
}

fn default_hydration_table() -> String {
    "hydration_logs".to_string()
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            backend: default_hydration_backend(),
            file_path: default_hydration_log_path(),
            table_base_url: String::new(),
            table_api_key: String::new(),
            table: default_hydration_table(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openweather: OpenWeatherConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct OpenWeatherConfig {
    #[serde(default)]
    pub api_key: String,
}

impl std::fmt::Debug for OpenWeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherConfig")
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .finish()
    }
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
        }
    }
}

/// Mask a secret string for safe display in Debug output / logs.
/// Shows first 3 and last 4 chars for keys longer than 7 chars, otherwise "***".
pub fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 7 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "***".to_string()
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".droplet")
}

impl DropletConfig {
    pub fn load(custom_path: &Option<PathBuf>) -> Result<Self> {
        let path = custom_path
            .clone()
            .unwrap_or_else(|| config_dir().join("config.toml"));

        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read config at {}. Run `droplet init` first.",
                path.display()
            )
        })?;

        // Expand environment variables before parsing
        let expanded = expand_env_vars(&content);

        let config: Self = toml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;

        // Check for hardcoded API keys
        if config.providers.openai.api_key.starts_with("sk-") {
            warn!(
                "OpenAI API key is hardcoded in config file. For security, use environment variables: api_key = \"${{OPENAI_API_KEY}}\""
            );
        }

        Ok(config)
    }
}

/// Allowlist of environment variable names that may be expanded in config files.
/// This prevents an attacker who can modify the config from reading arbitrary env vars.
const ALLOWED_ENV_VARS: &[&str] = &[
    "OPENWEATHER_API_KEY",
    "OPENAI_API_KEY",
    "SUPABASE_API_KEY",
    "HOME",
    "USER",
];

fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut pos = 0;
    while pos < result.len() {
        if let Some(start) = result[pos..].find("${") {
            let abs_start = pos + start;
            if let Some(end) = result[abs_start..].find('}') {
                let var_name = result[abs_start + 2..abs_start + end].to_string();

                // Only expand variables in the allowlist
                let value = if ALLOWED_ENV_VARS.contains(&var_name.as_str()) {
                    std::env::var(&var_name).unwrap_or_default()
                } else {
                    warn!(
                        "Skipping expansion of unrecognized env var '{}' in config (not in allowlist)",
                        var_name
                    );
                    // Leave the ${VAR} unexpanded so it's obvious
                    pos = abs_start + end + 1;
                    continue;
                };

                let value_len = value.len();
                result = format!(
                    "{}{}{}",
                    &result[..abs_start],
                    value,
                    &result[abs_start + end + 1..]
                );
                pos = abs_start + value_len; // Skip past the expanded value
            } else {
                break;
            }
        } else {
            break;
        }
    }
    result
}
