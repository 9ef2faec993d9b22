use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use droplet_core::{
    AgentKind, ChatRequest, ChatResponse, HttpAgentInvoker, Orchestrator, RouterConfig,
};
use droplet_providers::{OpenAiClient, WeatherClient};
use droplet_server::{AgentServer, AppState};
use droplet_store::{
    ChunkStore, FileHydrationStore, HydrationLogStore, TableHydrationStore, WeatherLog,
};

mod config;

use config::DropletConfig;

#[derive(Parser)]
#[command(name = "droplet")]
#[command(version)]
#[command(about = "droplet — hydration, weather and drink agents over one chat endpoint")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the agent server
    Serve,

    /// Send a one-shot chat message to a running server
    Ask {
        /// The message to send
        message: String,

        /// Latitude, forwarded to location-aware agents
        #[arg(long)]
        lat: Option<f64>,

        /// Longitude, forwarded to location-aware agents
        #[arg(long)]
        lon: Option<f64>,
    },

    /// Turn a product JSONL file into retrieval chunks via the LLM provider
    Chunk {
        /// Product JSONL file, one product object per line
        #[arg(long)]
        input: PathBuf,

        /// Output JSONL file, one chunk per line
        #[arg(long)]
        output: PathBuf,

        /// Products per provider call
        #[arg(long, default_value_t = 10)]
        batch: usize,
    },

    /// Upload files to the LLM provider's file store
    Upload {
        /// Files to upload
        files: Vec<PathBuf>,
    },

    /// Initialize config directory, default config and sample data
    Init,

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Init => cmd_init().await,
        Commands::Config => cmd_config(&cli.config),
        Commands::Serve => cmd_serve(&cli.config).await,
        Commands::Ask { message, lat, lon } => cmd_ask(&cli.config, &message, lat, lon).await,
        Commands::Chunk {
            input,
            output,
            batch,
        } => cmd_chunk(&cli.config, &input, &output, batch).await,
        Commands::Upload { files } => cmd_upload(&cli.config, &files).await,
    }
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
    } else {
        let default_config = include_str!("../../../config/default.toml");
        tokio::fs::write(&config_path, default_config).await?;
        info!("Created default config at {}", config_path.display());
    }

    let data_dir = config_dir.join("data");
    tokio::fs::create_dir_all(&data_dir).await?;

    // Seed sample chunk files so `serve` works out of the box
    let samples: [(&str, &str); 3] = [
        (
            "drink_chunks.jsonl",
            include_str!("../../../data/drink_chunks.jsonl"),
        ),
        (
            "activity_chunks.jsonl",
            include_str!("../../../data/activity_chunks.jsonl"),
        ),
        (
            "nutrition_chunks.jsonl",
            include_str!("../../../data/nutrition_chunks.jsonl"),
        ),
    ];
    for (name, content) in samples {
        let path = data_dir.join(name);
        if !path.exists() {
            tokio::fs::write(&path, content).await?;
            info!("Created sample data at {}", path.display());
        }
    }

    println!("droplet initialized at {}", config_dir.display());
    println!(
        "Edit {} to configure API keys and data paths.",
        config_path.display()
    );
    Ok(())
}

fn cmd_config(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = DropletConfig::load(config_path)?;
    println!("{:#?}", cfg);
    Ok(())
}

async fn cmd_serve(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = DropletConfig::load(config_path)?;

    let state = build_state(&cfg)?;
    let bind: std::net::SocketAddr = format!("{}:{}", cfg.server.bind, cfg.server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", cfg.server.bind, cfg.server.port))?;

    let server = AgentServer::new(bind, state);

    tokio::select! {
        result = server.run() => result,
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}

fn build_state(cfg: &DropletConfig) -> Result<AppState> {
    let drinks = load_store("drinks", &cfg.stores.drinks)?;
    let activity = load_store("activity", &cfg.stores.activity)?;
    let nutrition = load_store("nutrition", &cfg.stores.nutrition)?;

    let hydration: Arc<dyn HydrationLogStore> = match cfg.hydration.backend.as_str() {
        "table" => Arc::new(TableHydrationStore::new(
            cfg.hydration.table_base_url.clone(),
            cfg.hydration.table_api_key.clone(),
            cfg.hydration.table.clone(),
        )?),
        "file" => Arc::new(FileHydrationStore::new(shellexpand(
            &cfg.hydration.file_path,
        ))),
        other => anyhow::bail!("Unknown hydration backend '{}' (expected file or table)", other),
    };

    let weather_log = Arc::new(WeatherLog::new(shellexpand(&cfg.stores.weather_log)));

    let weather = if cfg.providers.openweather.api_key.is_empty() {
        info!("OpenWeather API key not set — weather lookups disabled");
        None
    } else {
        Some(WeatherClient::new(cfg.providers.openweather.api_key.clone()))
    };

    let mut endpoints = HttpAgentInvoker::endpoints_on(&cfg.orchestrator.agent_base_url);
    for (name, url) in &cfg.orchestrator.endpoints {
        match AgentKind::from_string(name) {
            Some(agent) => {
                endpoints.insert(agent, url.clone());
            }
            None => warn!("Ignoring endpoint override for unknown agent '{}'", name),
        }
    }
    let invoker = Arc::new(HttpAgentInvoker::new(endpoints)?);
    let orchestrator = Arc::new(Orchestrator::new(invoker, RouterConfig::default()));

    Ok(AppState {
        drinks: Arc::new(drinks),
        activity: Arc::new(activity),
        nutrition: Arc::new(nutrition),
        hydration,
        weather_log,
        weather,
        orchestrator,
        start_time: std::time::Instant::now(),
    })
}

fn load_store(name: &str, path: &str) -> Result<ChunkStore> {
    let path = shellexpand(path);
    let store = ChunkStore::load(&path)
        .with_context(|| format!("Failed to load {} chunks from {}", name, path.display()))?;
    info!("Loaded {} {} chunks from {}", store.len(), name, path.display());
    Ok(store)
}

async fn cmd_ask(
    config_path: &Option<PathBuf>,
    message: &str,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<()> {
    let cfg = DropletConfig::load(config_path)?;

    let url = format!(
        "{}/api/chat",
        cfg.orchestrator.agent_base_url.trim_end_matches('/')
    );
    let request = ChatRequest {
        user_id: whoami(),
        message: message.to_string(),
        lat,
        lon,
    };

    let response = reqwest::Client::new()
        .post(&url)
        .json(&request)
        .send()
        .await
        .with_context(|| format!("Failed to reach {} — is the server running?", url))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("Chat endpoint returned {}", status);
    }

    let reply: ChatResponse = response.json().await.context("Malformed chat response")?;
    println!("{}", reply.response);
    Ok(())
}

async fn cmd_chunk(
    config_path: &Option<PathBuf>,
    input: &Path,
    output: &Path,
    batch: usize,
) -> Result<()> {
    let cfg = DropletConfig::load(config_path)?;
    if cfg.providers.openai.api_key.is_empty() {
        anyhow::bail!("OpenAI API key not configured — set [providers.openai] api_key");
    }
    let client = OpenAiClient::new(
        cfg.providers.openai.api_key.clone(),
        Some(cfg.providers.openai.model.clone()),
    );

    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read products from {}", input.display()))?;
    let products: Vec<serde_json::Value> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).with_context(|| {
                format!("Malformed product JSON at {}:{}", input.display(), idx + 1)
            })
        })
        .collect::<Result<_>>()?;
    info!("Read {} products from {}", products.len(), input.display());

    let batch = batch.max(1);
    let mut lines = Vec::new();
    for group in products.chunks(batch) {
        let chunks = client.make_chunks(group).await?;
        info!("Chunked batch of {} products into {} chunks", group.len(), chunks.len());
        for chunk in chunks {
            lines.push(serde_json::to_string(&chunk)?);
        }
    }

    tokio::fs::write(output, lines.join("\n") + "\n")
        .await
        .with_context(|| format!("Failed to write chunks to {}", output.display()))?;
    println!("Wrote {} chunks to {}", lines.len(), output.display());
    Ok(())
}

async fn cmd_upload(config_path: &Option<PathBuf>, files: &[PathBuf]) -> Result<()> {
    if files.is_empty() {
        anyhow::bail!("No files given");
    }
    let cfg = DropletConfig::load(config_path)?;
    if cfg.providers.openai.api_key.is_empty() {
        anyhow::bail!("OpenAI API key not configured — set [providers.openai] api_key");
    }
    let client = OpenAiClient::new(
        cfg.providers.openai.api_key.clone(),
        Some(cfg.providers.openai.model.clone()),
    );

    let mut failed = 0usize;
    for file in files {
        match client.upload_file(file).await {
            Ok(id) => println!("{}  {}", file.display(), id),
            Err(e) => {
                failed += 1;
                error!("Upload failed for {}: {:#}", file.display(), e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} uploads failed", failed, files.len());
    }
    Ok(())
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_else(|_| "cli".to_string())
}

// Utility: expand a leading ~ in configured paths
fn shellexpand(s: &str) -> PathBuf {
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(s)
}
