//! Handles settings for the application.
//!
//! Configuration is layered: `config/mizan.toml` (optional), environment
//! variables with the `MIZAN` prefix, then command-line overrides.

use clap::Parser;
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/mizan.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory for the local JSON store.
    pub data_dir: String,
    /// Base URL of the cloud sync API.
    pub cloud_url: String,
    /// Credentials seeded into a fresh account store.
    pub admin_username: String,
    pub admin_password: String,
    /// API key for the text extractor (`MIZAN_EXTRACTOR_API_KEY`).
    pub extractor_api_key: Option<String>,
    pub extractor_model: String,
    /// Log level for the env filter.
    pub level: String,
    /// When present, an embedded sync server is spawned.
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: u16,
    /// SQLite file path, or `:memory:` for a throwaway store.
    pub database: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            cloud_url: "http://127.0.0.1:3000".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
            extractor_api_key: None,
            extractor_model: shell::DEFAULT_MODEL.to_string(),
            level: "info".to_string(),
            server: None,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "mizan", about = "Chat-text bookkeeping with cloud sync")]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the cloud sync base URL.
    #[arg(long)]
    cloud_url: Option<String>,
    /// Override the local data directory.
    #[arg(long)]
    data_dir: Option<String>,
    /// Override the log level.
    #[arg(long)]
    level: Option<String>,
}

pub fn load() -> Result<AppConfig, config::ConfigError> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("MIZAN"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(cloud_url) = args.cloud_url {
        settings.cloud_url = cloud_url;
    }
    if let Some(data_dir) = args.data_dir {
        settings.data_dir = data_dir;
    }
    if let Some(level) = args.level {
        settings.level = level;
    }

    Ok(settings)
}
