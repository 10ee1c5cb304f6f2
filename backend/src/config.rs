//! Configuration management for the Vyapar Assistant
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with VYAPAR_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Remote tabular store configuration
    pub store: StoreConfig,

    /// Intent classifier configuration
    pub classifier: ClassifierConfig,

    /// Telegram transport configuration
    pub telegram: TelegramConfig,

    /// Speech-to-text / text-to-speech configuration
    pub speech: SpeechConfig,

    /// Invoice document renderer configuration
    pub renderer: RendererConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Sheets API base endpoint
    pub api_endpoint: String,

    /// Spreadsheet identifier holding all collections
    pub spreadsheet_id: String,

    /// Bearer token for the sheets API
    pub api_token: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Upper bound for write retries with backoff, in seconds
    pub retry_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// Chat-completions style inference endpoint
    pub api_endpoint: String,

    /// API key for the inference service
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    /// Bot API token
    pub token: String,

    /// Secret token echoed back by Telegram in webhook requests
    pub webhook_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpeechConfig {
    /// Speech-to-text endpoint
    pub stt_endpoint: String,

    /// Text-to-speech endpoint
    pub tts_endpoint: String,

    /// API key shared by both services
    pub api_key: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RendererConfig {
    /// Invoice PDF renderer endpoint; empty disables document replies
    pub api_endpoint: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("VYAPAR_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("store.api_endpoint", "https://sheets.googleapis.com")?
            .set_default("store.timeout_secs", 15)?
            .set_default("store.retry_secs", 20)?
            .set_default("classifier.timeout_secs", 30)?
            .set_default("classifier.model", "llama-3.3-70b-versatile")?
            .set_default("speech.timeout_secs", 60)?
            .set_default("renderer.api_endpoint", "")?
            .set_default("renderer.timeout_secs", 30)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (VYAPAR_ prefix)
            .add_source(
                Environment::with_prefix("VYAPAR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
