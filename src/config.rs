use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Default configuration constants
pub const DEFAULT_BASE_URL: &str = "https://apialert.testflight.biz/api/v1";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub fastalert: FastalertConfig,
    pub connection: ConnectionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FastalertConfig {
    #[serde(default)]
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// Per-request timeout; 0 disables it
    pub timeout_seconds: u64,
}

impl FastalertConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut settings = config::Config::builder();

        // Default values
        settings = settings
            .set_default("fastalert.base_url", DEFAULT_BASE_URL)?
            .set_default("connection.timeout_seconds", DEFAULT_TIMEOUT_SECONDS)?;

        // Load from config file if provided
        if let Some(path) = config_path
            && Path::new(path).exists()
        {
            settings = settings.add_source(config::File::with_name(path));
        }

        // Override with environment variables
        settings = settings.add_source(
            config::Environment::with_prefix("FASTALERT")
                .prefix_separator("_")
                .separator("__"),
        );

        // Plain API_KEY / BASE_URL win over everything else
        if let Some(api_key) = std::env::var("API_KEY").ok().filter(|k| !k.is_empty()) {
            settings = settings.set_override("fastalert.api_key", api_key)?;
        }

        if let Some(base_url) = std::env::var("BASE_URL").ok().filter(|u| !u.is_empty()) {
            settings = settings.set_override("fastalert.base_url", base_url)?;
        }

        let config: Config = settings.build()?.try_deserialize()?;

        if config.fastalert.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "Missing required environment variable: API_KEY"
            ));
        }

        Ok(config)
    }
}
