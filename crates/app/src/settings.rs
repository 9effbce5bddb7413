//! Handles settings for the application. Configuration is written in
//! `settings.toml` (path overridable with `--config`) and can be overridden
//! through `SWISSCOIN__<SECTION>__<KEY>` environment variables.
//!
//! ```toml
//! [app]
//! level = "info"
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 3000
//! database = { sqlite = "swisscoin.db" }
//!
//! [verification]
//! service_sid = "VA..."
//! account_sid = "AC..."
//! auth_token = "..."
//! ```
use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Parser)]
#[command(name = "swisscoin", version)]
struct Args {
    /// Config file path (TOML), extension optional.
    #[arg(long, env = "SWISSCOIN_CONFIG")]
    config: Option<String>,
    /// Override the log level.
    #[arg(long)]
    level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Verification {
    #[serde(default = "default_verification_url")]
    pub base_url: String,
    pub service_sid: String,
    pub account_sid: String,
    pub auth_token: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Request timeout towards the provider, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_verification_url() -> String {
    "https://verify.twilio.com".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    pub verification: Option<Verification>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        let mut settings: Settings = Config::builder()
            .add_source(File::with_name(config_path).required(args.config.is_some()))
            .add_source(
                Environment::with_prefix("SWISSCOIN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if let Some(level) = args.level {
            settings.app.level = level;
        }
        Ok(settings)
    }
}
