use charter_core::flight::Location;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub inquiry: InquiryConfig,
    pub printer: PrinterSettings,
    pub tickets: TicketConfig,
    #[serde(default)]
    pub locations: Vec<Location>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    #[serde(default)]
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    pub admin_username: String,
    pub admin_password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub enabled: bool,
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    pub sender_name: String,
    pub sender_email: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InquiryConfig {
    pub captcha_verify_url: String,
    #[serde(default)]
    pub captcha_secret: String,
    #[serde(default)]
    pub relay_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrinterSettings {
    pub mode: String,
    pub device_path: String,
    pub receipts_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TicketConfig {
    pub default_currency: String,
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

fn default_list_limit() -> usize { 200 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in; holds local secrets.
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `CHARTER__EMAIL__API_KEY=...`
            .add_source(config::Environment::with_prefix("CHARTER").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
