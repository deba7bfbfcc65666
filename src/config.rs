use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://schedule-finder.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_VALIDATION_MODEL: &str = "gpt-4.1";
pub const DEFAULT_EXTRACTION_MODEL: &str = "gpt-4.1-mini";

#[derive(Clone, Debug)]
pub struct ExtractorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub validation_model: String,
    pub extraction_model: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            validation_model: DEFAULT_VALIDATION_MODEL.to_string(),
            extraction_model: DEFAULT_EXTRACTION_MODEL.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    /// Preview mode: uploads are extracted but never written.
    pub skip_database: bool,
    pub enable_debug_routes: bool,
    pub extractor: ExtractorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_connections: 5,
            skip_database: false,
            enable_debug_routes: false,
            extractor: ExtractorConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is not a socket address: {}", e)))?;

        let max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse::<u32>()
                .map_err(|e| AppError::Config(format!("DB_MAX_CONNECTIONS is not a number: {}", e)))?,
            Err(_) => 5,
        };

        let extractor = ExtractorConfig {
            api_key: env::var("OPENAI_API_KEY").ok().filter(|key| !key.is_empty()),
            base_url: env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            validation_model: env::var("VALIDATION_MODEL").unwrap_or_else(|_| DEFAULT_VALIDATION_MODEL.to_string()),
            extraction_model: env::var("EXTRACTION_MODEL").unwrap_or_else(|_| DEFAULT_EXTRACTION_MODEL.to_string()),
        };

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            skip_database: flag("SKIP_DATABASE")?,
            enable_debug_routes: flag("ENABLE_DEBUG_ROUTES")?,
            extractor,
        })
    }
}

fn flag(name: &str) -> Result<bool, AppError> {
    match env::var(name) {
        Err(_) => Ok(false),
        Ok(raw) => parse_flag(&raw).ok_or_else(|| AppError::Config(format!("{} must be true or false, got {:?}", name, raw))),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
