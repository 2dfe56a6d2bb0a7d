//! Configuration module for the parts-quotation backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Default base URL of the IBGE localities service.
pub const DEFAULT_GEO_BASE_URL: &str = "https://servicodados.ibge.gov.br/api/v1/localidades";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to the supplier search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Base URL of the states/cities lookup service
    pub geo_base_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("PECAS_DB_PATH")
            .unwrap_or_else(|_| "./data/pecas.sqlite".to_string())
            .into();

        let index_path = env::var("PECAS_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let raw_addr = env::var("PECAS_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| AppError::Internal(format!("Invalid PECAS_BIND_ADDR: {}", raw_addr)))?;

        let log_level = env::var("PECAS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let geo_base_url = env::var("PECAS_GEO_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEO_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            db_path,
            index_path,
            bind_addr,
            log_level,
            geo_base_url,
        })
    }
}
