use crate::types::{AppError, AppResult};
use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub upload: UploadConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub upload_chunk_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Files above this size get a warning; the backend enforces hard limits
    pub size_advisory_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub tick_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig {
                base_url: "http://localhost:8000/api".to_string(),
                timeout_secs: 120,
                upload_chunk_bytes: 64 * 1024,
            },
            upload: UploadConfig {
                size_advisory_bytes: 50 * 1024 * 1024,
            },
            ui: UiConfig { tick_ms: 100 },
            logging: LoggingConfig {
                dir: default_log_dir(),
                filter: "fridata=info".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            gateway: GatewayConfig {
                base_url: env::var("FRIDATA_API_URL").unwrap_or(defaults.gateway.base_url),
                timeout_secs: env::var("FRIDATA_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()?,
                upload_chunk_bytes: env::var("FRIDATA_UPLOAD_CHUNK_BYTES")
                    .unwrap_or_else(|_| "65536".to_string())
                    .parse()?,
            },
            upload: UploadConfig {
                size_advisory_bytes: env::var("FRIDATA_SIZE_ADVISORY_MB")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse::<u64>()?
                    * 1024
                    * 1024,
            },
            ui: UiConfig {
                tick_ms: env::var("FRIDATA_TICK_MS")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()?,
            },
            logging: LoggingConfig {
                dir: env::var("FRIDATA_LOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.logging.dir),
                filter: env::var("RUST_LOG").unwrap_or(defaults.logging.filter),
            },
        })
    }

    /// Reject settings the gateway cannot work with
    pub fn validate(&self) -> AppResult<()> {
        let url = &self.gateway.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "API URL must start with http:// or https://, got {:?}",
                url
            )));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(AppError::Config("FRIDATA_TIMEOUT_SECS must be positive".to_string()));
        }
        Ok(())
    }
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fridata")
        .join("logs")
}
