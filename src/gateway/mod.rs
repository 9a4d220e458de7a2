// Job gateway: typed contract to the FRIDATA backend

pub mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpGateway;

use crate::progress::ProgressTracker;
use crate::types::{DatasetProfile, ExecutionResult, PlanResponse};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use thiserror::Error;

/// Extensions the backend accepts for upload
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

/// Errors that can occur talking to the backend
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned status {status}{}", .detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default())]
    Server { status: u16, detail: Option<String> },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Error detail supplied by the server, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            GatewayError::Server { detail, .. } => detail.as_deref().filter(|d| !d.is_empty()),
            _ => None,
        }
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// A dataset file held in memory, ready for upload
#[derive(Debug, Clone)]
pub struct DatasetFile {
    pub name: String,
    pub content: Bytes,
}

impl DatasetFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk. The name sent to the backend is the file name
    /// without its directory.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, content))
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Lowercased extension without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    pub fn has_supported_extension(&self) -> bool {
        self.extension()
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

/// Operations offered by the backend. Implementations hold no workflow state.
#[async_trait]
pub trait JobGateway: Send + Sync {
    /// Upload a dataset and receive its profile. Establishes the job id.
    async fn upload(&self, file: DatasetFile, progress: ProgressTracker) -> GatewayResult<DatasetProfile>;

    /// Ask for a transformation plan for `prompt`
    async fn generate_plan(&self, job_id: &str, prompt: &str) -> GatewayResult<PlanResponse>;

    /// Execute the job's current plan
    async fn execute(&self, job_id: &str, approved: bool) -> GatewayResult<ExecutionResult>;

    /// Address of the cleaned file; never fetched by the client
    fn download_url(&self, job_id: &str) -> String;

    /// Whether the backend answers its health probe
    async fn health(&self) -> GatewayResult<bool>;
}
