// HTTP implementation of the job gateway (FastAPI backend)
// Endpoints live under the configured base URL, e.g. http://localhost:8000/api
//   POST /upload      multipart, field "file"
//   POST /transform   {job_id, prompt}
//   POST /execute     {job_id, approved}
//   GET  /download/{job_id}
// The health probe hits the service root, outside the /api prefix.

use super::{DatasetFile, GatewayError, GatewayResult, JobGateway};
use crate::config::GatewayConfig;
use crate::progress::ProgressTracker;
use crate::types::{DatasetProfile, ExecutionRequest, ExecutionResult, PlanRequest, PlanResponse};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

pub struct HttpGateway {
    client: Client,
    base_url: String,
    chunk_size: usize,
}

// FastAPI error body: detail is usually a string, but validation errors send a list
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

impl HttpGateway {
    /// Gateway with a default client and no timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize_base(base_url.into()),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base(config.base_url.clone()),
            chunk_size: config.upload_chunk_bytes.max(1),
        })
    }

    /// Override the upload chunk size (progress granularity)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Service root, i.e. the base URL without its `/api` suffix
    fn health_url(&self) -> String {
        let root = self.base_url.strip_suffix("/api").unwrap_or(&self.base_url);
        format!("{}/", root)
    }

    /// Split the file into chunks so progress can follow what the transport
    /// has pulled from the body.
    fn progress_body(&self, content: Bytes, progress: ProgressTracker) -> Body {
        let total = content.len() as u64;
        let chunks: Vec<Bytes> = (0..content.len())
            .step_by(self.chunk_size)
            .map(|start| content.slice(start..(start + self.chunk_size).min(content.len())))
            .collect();

        let progress = Arc::new(progress);
        progress.start();

        let mut loaded = 0u64;
        let stream = stream::iter(chunks).map(move |chunk| {
            loaded += chunk.len() as u64;
            progress.update(loaded, total);
            Ok::<Bytes, std::io::Error>(chunk)
        });

        Body::wrap_stream(stream)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> GatewayResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = extract_detail(&text);
            warn!(status = status.as_u16(), detail = ?detail, "Backend rejected request");
            return Err(GatewayError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl JobGateway for HttpGateway {
    async fn upload(&self, file: DatasetFile, progress: ProgressTracker) -> GatewayResult<DatasetProfile> {
        let size = file.size();
        let mime = file.mime_type();
        info!(filename = %file.name, size, "Uploading dataset");

        let body = self.progress_body(file.content, progress);
        let part = Part::stream_with_length(body, size)
            .file_name(file.name)
            .mime_str(&mime)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        let profile: DatasetProfile = Self::decode(response).await?;
        info!(
            job_id = %profile.job_id,
            total_rows = profile.total_rows,
            columns = profile.columns.len(),
            "Dataset profiled"
        );
        Ok(profile)
    }

    async fn generate_plan(&self, job_id: &str, prompt: &str) -> GatewayResult<PlanResponse> {
        debug!(job_id, prompt_len = prompt.len(), "Requesting plan");

        let response = self
            .client
            .post(self.endpoint("transform"))
            .json(&PlanRequest { job_id, prompt })
            .send()
            .await?;

        let plan: PlanResponse = Self::decode(response).await?;
        info!(job_id = %plan.job_id, steps = plan.steps.len(), "Plan received");
        Ok(plan)
    }

    async fn execute(&self, job_id: &str, approved: bool) -> GatewayResult<ExecutionResult> {
        debug!(job_id, approved, "Requesting execution");

        let response = self
            .client
            .post(self.endpoint("execute"))
            .json(&ExecutionRequest { job_id, approved })
            .send()
            .await?;

        let result: ExecutionResult = Self::decode(response).await?;
        info!(job_id = %result.job_id, status = %result.status, "Execution finished");
        Ok(result)
    }

    fn download_url(&self, job_id: &str) -> String {
        self.endpoint(&format!("download/{}", job_id))
    }

    async fn health(&self) -> GatewayResult<bool> {
        let response = self.client.get(self.health_url()).send().await?;
        let body: HealthBody = Self::decode(response).await?;
        Ok(body.status == "ok")
    }
}

fn normalize_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Mutex;

    fn gateway(server: &mockito::ServerGuard) -> HttpGateway {
        HttpGateway::new(format!("{}/api/", server.url()))
    }

    #[test]
    fn test_urls() {
        let gw = HttpGateway::new("http://localhost:8000/api/");
        assert_eq!(gw.base_url(), "http://localhost:8000/api");
        assert_eq!(gw.endpoint("transform"), "http://localhost:8000/api/transform");
        assert_eq!(gw.download_url("abc"), "http://localhost:8000/api/download/abc");
        assert_eq!(gw.health_url(), "http://localhost:8000/");
    }

    #[test]
    fn test_extract_detail() {
        assert_eq!(
            extract_detail(r#"{"detail": "Job not found."}"#).as_deref(),
            Some("Job not found.")
        );
        assert_eq!(
            extract_detail(r#"{"detail": [{"loc": ["body"]}]}"#).as_deref(),
            Some(r#"[{"loc":["body"]}]"#)
        );
        assert_eq!(extract_detail(r#"{"detail": null}"#), None);
        assert_eq!(extract_detail("<html>Bad Gateway</html>"), None);
    }

    #[tokio::test]
    async fn test_generate_plan_sends_job_and_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/transform")
            .match_body(Matcher::Json(json!({"job_id": "j1", "prompt": "drop nulls"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "job_id": "j1",
                    "steps": [
                        {"operation": "fillna", "parameters": {"value": 0, "columns": "all"}},
                        {"operation": "drop_duplicates", "parameters": {}, "target_column": null}
                    ],
                    "estimated_impact": "Fill and dedupe"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let plan = gateway(&server).generate_plan("j1", "drop nulls").await.unwrap();

        mock.assert_async().await;
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].operation, "fillna");
        assert_eq!(plan.steps[1].operation, "drop_duplicates");
        assert_eq!(plan.estimated_impact, "Fill and dedupe");
    }

    #[tokio::test]
    async fn test_server_detail_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/transform")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail": "Step 1 Invalid: Column 'x' does not exist in schema."}"#)
            .create_async()
            .await;

        let err = gateway(&server).generate_plan("j1", "drop x").await.unwrap_err();
        assert_eq!(
            err.detail(),
            Some("Step 1 Invalid: Column 'x' does not exist in schema.")
        );
    }

    #[tokio::test]
    async fn test_plain_text_error_has_no_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/execute")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let err = gateway(&server).execute("j1", true).await.unwrap_err();
        assert!(matches!(err, GatewayError::Server { status: 502, .. }));
        assert_eq!(err.detail(), None);
    }

    #[tokio::test]
    async fn test_execute_decodes_domain_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/execute")
            .match_body(Matcher::Json(json!({"job_id": "j1", "approved": true})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "job_id": "j1",
                    "status": "failed",
                    "download_url": null,
                    "metrics": {},
                    "error": "division by zero"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = gateway(&server).execute("j1", true).await.unwrap();
        assert_eq!(result.status, crate::types::JobStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("division by zero"));
        assert!(result.download_url.is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/execute")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let err = gateway(&server).execute("j1", true).await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[tokio::test]
    async fn test_upload_streams_multipart_and_reports_progress() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/upload")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(Matcher::Regex("filename=\"people.csv\"".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "job_id": "j42",
                    "filename": "people.csv",
                    "total_rows": 2,
                    "columns": [
                        {"name": "id", "dtype": "int", "null_count": 0, "unique_count": 2, "sample_values": [1, 2]},
                        {"name": "name", "dtype": "string", "null_count": 1, "unique_count": 1, "sample_values": ["Ann"]}
                    ],
                    "preview": [{"id": 1, "name": "Ann"}, {"id": 2, "name": null}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let tracker = ProgressTracker::new(Arc::new(move |p| sink.lock().unwrap().push(p)));

        let file = DatasetFile::new("people.csv", "id,name\n1,Ann\n2,\n");
        let profile = gateway(&server)
            .with_chunk_size(4)
            .upload(file, tracker)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(profile.job_id, "j42");
        assert_eq!(profile.total_rows, 2);
        assert_eq!(profile.preview.len(), 2);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_health_probe_hits_service_root() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "ok", "service": "FRIDATA Backend"}"#)
            .create_async()
            .await;

        assert!(gateway(&server).health().await.unwrap());
    }
}
