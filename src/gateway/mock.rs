// Scripted gateway and fixtures for tests

use super::{DatasetFile, GatewayError, GatewayResult, JobGateway};
use crate::progress::ProgressTracker;
use crate::types::{
    CellValue, ColumnProfile, DatasetProfile, ExecutionResult, JobStatus, PlanResponse, Row,
    TransformStep,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Gateway answering from queues of scripted responses.
///
/// After `hold()`, every call parks until the returned `Notify` is signalled,
/// which lets a test interleave `reset` with an outstanding request.
#[derive(Default)]
pub struct MockGateway {
    uploads: Mutex<VecDeque<GatewayResult<DatasetProfile>>>,
    plans: Mutex<VecDeque<GatewayResult<PlanResponse>>>,
    executions: Mutex<VecDeque<GatewayResult<ExecutionResult>>>,
    hold: Mutex<Option<Arc<Notify>>>,
    upload_gate: Mutex<Option<Arc<Notify>>>,
    prompts: Mutex<Vec<String>>,
    approvals: Mutex<Vec<bool>>,
    upload_count: Mutex<usize>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_upload(&self, response: GatewayResult<DatasetProfile>) {
        self.uploads.lock().unwrap().push_back(response);
    }

    pub fn push_plan(&self, response: GatewayResult<PlanResponse>) {
        self.plans.lock().unwrap().push_back(response);
    }

    pub fn push_execution(&self, response: GatewayResult<ExecutionResult>) {
        self.executions.lock().unwrap().push_back(response);
    }

    pub fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(notify.clone());
        notify
    }

    /// Park the next upload before it reports any progress
    pub fn hold_upload_start(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.upload_gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn upload_calls(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn plan_calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn execute_calls(&self) -> usize {
        self.approvals.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    pub fn last_approval(&self) -> Option<bool> {
        self.approvals.lock().unwrap().last().copied()
    }

    async fn wait(&self) {
        let hold = self.hold.lock().unwrap().clone();
        if let Some(notify) = hold {
            notify.notified().await;
        }
    }

    fn unscripted<T>() -> GatewayResult<T> {
        Err(GatewayError::Server {
            status: 500,
            detail: Some("no scripted response".to_string()),
        })
    }
}

#[async_trait]
impl JobGateway for MockGateway {
    async fn upload(&self, _file: DatasetFile, progress: ProgressTracker) -> GatewayResult<DatasetProfile> {
        *self.upload_count.lock().unwrap() += 1;
        let gate = self.upload_gate.lock().unwrap().take();
        if let Some(notify) = gate {
            notify.notified().await;
        }
        progress.start();
        progress.update(1, 2);
        self.wait().await;
        progress.update(2, 2);
        let next = self.uploads.lock().unwrap().pop_front();
        next.unwrap_or_else(Self::unscripted)
    }

    async fn generate_plan(&self, _job_id: &str, prompt: &str) -> GatewayResult<PlanResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.wait().await;
        let next = self.plans.lock().unwrap().pop_front();
        next.unwrap_or_else(Self::unscripted)
    }

    async fn execute(&self, _job_id: &str, approved: bool) -> GatewayResult<ExecutionResult> {
        self.approvals.lock().unwrap().push(approved);
        self.wait().await;
        let next = self.executions.lock().unwrap().pop_front();
        next.unwrap_or_else(Self::unscripted)
    }

    fn download_url(&self, job_id: &str) -> String {
        format!("http://backend.test/api/download/{}", job_id)
    }

    async fn health(&self) -> GatewayResult<bool> {
        Ok(true)
    }
}

fn row(id: i64, name: CellValue) -> Row {
    let mut row = Row::new();
    row.insert("id".to_string(), CellValue::from(id));
    row.insert("name".to_string(), name);
    row
}

pub fn csv_file() -> DatasetFile {
    DatasetFile::new("people.csv", "id,name\n1,Ann\n2,\n3,Cid\n")
}

/// Three rows, two columns; row 1 has a null name
pub fn profile(job_id: &str) -> DatasetProfile {
    DatasetProfile {
        job_id: job_id.to_string(),
        filename: "people.csv".to_string(),
        total_rows: 3,
        columns: vec![
            ColumnProfile {
                name: "id".to_string(),
                dtype: "int".to_string(),
                null_count: 0,
                unique_count: 3,
                sample_values: vec![1i64.into(), 2i64.into(), 3i64.into()],
            },
            ColumnProfile {
                name: "name".to_string(),
                dtype: "string".to_string(),
                null_count: 1,
                unique_count: 2,
                sample_values: vec!["Ann".into(), "Cid".into()],
            },
        ],
        preview: vec![
            row(1, "Ann".into()),
            row(2, CellValue::Null),
            row(3, "Cid".into()),
        ],
    }
}

pub fn plan(job_id: &str) -> PlanResponse {
    let step = |operation: &str, parameters: serde_json::Value| TransformStep {
        operation: operation.to_string(),
        parameters: parameters.as_object().cloned().unwrap_or_default(),
        target_column: None,
        explanation: None,
    };
    PlanResponse {
        job_id: job_id.to_string(),
        steps: vec![
            step("fillna", json!({"value": "unknown", "columns": ["name"]})),
            step("filter_rows", json!({"column": "id", "operator": "<", "value": 3})),
        ],
        estimated_impact: "Fill missing names and keep ids below 3".to_string(),
    }
}

/// Completed run whose preview drops the last row and fills row 1's name
pub fn completed(job_id: &str) -> ExecutionResult {
    let mut metrics = serde_json::Map::new();
    metrics.insert("input_rows".to_string(), json!(3));
    metrics.insert("output_rows".to_string(), json!(2));
    metrics.insert("steps_executed".to_string(), json!(2));
    metrics.insert("execution_time_sec".to_string(), json!(0.02));
    metrics.insert("memory_usage_mb".to_string(), json!(0.01));

    ExecutionResult {
        job_id: job_id.to_string(),
        status: JobStatus::Completed,
        download_url: Some(format!("/api/download/{}", job_id)),
        metrics,
        error: None,
        preview: Some(vec![row(1, "Ann".into()), row(2, "unknown".into())]),
    }
}

pub fn failed(job_id: &str, error: &str) -> ExecutionResult {
    ExecutionResult {
        job_id: job_id.to_string(),
        status: JobStatus::Failed,
        download_url: None,
        metrics: serde_json::Map::new(),
        error: Some(error.to_string()),
        preview: None,
    }
}
