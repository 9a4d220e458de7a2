// Type definitions shared between the gateway, the workflow controller and the UI

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single preview cell as sent by the backend.
///
/// Previews are loosely typed on the wire; everything the backend emits for a
/// cell is one of these four shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Boolean(bool),
    Number(serde_json::Number),
    String(String),
}

impl CellValue {
    /// Textual form used for display and for diff comparison.
    /// `Null` renders as the empty string.
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Number(n) => f.write_str(&format_number(n)),
            CellValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n.into())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(CellValue::Number)
            .unwrap_or(CellValue::Null)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

/// Integral floats print without a fractional part, so `1.0` and `1` share a
/// textual form. Magnitudes of at least 1e21 or below 1e-6 use exponent
/// notation (`1e+21`, `1.5e-7`), as browsers print them.
fn format_number(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.is_finite() && (f.abs() >= 1e21 || f.abs() < 1e-6) => exponent_form(f),
        Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn exponent_form(f: f64) -> String {
    let text = format!("{:e}", f);
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => text,
    }
}

/// One preview row: column name to value. Not every column is guaranteed to
/// be present.
pub type Row = HashMap<String, CellValue>;

/// Text of `row[column]`, with a missing row or key treated like `Null`.
pub fn cell_text(row: Option<&Row>, column: &str) -> String {
    row.and_then(|r| r.get(column))
        .map(CellValue::as_text)
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub null_count: u64,
    pub unique_count: u64,
    #[serde(default)]
    pub sample_values: Vec<CellValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub job_id: String,
    pub filename: String,
    pub total_rows: u64,
    pub columns: Vec<ColumnProfile>,
    #[serde(default)]
    pub preview: Vec<Row>,
}

impl DatasetProfile {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformStep {
    pub operation: String,
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl TransformStep {
    /// Parameters rendered as compact JSON for the transcript.
    pub fn parameters_text(&self) -> String {
        serde_json::Value::Object(self.parameters.clone()).to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanRequest<'a> {
    pub job_id: &'a str,
    pub prompt: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub job_id: String,
    pub steps: Vec<TransformStep>,
    #[serde(default)]
    pub estimated_impact: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRequest<'a> {
    pub job_id: &'a str,
    pub approved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Analyzing,
    Ready,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Analyzing => write!(f, "analyzing"),
            JobStatus::Ready => write!(f, "ready"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub metrics: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub preview: Option<Vec<Row>>,
}

impl ExecutionResult {
    /// Metric rendered for display; `None` when the backend omitted it.
    pub fn metric_text(&self, key: &str) -> Option<String> {
        self.metrics.get(key).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Author of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Ai,
}

/// A transcript entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationEntry {
    pub role: ConversationRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::Ai,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] crate::gateway::GatewayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A workflow stage ended in `Failed`
    #[error("{stage} failed: {message}")]
    Workflow { stage: &'static str, message: String },
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_decodes_loose_json() {
        let row: Row = serde_json::from_str(
            r#"{"id": 1, "price": 2.5, "name": "Ann", "active": true, "note": null}"#,
        )
        .unwrap();

        assert_eq!(row["id"], CellValue::from(1i64));
        assert_eq!(row["name"], CellValue::from("Ann"));
        assert_eq!(row["active"], CellValue::Boolean(true));
        assert_eq!(row["note"], CellValue::Null);
        assert_eq!(row["price"].as_text(), "2.5");
    }

    #[test]
    fn test_cell_text_coerces_missing_and_null() {
        let row: Row = serde_json::from_str(r#"{"a": null}"#).unwrap();
        assert_eq!(cell_text(Some(&row), "a"), "");
        assert_eq!(cell_text(Some(&row), "missing"), "");
        assert_eq!(cell_text(None, "a"), "");
    }

    #[test]
    fn test_integral_float_matches_integer_text() {
        assert_eq!(CellValue::from(1.0f64).as_text(), CellValue::from(1i64).as_text());
        assert_eq!(CellValue::from(-0.0f64).as_text(), "0");
        assert_eq!(CellValue::from(1i64).as_text(), CellValue::from("1").as_text());
    }

    #[test]
    fn test_extreme_magnitudes_use_exponent_form() {
        assert_eq!(CellValue::from(1e21f64).as_text(), "1e+21");
        assert_eq!(CellValue::from(1.23e27f64).as_text(), "1.23e+27");
        assert_eq!(CellValue::from(-2e30f64).as_text(), "-2e+30");
        assert_eq!(CellValue::from(1.5e-7f64).as_text(), "1.5e-7");
        assert_eq!(CellValue::from(0.000001f64).as_text(), "0.000001");
        assert_eq!(CellValue::from(1e20f64).as_text(), "100000000000000000000");
        assert_eq!(CellValue::from(123456.5f64).as_text(), "123456.5");
    }

    #[test]
    fn test_execution_result_optional_fields() {
        let result: ExecutionResult = serde_json::from_str(
            r#"{"job_id": "j1", "status": "failed", "download_url": null,
                "metrics": {}, "error": "division by zero"}"#,
        )
        .unwrap();

        assert_eq!(result.status, JobStatus::Failed);
        assert_eq!(result.download_url, None);
        assert_eq!(result.error.as_deref(), Some("division by zero"));
        assert!(result.preview.is_none());
    }

    #[test]
    fn test_step_parameters_text() {
        let step: TransformStep = serde_json::from_str(
            r#"{"operation": "fillna", "parameters": {"value": 0, "columns": ["age"]}}"#,
        )
        .unwrap();
        assert_eq!(step.parameters_text(), r#"{"columns":["age"],"value":0}"#);
        assert!(step.target_column.is_none());
    }
}
