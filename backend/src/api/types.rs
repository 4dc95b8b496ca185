//! REST API types for the curriculum screen.
//!
//! Records are returned in their wire shape so the front end can show and
//! post them back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{ImportContext, TargetSchema};
use crate::parser::InputFormat;
use crate::preview::PreviewBatch;
use crate::transform::pipeline::{IngestOptions, IngestResult};
use crate::validation::ValidationReport;

/// Body of `POST /api/preview`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    /// Pasted SQL, CSV or JSON.
    pub text: String,
    pub schema: TargetSchema,
    #[serde(default)]
    pub format: InputFormat,
    #[serde(default)]
    pub context: ImportContext,
    /// Server default when absent.
    #[serde(default)]
    pub strict: Option<bool>,
}

impl PreviewRequest {
    pub fn options(&self, default_strict: bool) -> IngestOptions {
        IngestOptions {
            schema: self.schema,
            format: self.format,
            context: self.context,
            strict: self.strict.unwrap_or(default_strict),
        }
    }
}

/// Response of `POST /api/preview` and `POST /api/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// "ready", "warning" (skipped rows or schema violations) or "empty"
    pub status: String,
    pub format: InputFormat,
    pub raw_count: usize,
    /// Encoding of uploaded files, absent for pasted text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    pub batch: PreviewBatch,
    pub validation: ValidationReport,
}

impl PreviewResponse {
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

impl From<IngestResult> for PreviewResponse {
    fn from(result: IngestResult) -> Self {
        let status = if result.batch.is_empty() {
            "empty"
        } else if result.batch.skipped.is_empty() && result.validation.is_clean() {
            "ready"
        } else {
            "warning"
        };

        PreviewResponse {
            status: status.to_string(),
            format: result.format,
            raw_count: result.raw_count,
            encoding: None,
            batch: result.batch,
            validation: result.validation,
        }
    }
}

/// Response of `POST /api/import`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub status: String,
    pub batch_id: String,
    pub import_type: TargetSchema,
    pub submitted: usize,
    pub imported: usize,
}

impl ImportResponse {
    pub fn imported(batch: &PreviewBatch, imported: usize) -> Self {
        Self {
            status: "imported".to_string(),
            batch_id: batch.batch_id.clone(),
            import_type: batch.import_type,
            submitted: batch.row_count,
            imported,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

/// Error response carrying the upstream status and body of a failed import.
pub fn upstream_error_response(error: &str, status: u16, payload: &str) -> Value {
    // keep JSON payloads structured so the front end can show field errors
    let payload = serde_json::from_str::<Value>(payload).unwrap_or_else(|_| Value::String(payload.to_string()));
    json!({
        "status": "error",
        "error": error,
        "upstreamStatus": status,
        "upstream": payload,
    })
}
