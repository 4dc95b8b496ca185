//! Bulk import submission.
//!
//! [`ImportSubmitter`] is the seam between the ingestion engine and whatever
//! commits a batch. [`HttpImportClient`] is the REST implementation:
//!
//! | Batch type  | Request                        |
//! |-------------|--------------------------------|
//! | `subjects`  | `POST {base}/bulk-import/subjects`  |
//! | `semesters` | `POST {base}/bulk-import/semesters` |
//!
//! The body is the bare record array. No retries and no splitting: a failed
//! submission leaves the batch untouched and the caller decides what to do.

use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::api::logs::{log_error, log_info, log_success};
use crate::config::Config;
use crate::error::{SubmitError, SubmitResult};
use crate::models::TargetSchema;
use crate::preview::PreviewBatch;

/// Something that can commit a preview batch.
///
/// Resolves to the number of records the server reports as imported.
pub trait ImportSubmitter {
    fn submit(&self, batch: &PreviewBatch) -> impl Future<Output = SubmitResult<usize>> + Send;
}

/// REST client for the bulk-create endpoints.
#[derive(Debug, Clone)]
pub struct HttpImportClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpImportClient {
    /// Client with reqwest defaults and no token.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn from_config(config: &Config) -> SubmitResult<Self> {
        let client = Self::new(config.api_url.clone()).with_timeout(config.timeout)?;
        Ok(match &config.api_token {
            Some(token) => client.with_token(token.clone()),
            None => client,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> SubmitResult<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn endpoint(&self, schema: TargetSchema) -> String {
        format!("{}/{}", self.base_url, schema.endpoint())
    }
}

impl ImportSubmitter for HttpImportClient {
    async fn submit(&self, batch: &PreviewBatch) -> SubmitResult<usize> {
        batch.check()?;

        let url = self.endpoint(batch.import_type);
        log_info(format!("Submitting {} {} to {}", batch.row_count, batch.import_type, url));

        let mut request = self.client.post(&url).json(&batch.records);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            log_error(format!("Request failed: {}", e));
            SubmitError::from(e)
        })?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            log_error(format!("Server returned {}", status));
            return Err(SubmitError::Server {
                status: status.as_u16(),
                payload: body,
            });
        }

        let count = imported_count(&body, batch.row_count)?;
        log_success(format!("Imported {} {}", count, batch.import_type));
        Ok(count)
    }
}

/// Read the imported count from a success body.
///
/// Accepts a bare number, an object with `count`, `imported` or
/// `importedCount`, or an array of created records. An empty body, or an
/// object without a count, means the whole batch went in.
pub fn imported_count(body: &str, batch_size: usize) -> SubmitResult<usize> {
    if body.trim().is_empty() {
        return Ok(batch_size);
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| SubmitError::InvalidResponse(format!("{}: {}", e, truncate(body, 200))))?;

    let count = match &value {
        Value::Number(n) => n.as_u64(),
        Value::Array(items) => Some(items.len() as u64),
        Value::Object(map) => {
            let keyed = ["count", "imported", "importedCount"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_u64));
            return Ok(keyed.map(|n| n as usize).unwrap_or(batch_size));
        }
        _ => None,
    };

    count
        .map(|n| n as usize)
        .ok_or_else(|| SubmitError::InvalidResponse(truncate(body, 200).to_string()))
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalRecord, CanonicalSemester, CanonicalSubject, SubjectType};
    use crate::preview::assemble;
    use axum::{
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };

    const TOKEN: &str = "t0ken";

    async fn spawn_server() -> String {
        let app = Router::new()
            .route(
                "/api/bulk-import/subjects",
                post(|headers: HeaderMap, Json(records): Json<Vec<Value>>| async move {
                    let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
                    if auth != Some("Bearer t0ken") {
                        return (StatusCode::UNAUTHORIZED, "missing token".to_string());
                    }
                    (
                        StatusCode::CREATED,
                        serde_json::json!({ "imported": records.len() }).to_string(),
                    )
                }),
            )
            .route(
                "/api/bulk-import/semesters",
                post(|Json(_records): Json<Vec<Value>>| async { StatusCode::OK }),
            )
            .route(
                "/broken/bulk-import/subjects",
                post(|| async {
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        r#"{"error":"duplicate code CS101"}"#,
                    )
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn subjects(n: usize) -> PreviewBatch {
        let records = (0..n)
            .map(|i| {
                CanonicalRecord::Subject(CanonicalSubject {
                    code: format!("CS10{}", i),
                    name: "Intro".into(),
                    credits: 3,
                    subject_type: SubjectType::Core,
                    is_elective: false,
                    regulation_id: 1,
                    department_id: 1,
                    semester: 1,
                })
            })
            .collect();
        assemble(records, TargetSchema::Subjects)
    }

    #[test]
    fn test_endpoint() {
        let client = HttpImportClient::new("http://host/api/");
        assert_eq!(client.endpoint(TargetSchema::Subjects), "http://host/api/bulk-import/subjects");
        assert_eq!(client.endpoint(TargetSchema::Semesters), "http://host/api/bulk-import/semesters");
    }

    #[test]
    fn test_imported_count_shapes() {
        assert_eq!(imported_count("", 4).unwrap(), 4);
        assert_eq!(imported_count("3", 4).unwrap(), 3);
        assert_eq!(imported_count(r#"{"count": 2}"#, 4).unwrap(), 2);
        assert_eq!(imported_count(r#"{"importedCount": 1}"#, 4).unwrap(), 1);
        assert_eq!(imported_count(r#"{"message": "ok"}"#, 4).unwrap(), 4);
        assert_eq!(imported_count(r#"[{"id":1},{"id":2}]"#, 4).unwrap(), 2);
        assert!(matches!(imported_count("<html>", 4), Err(SubmitError::InvalidResponse(_))));
        assert!(matches!(imported_count("\"done\"", 4), Err(SubmitError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_submit_subjects_with_token() {
        let base = spawn_server().await;
        let client = HttpImportClient::new(format!("{}/api", base)).with_token(TOKEN);

        let count = client.submit(&subjects(3)).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_missing_token_is_server_error() {
        let base = spawn_server().await;
        let client = HttpImportClient::new(format!("{}/api", base));

        match client.submit(&subjects(1)).await {
            Err(SubmitError::Server { status, payload }) => {
                assert_eq!(status, 401);
                assert_eq!(payload, "missing token");
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_payload_is_verbatim() {
        let base = spawn_server().await;
        let client = HttpImportClient::new(format!("{}/broken", base));

        match client.submit(&subjects(2)).await {
            Err(SubmitError::Server { status, payload }) => {
                assert_eq!(status, 422);
                assert_eq!(payload, r#"{"error":"duplicate code CS101"}"#);
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_success_body_counts_batch() {
        let base = spawn_server().await;
        let client = HttpImportClient::new(format!("{}/api", base));
        let batch = assemble(
            vec![CanonicalRecord::Semester(CanonicalSemester {
                regulation_id: 1,
                department_id: 1,
                number: 1,
                mandatory_count: 4,
                elective_count: 0,
                description: None,
            })],
            TargetSchema::Semesters,
        );

        assert_eq!(client.submit(&batch).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_refused_without_request() {
        // Nothing listens here; an attempted request would be a transport error
        let client = HttpImportClient::new("http://127.0.0.1:1");
        let result = client.submit(&subjects(0)).await;
        assert!(matches!(result, Err(SubmitError::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let client = HttpImportClient::new("http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(2))
            .unwrap();
        let result = client.submit(&subjects(1)).await;
        assert!(matches!(result, Err(SubmitError::Http(_))));
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            api_url: "http://curriculum/api".into(),
            api_token: Some("abc".into()),
            ..Config::default()
        };
        let client = HttpImportClient::from_config(&config).unwrap();
        assert_eq!(client.token.as_deref(), Some("abc"));
        assert_eq!(client.endpoint(TargetSchema::Semesters), "http://curriculum/api/bulk-import/semesters");
    }
}
