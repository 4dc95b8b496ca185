//! HTTP server for the curriculum ingestion API.
//!
//! # API Endpoints
//!
//! | Method | Path           | Description                                   |
//! |--------|----------------|-----------------------------------------------|
//! | GET    | `/health`      | Health check                                  |
//! | POST   | `/api/preview` | Parse pasted text into a preview batch        |
//! | POST   | `/api/upload`  | Same, from a multipart file upload            |
//! | POST   | `/api/import`  | Submit a preview batch to the curriculum API  |
//! | GET    | `/api/logs`    | SSE stream for real-time logs                 |

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, upstream_error_response, ImportResponse, PreviewRequest, PreviewResponse};
use crate::config::Config;
use crate::error::{ServerResult, SubmitError};
use crate::models::{ImportContext, TargetSchema};
use crate::parser::{decode_input, InputFormat};
use crate::preview::PreviewBatch;
use crate::submit::{HttpImportClient, ImportSubmitter};
use crate::transform::pipeline::{ingest, IngestOptions};

type ApiError = (StatusCode, Json<Value>);

fn reject(status: StatusCode, message: impl AsRef<str>) -> ApiError {
    (status, Json(error_response(message.as_ref())))
}

/// Routes with shared configuration, without binding a socket.
pub fn router(config: Arc<Config>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/preview", post(preview))
        .route("/api/upload", post(upload))
        .route("/api/import", post(import))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(config)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> ServerResult<()> {
    let port = config.port;
    let api_url = config.api_url.clone();
    let app = router(Arc::new(config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("Curriculum ingest server running on http://localhost:{}", port);
    println!("   POST /api/preview - Parse pasted text");
    println!("   POST /api/upload  - Parse an uploaded file");
    println!("   POST /api/import  - Submit a batch to {}", api_url);
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "curriculum-ingest",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "preview": "POST /api/preview",
            "upload": "POST /api/upload",
            "import": "POST /api/import",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // lagged receivers just miss entries
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn preview(
    State(config): State<Arc<Config>>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let options = request.options(config.strict);
    let result = ingest(&request.text, &options).map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(result.into()))
}

/// Multipart fields: `file` (required), `schema` (required), and optional
/// `format`, `regulationId`, `departmentId`, `semester`, `strict`.
async fn upload(
    State(config): State<Arc<Config>>,
    mut multipart: Multipart,
) -> Result<Json<PreviewResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut fields: HashMap<String, String> = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("Read error: {}", e)))?;
            fields.insert(name, value);
        }
    }

    let bytes = file_data.ok_or_else(|| reject(StatusCode::BAD_REQUEST, "No file provided"))?;
    let schema: TargetSchema = required_field(&fields, "schema")?;
    let options = IngestOptions {
        schema,
        format: optional_field(&fields, "format")?.unwrap_or(InputFormat::Auto),
        context: ImportContext::new(
            optional_field(&fields, "regulationId")?,
            optional_field(&fields, "departmentId")?,
            optional_field(&fields, "semester")?,
        ),
        strict: optional_field(&fields, "strict")?.unwrap_or(config.strict),
    };

    let decoded = decode_input(&bytes);
    log_info(format!(
        "Upload: {} ({} bytes, {})",
        file_name.as_deref().unwrap_or("unnamed"),
        bytes.len(),
        decoded.encoding
    ));

    let result = ingest(&decoded.text, &options).map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(PreviewResponse::from(result).with_encoding(decoded.encoding)))
}

fn optional_field<T: FromStr>(fields: &HashMap<String, String>, name: &str) -> Result<Option<T>, ApiError> {
    match fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| reject(StatusCode::BAD_REQUEST, format!("Invalid value for '{}': {}", name, raw))),
        None => Ok(None),
    }
}

fn required_field<T: FromStr>(fields: &HashMap<String, String>, name: &str) -> Result<T, ApiError> {
    optional_field(fields, name)?
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, format!("Missing '{}' field", name)))
}

async fn import(
    State(config): State<Arc<Config>>,
    Json(batch): Json<PreviewBatch>,
) -> Result<Json<ImportResponse>, ApiError> {
    batch.check().map_err(submit_rejection)?;
    let client = HttpImportClient::from_config(&config).map_err(submit_rejection)?;
    let imported = client.submit(&batch).await.map_err(submit_rejection)?;
    Ok(Json(ImportResponse::imported(&batch, imported)))
}

fn submit_rejection(error: SubmitError) -> ApiError {
    log_error(error.to_string());
    match error {
        SubmitError::EmptyBatch | SubmitError::InconsistentBatch(_) => {
            reject(StatusCode::BAD_REQUEST, error.to_string())
        }
        SubmitError::Server { status, ref payload } => (
            StatusCode::BAD_GATEWAY,
            Json(upstream_error_response("Import rejected by curriculum API", status, payload)),
        ),
        SubmitError::Http(_) | SubmitError::InvalidResponse(_) => {
            reject(StatusCode::BAD_GATEWAY, error.to_string())
        }
    }
}
