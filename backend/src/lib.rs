//! # Curriculum Ingest - bulk import of subjects and semesters
//!
//! Operators paste ad-hoc SQL `INSERT` statements, CSV or JSON exported from
//! older tools. This crate turns that text into canonical subject or semester
//! records, shows them as a preview batch, and submits the batch to the
//! curriculum API's bulk-create endpoints.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Pasted text │────▶│   Parser    │────▶│  Transform  │────▶│   Preview   │────▶│   Submit    │
//! │ SQL/CSV/JSON│     │ (auto-fmt)  │     │ (alias map) │     │ (+validate) │     │ (REST bulk) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use curriculum_ingest::{ingest, HttpImportClient, ImportSubmitter, IngestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let text = "code,course_name,credits\nCS101,Intro to CS,3";
//!     let result = ingest(text, &IngestOptions::default())?;
//!     println!("{}", result.batch.summary());
//!
//!     let client = HttpImportClient::new("http://localhost:8080/api");
//!     let imported = client.submit(&result.batch).await?;
//!     println!("Imported {} subjects", imported);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`models`] - Raw and canonical records
//! - [`parser`] - Tokenizer and SQL / CSV / JSON parsers
//! - [`transform`] - Alias tables, canonical mapping and the pipeline
//! - [`preview`] - Preview batches and CSV export
//! - [`validation`] - JSON Schema checks on canonical records
//! - [`submit`] - Bulk import submission
//! - [`session`] - Paste-preview-import state machine
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Preview and validation
pub mod preview;
pub mod validation;

// Submission
pub mod session;
pub mod submit;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ExportError, ParseError, ParseResult, ServerError, SubmitError, SubmitResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CanonicalRecord, CanonicalSemester, CanonicalSubject, ImportContext, RawRecord, SubjectType,
    TargetSchema,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_input, detect_format, parse_csv, parse_inserts, parse_json, parse_text, read_input_file,
    tokenize, DecodedText, InputFormat, ParsedInput, Token,
};

// =============================================================================
// Re-exports - Mapping and pipeline
// =============================================================================

pub use transform::{
    canonicalize, canonicalize_all, describe_aliases, ingest, AliasTable, CanonicalField,
    IngestOptions, IngestResult, MappingOutcome, Rejection, SkippedRow,
};

// =============================================================================
// Re-exports - Preview and validation
// =============================================================================

pub use preview::{assemble, PreviewBatch};
pub use validation::{validate_batch, validate_record, ValidationReport};

// =============================================================================
// Re-exports - Submission
// =============================================================================

pub use config::Config;
pub use session::{ImportSession, ImportState, SessionError, SessionFailure};
pub use submit::{HttpImportClient, ImportSubmitter};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ImportResponse, PreviewRequest, PreviewResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
