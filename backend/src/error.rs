//! Error types for the ingestion pipeline.
//!
//! - [`ParseError`] - Text parsing and field mapping errors
//! - [`SubmitError`] - Bulk import submission errors
//! - [`ConfigError`] - Environment configuration errors
//! - [`ExportError`] - Preview export errors
//! - [`ServerError`] - HTTP API errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Parse Errors
// =============================================================================

/// Errors raised while turning pasted text into canonical records.
///
/// Every variant is recoverable: the operator edits the text and parses again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The text is blank.
    #[error("Nothing to import: input is empty")]
    EmptyInput,

    /// Malformed JSON, or JSON that is neither an object nor an array of objects.
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    /// SQL input contained no usable `INSERT INTO ... VALUES (...)` statement.
    #[error("No INSERT statements found ({scanned} statement(s) scanned)")]
    NoStatementsFound { scanned: usize },

    /// CSV header is unusable.
    #[error("Malformed CSV at line {line}: {message}")]
    MalformedCsv { line: usize, message: String },

    /// A required field was absent or blank (strict mode only).
    #[error("Row {row}: required field '{field}' is missing or empty")]
    AmbiguousMapping { field: String, row: usize },
}

impl ParseError {
    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson {
            message: message.into(),
        }
    }

    pub fn malformed_csv(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedCsv {
            line,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_json(e.to_string())
    }
}

// =============================================================================
// Submission Errors
// =============================================================================

/// Errors from the bulk import endpoint.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Refused before any network call.
    #[error("Refusing to submit an empty batch")]
    EmptyBatch,

    /// Batch contents disagree with its header. Refused before any network call.
    #[error("Inconsistent batch: {0}")]
    InconsistentBatch(String),

    /// Transport failure (connection refused, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Server answered with a non-success status. `payload` is the body verbatim.
    #[error("Server returned {status}: {payload}")]
    Server { status: u16, payload: String },

    /// Success status but the body could not be understood.
    #[error("Invalid server response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for SubmitError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while rendering a preview batch.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV writer flush failed: {0}")]
    Flush(String),

    #[error("Export is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Submission error.
    #[error("Import error: {0}")]
    Submit(#[from] SubmitError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Listener or IO failure.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for submission operations.
pub type SubmitResult<T> = Result<T, SubmitError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let parse_err = ParseError::NoStatementsFound { scanned: 2 };
        let server_err: ServerError = parse_err.into();
        assert!(server_err.to_string().contains("No INSERT statements"));

        let submit_err = SubmitError::Server {
            status: 422,
            payload: r#"{"error":"duplicate code CS101"}"#.into(),
        };
        let server_err: ServerError = submit_err.into();
        assert!(server_err.to_string().contains("duplicate code CS101"));
    }

    #[test]
    fn test_ambiguous_mapping_format() {
        let err = ParseError::AmbiguousMapping {
            field: "code".into(),
            row: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("Row 3"));
        assert!(msg.contains("'code'"));
        assert!(msg.contains("missing or empty"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: ParseError = json_err.into();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
        assert!(err.to_string().starts_with("Invalid JSON"));
    }
}
