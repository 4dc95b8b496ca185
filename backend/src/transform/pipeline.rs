//! High-level ingestion API: pasted text to preview batch.
//!
//! Combines every step: format detection, parsing, canonical mapping with
//! skipped-row tracking, batch assembly and schema validation.
//!
//! # Example
//!
//! ```rust,ignore
//! use curriculum_ingest::{ingest, IngestOptions};
//!
//! let text = "INSERT INTO subjects (code, name, credits) VALUES ('CS101', 'Intro', 3);";
//! let result = ingest(text, &IngestOptions::default())?;
//! println!("{}", result.batch.summary());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::canonical::{canonicalize_all, SkippedRow};
use crate::api::logs::{log_error, log_info, log_success, log_warning, log_warning_indent};
use crate::error::ParseResult;
use crate::models::{ImportContext, TargetSchema};
use crate::parser::{parse_text, InputFormat};
use crate::preview::{assemble, PreviewBatch};
use crate::validation::{validate_batch, ValidationReport};

/// Options for one ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOptions {
    pub schema: TargetSchema,

    /// `Auto` detects from the text.
    #[serde(default)]
    pub format: InputFormat,

    /// Fills ids the rows leave out.
    #[serde(default)]
    pub context: ImportContext,

    /// Abort on the first row missing a required field instead of skipping it.
    #[serde(default)]
    pub strict: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            schema: TargetSchema::Subjects,
            format: InputFormat::Auto,
            context: ImportContext::default(),
            strict: false,
        }
    }
}

impl IngestOptions {
    pub fn for_schema(schema: TargetSchema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }
}

/// Result of one ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    pub batch: PreviewBatch,
    /// Format actually parsed, never `Auto`.
    pub format: InputFormat,
    /// Rows the parser produced, before mapping.
    pub raw_count: usize,
    pub validation: ValidationReport,
}

/// Turn pasted text into a preview batch.
///
/// Fails only when nothing can be parsed (or on the first unmappable row in
/// strict mode). Rows that parse but do not map are reported in
/// `batch.skipped`; schema violations are reported in `validation`.
pub fn ingest(text: &str, options: &IngestOptions) -> ParseResult<IngestResult> {
    log_info(format!("Parsing {} input...", options.schema));

    let parsed = parse_text(text, options.format).map_err(|e| {
        log_error(e.to_string());
        e
    })?;
    let detected = if options.format == InputFormat::Auto { " (detected)" } else { "" };
    log_success(format!("Format: {}{}", parsed.format, detected));
    log_success(format!("Extracted {} row(s)", parsed.records.len()));

    log_info("Mapping columns to canonical fields...");
    let outcome = canonicalize_all(&parsed.records, options.schema, &options.context, options.strict)
        .map_err(|e| {
            log_error(e.to_string());
            e
        })?;
    log_success(format!("Mapped {} {}", outcome.records.len(), options.schema));
    report_skipped(&outcome.skipped);

    let batch = assemble(outcome.records, options.schema).with_skipped(outcome.skipped);

    log_info("Validating records...");
    let validation = validate_batch(&batch.records);
    report_validation(&validation);

    if batch.is_empty() {
        log_warning("Nothing to import: the batch is empty");
    }

    Ok(IngestResult {
        raw_count: parsed.records.len(),
        format: parsed.format,
        batch,
        validation,
    })
}

/// Group skipped rows by reason, a few row numbers each.
fn report_skipped(skipped: &[SkippedRow]) {
    if skipped.is_empty() {
        return;
    }
    log_warning(format!("{} row(s) skipped", skipped.len()));

    let mut reasons: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for skip in skipped {
        let key = if skip.missing_fields.is_empty() {
            skip.reason.clone()
        } else {
            format!("Missing: {}", skip.missing_fields.join(", "))
        };
        reasons.entry(key).or_default().push(skip.row);
    }

    for (reason, rows) in reasons.iter().take(5) {
        let sample: Vec<String> = rows.iter().take(5).map(|r| r.to_string()).collect();
        let more = if rows.len() > 5 { format!(" +{}", rows.len() - 5) } else { String::new() };
        log_warning_indent(format!("{} (rows: {}{})", reason, sample.join(", "), more), 1);
    }
}

fn report_validation(report: &ValidationReport) {
    if report.is_clean() {
        log_success(format!("All {} records valid", report.valid));
        return;
    }
    log_warning(format!("Valid: {}, invalid: {}", report.valid, report.invalid));
    for (i, errors) in report.errors.iter().take(3) {
        log_warning_indent(format!("Record {}: {}", i + 1, errors.join("; ")), 1);
    }
}
