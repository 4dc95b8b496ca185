//! JSON Schema validation for canonical records.
//!
//! Schemas are embedded at compile time from the `schemas/` directory
//! (`subject.json`, `semester.json`) and checked with JSON Schema Draft 7.
//!
//! Validation is informational. A record that fails is still part of the
//! batch; the report tells the operator what the server is likely to reject.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use curriculum_ingest::validation::validate_value;
//! use curriculum_ingest::TargetSchema;
//!
//! let subject = json!({
//!     "code": "CS101",
//!     "name": "Intro to CS",
//!     "credits": 3,
//!     "type": "CORE",
//!     "isElective": false,
//!     "regulationId": 1,
//!     "departmentId": 2,
//!     "semester": 1
//! });
//! assert!(validate_value(TargetSchema::Subjects, &subject).is_ok());
//! ```

use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{CanonicalRecord, TargetSchema};

static SUBJECT_VALIDATOR: Lazy<Validator> =
    Lazy::new(|| compile(include_str!("../../schemas/subject.json")));
static SEMESTER_VALIDATOR: Lazy<Validator> =
    Lazy::new(|| compile(include_str!("../../schemas/semester.json")));

fn compile(source: &str) -> Validator {
    let schema: Value = serde_json::from_str(source).expect("Invalid embedded schema");
    jsonschema::draft7::new(&schema).expect("Embedded schema does not compile")
}

fn validator(schema: TargetSchema) -> &'static Validator {
    match schema {
        TargetSchema::Subjects => &SUBJECT_VALIDATOR,
        TargetSchema::Semesters => &SEMESTER_VALIDATOR,
    }
}

/// Validate a JSON value against an arbitrary schema.
///
/// Returns every error message, or the compile error when the schema itself
/// is invalid.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    collect_errors(&validator, data)
}

fn collect_errors(validator: &Validator, data: &Value) -> Result<(), Vec<String>> {
    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a wire-shaped value against the embedded schema of `schema`.
pub fn validate_value(schema: TargetSchema, data: &Value) -> Result<(), Vec<String>> {
    collect_errors(validator(schema), data)
}

/// Validate one canonical record against its own schema.
pub fn validate_record(record: &CanonicalRecord) -> Result<(), Vec<String>> {
    let value = serde_json::to_value(record).map_err(|e| vec![e.to_string()])?;
    validate_value(record.schema(), &value)
}

pub fn is_valid_record(record: &CanonicalRecord) -> bool {
    serde_json::to_value(record)
        .map(|value| validator(record.schema()).is_valid(&value))
        .unwrap_or(false)
}

/// Outcome of validating a whole batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: usize,
    pub invalid: usize,
    /// Index into the batch records and the messages for that record.
    pub errors: Vec<(usize, Vec<String>)>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.invalid == 0
    }
}

/// Validate every record. Only the first `MAX_REPORTED_ERRORS` failing
/// records keep their messages; the counts are always complete.
pub fn validate_batch(records: &[CanonicalRecord]) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (i, record) in records.iter().enumerate() {
        match validate_record(record) {
            Ok(()) => report.valid += 1,
            Err(errs) => {
                report.invalid += 1;
                if report.errors.len() < MAX_REPORTED_ERRORS {
                    report.errors.push((i, errs));
                }
            }
        }
    }

    report
}

pub const MAX_REPORTED_ERRORS: usize = 10;
