//! Preview batches: canonical records awaiting operator confirmation.
//!
//! A batch is transient. It is built fresh on every parse, handed to the
//! operator for review, and either submitted or discarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ExportError, SubmitError, SubmitResult};
use crate::models::{CanonicalRecord, TargetSchema};
use crate::transform::SkippedRow;

/// Reviewable collection of canonical records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBatch {
    pub batch_id: String,
    pub import_type: TargetSchema,
    pub records: Vec<CanonicalRecord>,
    pub row_count: usize,
    /// Rows dropped during mapping, with reasons.
    #[serde(default)]
    pub skipped: Vec<SkippedRow>,
    pub created_at: DateTime<Utc>,
}

/// Wrap canonical records into a batch.
///
/// No validation and no de-duplication: two rows with the same code both
/// end up in the batch.
pub fn assemble(records: Vec<CanonicalRecord>, schema: TargetSchema) -> PreviewBatch {
    PreviewBatch {
        batch_id: Uuid::new_v4().to_string(),
        import_type: schema,
        row_count: records.len(),
        records,
        skipped: Vec::new(),
        created_at: Utc::now(),
    }
}

impl PreviewBatch {
    pub fn with_skipped(mut self, skipped: Vec<SkippedRow>) -> Self {
        self.skipped = skipped;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check that the batch may be posted to its import endpoint.
    ///
    /// Batches posted back by a client are not trusted: every record must
    /// match `import_type` and `row_count` must equal the record count.
    pub fn check(&self) -> SubmitResult<()> {
        if self.is_empty() {
            return Err(SubmitError::EmptyBatch);
        }
        if self.row_count != self.records.len() {
            return Err(SubmitError::InconsistentBatch(format!(
                "rowCount is {} but the batch holds {} record(s)",
                self.row_count,
                self.records.len()
            )));
        }
        if let Some(pos) = self.records.iter().position(|r| r.schema() != self.import_type) {
            return Err(SubmitError::InconsistentBatch(format!(
                "record {} is not one of the batch's {}",
                pos + 1,
                self.import_type
            )));
        }
        Ok(())
    }

    pub fn can_submit(&self) -> bool {
        self.check().is_ok()
    }

    /// One-line description for logs and the CLI.
    pub fn summary(&self) -> String {
        let mut summary = format!("{} {} ready for import", self.row_count, self.import_type);
        if !self.skipped.is_empty() {
            summary.push_str(&format!(", {} row(s) skipped", self.skipped.len()));
        }
        summary
    }

    /// Render the batch as CSV with the wire field names as header.
    pub fn to_csv(&self) -> Result<String, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        match self.import_type {
            TargetSchema::Subjects => {
                writer.write_record([
                    "code", "name", "credits", "type", "isElective", "regulationId", "departmentId", "semester",
                ])?;
                for subject in self.records.iter().filter_map(CanonicalRecord::as_subject) {
                    writer.write_record([
                        subject.code.clone(),
                        subject.name.clone(),
                        subject.credits.to_string(),
                        subject.subject_type.as_str().to_string(),
                        subject.is_elective.to_string(),
                        subject.regulation_id.to_string(),
                        subject.department_id.to_string(),
                        subject.semester.to_string(),
                    ])?;
                }
            }
            TargetSchema::Semesters => {
                writer.write_record([
                    "regulationId", "departmentId", "number", "mandatoryCount", "electiveCount", "description",
                ])?;
                for semester in self.records.iter().filter_map(CanonicalRecord::as_semester) {
                    writer.write_record([
                        semester.regulation_id.to_string(),
                        semester.department_id.to_string(),
                        semester.number.to_string(),
                        semester.mandatory_count.to_string(),
                        semester.elective_count.to_string(),
                        semester.description.clone().unwrap_or_default(),
                    ])?;
                }
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Flush(e.to_string()))?;
        Ok(String::from_utf8(bytes)?)
    }
}
