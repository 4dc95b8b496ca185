//! Domain models for the ingestion pipeline.
//!
//! - [`RawRecord`] - Loosely typed row produced by a format parser
//! - [`TargetSchema`] - Which canonical shape a batch is mapped to
//! - [`CanonicalSubject`] / [`CanonicalSemester`] - Wire shapes of the bulk endpoints
//! - [`ImportContext`] - Ambient selection used to fill missing ids

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Target Schema
// =============================================================================

/// The canonical shape a batch is normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSchema {
    Subjects,
    Semesters,
}

impl TargetSchema {
    /// Substring an SQL table name must contain to belong to this schema.
    pub fn table_hint(&self) -> &'static str {
        match self {
            Self::Subjects => "subject",
            Self::Semesters => "sem",
        }
    }

    /// Path segment of the bulk-create endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Subjects => "bulk-import/subjects",
            Self::Semesters => "bulk-import/semesters",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subjects => "subjects",
            Self::Semesters => "semesters",
        }
    }
}

impl fmt::Display for TargetSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "subjects" | "subject" => Ok(Self::Subjects),
            "semesters" | "semester" => Ok(Self::Semesters),
            other => Err(format!(
                "unknown import type '{}' (expected 'subjects' or 'semesters')",
                other
            )),
        }
    }
}

// =============================================================================
// Raw Record
// =============================================================================

/// A row as extracted by a format parser, before any mapping.
///
/// Keys keep their original casing and order. Values are strings, numbers,
/// booleans or null.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawRecord {
    /// Lowercased table name for SQL rows, `None` for CSV and JSON rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub fields: Map<String, Value>,
}

impl RawRecord {
    pub fn untagged(fields: Map<String, Value>) -> Self {
        Self { table: None, fields }
    }

    pub fn tagged(table: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            table: Some(table.into()),
            fields,
        }
    }

    /// Untagged rows belong to every schema.
    pub fn matches_schema(&self, schema: TargetSchema) -> bool {
        match &self.table {
            Some(table) => table.contains(schema.table_hint()),
            None => true,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// =============================================================================
// Import Context
// =============================================================================

/// Ambient selection of the curriculum screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportContext {
    #[serde(default)]
    pub regulation_id: Option<i64>,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub semester_number: Option<i64>,
}

impl ImportContext {
    pub fn new(
        regulation_id: Option<i64>,
        department_id: Option<i64>,
        semester_number: Option<i64>,
    ) -> Self {
        Self {
            regulation_id,
            department_id,
            semester_number,
        }
    }
}

// =============================================================================
// Subject
// =============================================================================

/// Kind of subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubjectType {
    #[default]
    Core,
    Lab,
    Elective,
}

impl SubjectType {
    /// Case-insensitive; unknown labels give `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "CORE" => Some(Self::Core),
            "LAB" => Some(Self::Lab),
            "ELECTIVE" => Some(Self::Elective),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "CORE",
            Self::Lab => "LAB",
            Self::Elective => "ELECTIVE",
        }
    }
}

/// A subject in the shape expected by `POST /bulk-import/subjects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSubject {
    pub code: String,
    pub name: String,
    pub credits: i64,
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub is_elective: bool,
    pub regulation_id: i64,
    pub department_id: i64,
    pub semester: i64,
}

// =============================================================================
// Semester
// =============================================================================

/// A semester in the shape expected by `POST /bulk-import/semesters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSemester {
    pub regulation_id: i64,
    pub department_id: i64,
    pub number: i64,
    pub mandatory_count: i64,
    pub elective_count: i64,
    pub description: Option<String>,
}

// =============================================================================
// Canonical Record
// =============================================================================

/// A fully typed record. Serializes as the bare wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalRecord {
    Subject(CanonicalSubject),
    Semester(CanonicalSemester),
}

impl CanonicalRecord {
    pub fn schema(&self) -> TargetSchema {
        match self {
            Self::Subject(_) => TargetSchema::Subjects,
            Self::Semester(_) => TargetSchema::Semesters,
        }
    }

    pub fn as_subject(&self) -> Option<&CanonicalSubject> {
        match self {
            Self::Subject(s) => Some(s),
            Self::Semester(_) => None,
        }
    }

    pub fn as_semester(&self) -> Option<&CanonicalSemester> {
        match self {
            Self::Semester(s) => Some(s),
            Self::Subject(_) => None,
        }
    }
}

impl From<CanonicalSubject> for CanonicalRecord {
    fn from(s: CanonicalSubject) -> Self {
        Self::Subject(s)
    }
}

impl From<CanonicalSemester> for CanonicalRecord {
    fn from(s: CanonicalSemester) -> Self {
        Self::Semester(s)
    }
}

// =============================================================================
// Tests
// =============================================================================
