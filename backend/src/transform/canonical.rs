//! Raw record to canonical record mapping.
//!
//! Every canonical field is looked up through the alias table, coerced, and
//! defaulted when absent. Rows that cannot produce a usable record are
//! rejected with a reason instead of being dropped silently.

use serde::{Deserialize, Serialize};

use super::alias::{AliasTable, CanonicalField, KeyIndex};
use super::coerce::{to_bool, to_int, to_number, to_optional_text, to_text};
use crate::error::{ParseError, ParseResult};
use crate::models::{
    CanonicalRecord, CanonicalSemester, CanonicalSubject, ImportContext, RawRecord, SubjectType,
    TargetSchema,
};

/// Fallback semester for subjects when neither the row nor the context has one.
pub const DEFAULT_SUBJECT_SEMESTER: i64 = 1;

/// Why a row produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// SQL row from a table that does not belong to the target schema.
    TableMismatch { table: String },
    /// Required fields without a usable value.
    MissingRequired { fields: Vec<&'static str> },
    /// A value is present but outside its allowed range.
    OutOfRange { field: &'static str, value: i64 },
}

impl Rejection {
    pub fn reason(&self) -> String {
        match self {
            Self::TableMismatch { table } => format!("table '{}' does not match import type", table),
            Self::MissingRequired { .. } => "Missing required fields".to_string(),
            Self::OutOfRange { field, value } => format!("{} out of range: {}", field, value),
        }
    }
}

/// A source row left out of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    /// 1-based position among the parsed rows.
    pub row: usize,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
}

impl SkippedRow {
    pub fn new(row: usize, rejection: &Rejection) -> Self {
        let missing_fields = match rejection {
            Rejection::MissingRequired { fields } => fields.iter().map(|f| f.to_string()).collect(),
            _ => Vec::new(),
        };
        Self {
            row,
            reason: rejection.reason(),
            missing_fields,
        }
    }
}

/// Records that mapped, and the rows that did not.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappingOutcome {
    pub records: Vec<CanonicalRecord>,
    pub skipped: Vec<SkippedRow>,
}

/// Map one raw record onto the target schema.
pub fn canonicalize(
    raw: &RawRecord,
    schema: TargetSchema,
    context: &ImportContext,
) -> Result<CanonicalRecord, Rejection> {
    if !raw.matches_schema(schema) {
        return Err(Rejection::TableMismatch {
            table: raw.table.clone().unwrap_or_default(),
        });
    }

    let table = AliasTable::for_schema(schema);
    let index = KeyIndex::new(raw);
    let lookup = |field: CanonicalField| table.resolve(field, &index).map(|hit| hit.value);

    let regulation_id = to_int(lookup(CanonicalField::RegulationId), context.regulation_id.unwrap_or(0));
    let department_id = to_int(lookup(CanonicalField::DepartmentId), context.department_id.unwrap_or(0));

    match schema {
        TargetSchema::Subjects => {
            let code = to_text(lookup(CanonicalField::Code));
            let name = to_text(lookup(CanonicalField::Name));

            let missing: Vec<&'static str> = [(CanonicalField::Code, &code), (CanonicalField::Name, &name)]
                .into_iter()
                .filter(|(_, text)| text.is_empty())
                .map(|(field, _)| field.name())
                .collect();
            if !missing.is_empty() {
                return Err(Rejection::MissingRequired { fields: missing });
            }

            let subject_type = SubjectType::from_label(&to_text(lookup(CanonicalField::SubjectType)))
                .unwrap_or_default();
            let semester = to_int(
                lookup(CanonicalField::Semester),
                context.semester_number.unwrap_or(DEFAULT_SUBJECT_SEMESTER),
            );

            Ok(CanonicalSubject {
                code,
                name,
                credits: to_int(lookup(CanonicalField::Credits), 0),
                subject_type,
                is_elective: to_bool(lookup(CanonicalField::IsElective)),
                regulation_id,
                department_id,
                semester,
            }
            .into())
        }
        TargetSchema::Semesters => {
            let number = to_number(lookup(CanonicalField::Number))
                .map(|n| n.trunc() as i64)
                .or(context.semester_number)
                .ok_or_else(|| Rejection::MissingRequired {
                    fields: vec![CanonicalField::Number.name()],
                })?;
            if number < 1 {
                return Err(Rejection::OutOfRange {
                    field: CanonicalField::Number.name(),
                    value: number,
                });
            }

            Ok(CanonicalSemester {
                regulation_id,
                department_id,
                number,
                mandatory_count: to_int(lookup(CanonicalField::MandatoryCount), 0).max(0),
                elective_count: to_int(lookup(CanonicalField::ElectiveCount), 0).max(0),
                description: to_optional_text(lookup(CanonicalField::Description)),
            }
            .into())
        }
    }
}

/// Map every row, collecting rejections.
///
/// With `strict`, a row missing a required field aborts the whole mapping
/// with [`ParseError::AmbiguousMapping`] instead of being skipped.
pub fn canonicalize_all(
    raws: &[RawRecord],
    schema: TargetSchema,
    context: &ImportContext,
    strict: bool,
) -> ParseResult<MappingOutcome> {
    let mut outcome = MappingOutcome::default();

    for (idx, raw) in raws.iter().enumerate() {
        let row = idx + 1;
        match canonicalize(raw, schema, context) {
            Ok(record) => outcome.records.push(record),
            Err(Rejection::MissingRequired { fields }) if strict => {
                return Err(ParseError::AmbiguousMapping {
                    field: fields.first().copied().unwrap_or_default().to_string(),
                    row,
                });
            }
            Err(rejection) => outcome.skipped.push(SkippedRow::new(row, &rejection)),
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => RawRecord::untagged(map),
            _ => RawRecord::untagged(Map::new()),
        }
    }

    fn tagged(table: &str, value: Value) -> RawRecord {
        RawRecord {
            table: Some(table.to_string()),
            ..record(value)
        }
    }

    #[test]
    fn test_canonical_keys_are_identity() {
        let input = json!({
            "code": "CS101",
            "name": "Intro to CS",
            "credits": 3,
            "type": "LAB",
            "isElective": true,
            "regulationId": 1,
            "departmentId": 2,
            "semester": 4
        });

        let mapped = canonicalize(&record(input.clone()), TargetSchema::Subjects, &ImportContext::default()).unwrap();
        assert_eq!(serde_json::to_value(&mapped).unwrap(), input);
    }

    #[test]
    fn test_semester_identity() {
        let input = json!({
            "regulationId": 3,
            "departmentId": 5,
            "number": 2,
            "mandatoryCount": 6,
            "electiveCount": 2,
            "description": "Second semester"
        });

        let mapped = canonicalize(&record(input.clone()), TargetSchema::Semesters, &ImportContext::default()).unwrap();
        assert_eq!(serde_json::to_value(&mapped).unwrap(), input);
    }

    #[test]
    fn test_alias_spellings_and_string_values() {
        let raw = record(json!({
            "Course_Code": " EE201 ",
            "courseName": "Circuits",
            "credit_hours": "4",
            "subjectType": "lab",
            "elective": "Yes",
            "dept_id": "7"
        }));
        let ctx = ImportContext::new(Some(9), Some(1), Some(3));

        let subject = canonicalize(&raw, TargetSchema::Subjects, &ctx).unwrap();
        let subject = subject.as_subject().unwrap();

        assert_eq!(subject.code, "EE201");
        assert_eq!(subject.name, "Circuits");
        assert_eq!(subject.credits, 4);
        assert_eq!(subject.subject_type, SubjectType::Lab);
        assert!(subject.is_elective);
        assert_eq!(subject.regulation_id, 9);
        assert_eq!(subject.department_id, 7);
        assert_eq!(subject.semester, 3);
    }

    #[test]
    fn test_subject_defaults() {
        let raw = record(json!({"code": "HS100", "name": "Ethics"}));
        let subject = canonicalize(&raw, TargetSchema::Subjects, &ImportContext::default()).unwrap();

        assert_eq!(
            subject,
            CanonicalRecord::Subject(CanonicalSubject {
                code: "HS100".into(),
                name: "Ethics".into(),
                credits: 0,
                subject_type: SubjectType::Core,
                is_elective: false,
                regulation_id: 0,
                department_id: 0,
                semester: DEFAULT_SUBJECT_SEMESTER,
            })
        );
    }

    #[test]
    fn test_unparseable_number_uses_fallback() {
        let raw = record(json!({"code": "X", "name": "Y", "credits": "three", "regulation_id": "abc"}));
        let ctx = ImportContext::new(Some(4), None, None);
        let subject = canonicalize(&raw, TargetSchema::Subjects, &ctx).unwrap();
        let subject = subject.as_subject().unwrap();

        assert_eq!(subject.credits, 0);
        assert_eq!(subject.regulation_id, 4);
    }

    #[test]
    fn test_unknown_type_is_core() {
        let raw = record(json!({"code": "X", "name": "Y", "type": "SEMINAR"}));
        let subject = canonicalize(&raw, TargetSchema::Subjects, &ImportContext::default()).unwrap();
        assert_eq!(subject.as_subject().unwrap().subject_type, SubjectType::Core);
    }

    #[test]
    fn test_missing_code_and_name_rejected() {
        let raw = record(json!({"course_code": "", "credits": 3}));
        let err = canonicalize(&raw, TargetSchema::Subjects, &ImportContext::default()).unwrap_err();
        assert_eq!(err, Rejection::MissingRequired { fields: vec!["code", "name"] });
    }

    #[test]
    fn test_table_mismatch_rejected() {
        let raw = tagged("semesters", json!({"code": "X", "name": "Y"}));
        let err = canonicalize(&raw, TargetSchema::Subjects, &ImportContext::default()).unwrap_err();
        assert_eq!(err, Rejection::TableMismatch { table: "semesters".into() });
    }

    #[test]
    fn test_semester_number_from_context() {
        let raw = record(json!({"mandatory": "5", "electives": -2, "description": ""}));
        let ctx = ImportContext::new(Some(1), Some(2), Some(6));
        let semester = canonicalize(&raw, TargetSchema::Semesters, &ctx).unwrap();
        let semester = semester.as_semester().unwrap();

        assert_eq!(semester.number, 6);
        assert_eq!(semester.mandatory_count, 5);
        assert_eq!(semester.elective_count, 0);
        assert_eq!(semester.description, None);
        assert_eq!(semester.regulation_id, 1);
    }

    #[test]
    fn test_semester_number_required() {
        let raw = record(json!({"description": "orphan"}));
        let err = canonicalize(&raw, TargetSchema::Semesters, &ImportContext::default()).unwrap_err();
        assert_eq!(err, Rejection::MissingRequired { fields: vec!["number"] });

        let zero = record(json!({"number": 0}));
        let err = canonicalize(&zero, TargetSchema::Semesters, &ImportContext::default()).unwrap_err();
        assert_eq!(err, Rejection::OutOfRange { field: "number", value: 0 });
    }

    #[test]
    fn test_canonicalize_all_reports_skipped() {
        let raws = vec![
            record(json!({"code": "A1", "name": "Alpha"})),
            record(json!({"name": "No code"})),
            tagged("semesters", json!({"number": 1})),
            record(json!({"code": "A2", "name": "Beta"})),
        ];

        let outcome = canonicalize_all(&raws, TargetSchema::Subjects, &ImportContext::default(), false).unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.skipped[0].row, 2);
        assert_eq!(outcome.skipped[0].missing_fields, vec!["code".to_string()]);
        assert_eq!(outcome.skipped[1].row, 3);
        assert!(outcome.skipped[1].reason.contains("semesters"));
    }

    #[test]
    fn test_canonicalize_all_strict() {
        let raws = vec![
            record(json!({"code": "A1", "name": "Alpha"})),
            record(json!({"code": "A2"})),
        ];

        let err = canonicalize_all(&raws, TargetSchema::Subjects, &ImportContext::default(), true).unwrap_err();
        assert_eq!(err, ParseError::AmbiguousMapping { field: "name".into(), row: 2 });
    }

    #[test]
    fn test_strict_still_skips_table_mismatch() {
        let raws = vec![tagged("subjects", json!({"number": 1}))];
        let outcome = canonicalize_all(&raws, TargetSchema::Semesters, &ImportContext::default(), true).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
    }
}
