//! Alias tables: accepted source spellings for each canonical field.
//!
//! Lookups are case-insensitive and follow list order, so the first alias
//! present in a record wins no matter where it sits in the record.

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

use crate::models::{RawRecord, TargetSchema};

/// A field of one of the two canonical shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Code,
    Name,
    Credits,
    SubjectType,
    IsElective,
    RegulationId,
    DepartmentId,
    Semester,
    Number,
    MandatoryCount,
    ElectiveCount,
    Description,
}

impl CanonicalField {
    /// Name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Name => "name",
            Self::Credits => "credits",
            Self::SubjectType => "type",
            Self::IsElective => "isElective",
            Self::RegulationId => "regulationId",
            Self::DepartmentId => "departmentId",
            Self::Semester => "semester",
            Self::Number => "number",
            Self::MandatoryCount => "mandatoryCount",
            Self::ElectiveCount => "electiveCount",
            Self::Description => "description",
        }
    }

    /// Accepted source keys in priority order. The wire name always comes first.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Code => &["code", "course_code", "courseCode", "coursecode", "subject_code", "subjectCode"],
            Self::Name => &["name", "course_name", "courseName", "subject_name", "subjectName", "title"],
            Self::Credits => &["credits", "credit", "credit_hours", "creditHours", "units"],
            Self::SubjectType => &["type", "subject_type", "subjectType", "course_type", "courseType", "category"],
            Self::IsElective => &["isElective", "is_elective", "elective", "optional"],
            Self::RegulationId => &["regulationId", "regulation_id", "regulation"],
            Self::DepartmentId => &["departmentId", "department_id", "department", "dept_id", "deptId", "dept"],
            Self::Semester => &["semester", "semester_number", "semesterNumber", "semester_no", "sem"],
            Self::Number => &["number", "semester_number", "semesterNumber", "semester_no", "semester", "sem", "no"],
            Self::MandatoryCount => &["mandatoryCount", "mandatory_count", "mandatory", "core_count", "coreCount"],
            Self::ElectiveCount => &["electiveCount", "elective_count", "electives"],
            Self::Description => &["description", "desc", "notes", "remarks"],
        }
    }
}

const SUBJECT_FIELDS: &[CanonicalField] = &[
    CanonicalField::Code,
    CanonicalField::Name,
    CanonicalField::Credits,
    CanonicalField::SubjectType,
    CanonicalField::IsElective,
    CanonicalField::RegulationId,
    CanonicalField::DepartmentId,
    CanonicalField::Semester,
];

const SEMESTER_FIELDS: &[CanonicalField] = &[
    CanonicalField::RegulationId,
    CanonicalField::DepartmentId,
    CanonicalField::Number,
    CanonicalField::MandatoryCount,
    CanonicalField::ElectiveCount,
    CanonicalField::Description,
];

static SUBJECT_TABLE: Lazy<AliasTable> = Lazy::new(|| AliasTable::build(TargetSchema::Subjects));
static SEMESTER_TABLE: Lazy<AliasTable> = Lazy::new(|| AliasTable::build(TargetSchema::Semesters));

/// Case-folded, de-duplicated aliases for every field of one schema.
#[derive(Debug)]
pub struct AliasTable {
    schema: TargetSchema,
    entries: Vec<(CanonicalField, Vec<String>)>,
}

impl AliasTable {
    pub fn for_schema(schema: TargetSchema) -> &'static AliasTable {
        match schema {
            TargetSchema::Subjects => &SUBJECT_TABLE,
            TargetSchema::Semesters => &SEMESTER_TABLE,
        }
    }

    fn build(schema: TargetSchema) -> Self {
        let fields = match schema {
            TargetSchema::Subjects => SUBJECT_FIELDS,
            TargetSchema::Semesters => SEMESTER_FIELDS,
        };

        let entries = fields
            .iter()
            .map(|&field| {
                let mut folded: Vec<String> = Vec::new();
                for alias in field.aliases() {
                    let lower = alias.to_lowercase();
                    if !folded.contains(&lower) {
                        folded.push(lower);
                    }
                }
                (field, folded)
            })
            .collect();

        Self { schema, entries }
    }

    pub fn schema(&self) -> TargetSchema {
        self.schema
    }

    pub fn fields(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        self.entries.iter().map(|(field, _)| *field)
    }

    /// Folded aliases of `field`, empty when the field is not part of this schema.
    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, aliases)| aliases.as_slice())
            .unwrap_or(&[])
    }

    /// First alias of `field` present in the record.
    pub fn resolve<'r>(&self, field: CanonicalField, index: &KeyIndex<'r>) -> Option<Resolved<'r>> {
        self.aliases(field).iter().find_map(|alias| index.get(alias))
    }
}

/// A matched source column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'r> {
    /// Key as written in the source.
    pub source_key: &'r str,
    pub value: &'r Value,
}

/// Case-folded view over a record's keys, built once per record.
///
/// When two keys differ only by case, the first in record order wins.
#[derive(Debug)]
pub struct KeyIndex<'r> {
    by_folded: HashMap<String, Resolved<'r>>,
}

impl<'r> KeyIndex<'r> {
    pub fn new(record: &'r RawRecord) -> Self {
        let mut by_folded = HashMap::with_capacity(record.len());
        for (key, value) in &record.fields {
            by_folded.entry(key.to_lowercase()).or_insert(Resolved {
                source_key: key.as_str(),
                value,
            });
        }
        Self { by_folded }
    }

    pub fn get(&self, folded_key: &str) -> Option<Resolved<'r>> {
        self.by_folded.get(folded_key).copied()
    }
}

/// Human-readable alias listing, one line per field.
pub fn describe_aliases(schema: TargetSchema) -> String {
    let table = AliasTable::for_schema(schema);
    let mut out = format!("{} fields (first matching column wins):\n", schema);
    for field in table.fields() {
        out.push_str(&format!("  {:<15} <- {}\n", field.name(), field.aliases().join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => RawRecord::untagged(map),
            _ => RawRecord::untagged(Map::new()),
        }
    }

    #[test]
    fn test_aliases_folded_and_deduplicated() {
        let table = AliasTable::for_schema(TargetSchema::Subjects);
        let code = table.aliases(CanonicalField::Code);

        assert_eq!(code[0], "code");
        assert_eq!(code.iter().filter(|a| *a == "coursecode").count(), 1);
    }

    #[test]
    fn test_field_outside_schema_has_no_aliases() {
        let table = AliasTable::for_schema(TargetSchema::Semesters);
        assert!(table.aliases(CanonicalField::Code).is_empty());
    }

    #[test]
    fn test_priority_beats_record_order() {
        // course_code appears first in the record but `code` has priority
        let rec = record(json!({"course_code": "X1", "code": "CS101"}));
        let index = KeyIndex::new(&rec);
        let table = AliasTable::for_schema(TargetSchema::Subjects);

        let hit = table.resolve(CanonicalField::Code, &index).unwrap();
        assert_eq!(hit.source_key, "code");
        assert_eq!(hit.value, "CS101");
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let rec = record(json!({"CourseCode": "CS101", "IS_ELECTIVE": "yes"}));
        let index = KeyIndex::new(&rec);
        let table = AliasTable::for_schema(TargetSchema::Subjects);

        assert_eq!(table.resolve(CanonicalField::Code, &index).unwrap().source_key, "CourseCode");
        assert_eq!(table.resolve(CanonicalField::IsElective, &index).unwrap().value, "yes");
        assert!(table.resolve(CanonicalField::Credits, &index).is_none());
    }

    #[test]
    fn test_first_key_wins_on_case_collision() {
        let rec = record(json!({"Code": "FIRST", "CODE": "SECOND"}));
        let index = KeyIndex::new(&rec);
        assert_eq!(index.get("code").unwrap().value, "FIRST");
    }

    #[test]
    fn test_semester_schema_reads_semester_column_as_number() {
        let rec = record(json!({"semester": 3}));
        let index = KeyIndex::new(&rec);
        let table = AliasTable::for_schema(TargetSchema::Semesters);
        assert_eq!(table.resolve(CanonicalField::Number, &index).unwrap().value, 3);
    }

    #[test]
    fn test_describe_aliases() {
        let text = describe_aliases(TargetSchema::Semesters);
        assert!(text.starts_with("semesters fields"));
        assert!(text.contains("mandatoryCount"));
    }
}
