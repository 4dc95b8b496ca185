//! JSON input normalization.

use serde_json::Value;

use crate::error::{ParseError, ParseResult};
use crate::models::RawRecord;

/// Parse JSON text into a list of records.
///
/// An array yields one record per element, a single object yields a
/// one-element list. Scalars, and arrays containing non-objects, are
/// rejected with [`ParseError::InvalidJson`].
pub fn parse_json(text: &str) -> ParseResult<Vec<RawRecord>> {
    let value: Value = serde_json::from_str(text.trim())?;

    match value {
        Value::Object(map) => Ok(vec![RawRecord::untagged(map)]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Ok(RawRecord::untagged(map)),
                other => Err(ParseError::invalid_json(format!(
                    "element {} is {}, expected an object",
                    i,
                    json_kind(&other)
                ))),
            })
            .collect(),
        other => Err(ParseError::invalid_json(format!(
            "expected an object or an array of objects, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_object_wrapped() {
        let rows = parse_json(r#"{"code":"CS101"}"#).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(Value::Object(rows[0].fields.clone()), json!({"code": "CS101"}));
        assert!(rows[0].table.is_none());
    }

    #[test]
    fn test_array_kept_in_order() {
        let rows = parse_json(r#"[{"code":"B"},{"code":"A","credits":4,"isElective":true}]"#).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields["code"], "B");
        assert_eq!(rows[1].fields["credits"], 4);
        assert_eq!(rows[1].fields["isElective"], true);
    }

    #[test]
    fn test_empty_array() {
        assert!(parse_json("[]").unwrap().is_empty());
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_json(r#"{"code": "CS101""#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }

    #[test]
    fn test_scalar_rejected() {
        let err = parse_json("42").unwrap_err();
        assert_eq!(
            err,
            ParseError::invalid_json("expected an object or an array of objects, found a number")
        );
    }

    #[test]
    fn test_non_object_element_rejected() {
        let err = parse_json(r#"[{"code":"A"}, "B"]"#).unwrap_err();
        assert!(err.to_string().contains("element 1 is a string"));
    }
}
