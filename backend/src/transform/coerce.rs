//! Loose value coercion for mapped fields.
//!
//! Source values may be strings (CSV), typed literals (SQL) or any JSON
//! scalar. Coercion never fails; callers pass the fallback.

use serde_json::Value;

/// Parse a value as a finite number.
///
/// Numbers pass through, strings are trimmed and parsed, booleans count as
/// 1/0. Empty strings, null and containers give `None`.
pub fn to_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    n.filter(|n| n.is_finite())
}

/// Integer coercion, truncating toward zero.
pub fn to_int(value: Option<&Value>, fallback: i64) -> i64 {
    to_number(value).map(|n| n.trunc() as i64).unwrap_or(fallback)
}

/// `"1"`, `"true"`, `"yes"` (any case), numeric 1 and `true` are true.
pub fn to_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes")
        }
        _ => false,
    }
}

/// Trimmed text. Null and containers become the empty string.
pub fn to_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Like [`to_text`] but empty text is `None`.
pub fn to_optional_text(value: Option<&Value>) -> Option<String> {
    Some(to_text(value)).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bool_truthy_inputs() {
        for input in [json!("1"), json!("true"), json!("YES"), json!(1), json!(true), json!(" Yes ")] {
            assert!(to_bool(Some(&input)), "{} should be true", input);
        }
    }

    #[test]
    fn test_bool_falsy_inputs() {
        for input in [json!("0"), json!("false"), json!(""), json!(null), json!(0), json!("y"), json!(2)] {
            assert!(!to_bool(Some(&input)), "{} should be false", input);
        }
        assert!(!to_bool(None));
    }

    #[test]
    fn test_number_parsing() {
        assert_eq!(to_number(Some(&json!(3))), Some(3.0));
        assert_eq!(to_number(Some(&json!(" 4.5 "))), Some(4.5));
        assert_eq!(to_number(Some(&json!("-2"))), Some(-2.0));
        assert_eq!(to_number(Some(&json!(true))), Some(1.0));
        assert_eq!(to_number(Some(&json!(""))), None);
        assert_eq!(to_number(Some(&json!("three"))), None);
        assert_eq!(to_number(Some(&json!("inf"))), None);
        assert_eq!(to_number(Some(&json!(null))), None);
        assert_eq!(to_number(None), None);
    }

    #[test]
    fn test_int_fallback_and_truncation() {
        assert_eq!(to_int(Some(&json!("3.9")), 0), 3);
        assert_eq!(to_int(Some(&json!("n/a")), 7), 7);
        assert_eq!(to_int(None, -1), -1);
    }

    #[test]
    fn test_text() {
        assert_eq!(to_text(Some(&json!("  Intro  "))), "Intro");
        assert_eq!(to_text(Some(&json!(101))), "101");
        assert_eq!(to_text(Some(&json!(null))), "");
        assert_eq!(to_optional_text(Some(&json!("   "))), None);
        assert_eq!(to_optional_text(Some(&json!("Fall"))), Some("Fall".to_string()));
    }
}
