//! `INSERT INTO ... VALUES (...)` extraction.
//!
//! Only single-row inserts with an explicit column list are understood.
//! Anything else is skipped silently; the caller gets
//! [`ParseError::NoStatementsFound`] when nothing at all matched.
//!
//! A multi-row insert (`VALUES (...), (...)`) is skipped as a whole rather
//! than read as one garbled row. Split it into one statement per row.
//!
//! `--` comments run to the end of the line and are dropped wherever they
//! appear outside a string literal.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};

use super::tokenizer::{scan_tokens, Token};
use crate::error::{ParseError, ParseResult};
use crate::models::RawRecord;

static INSERT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)^INSERT\s+INTO\s+([`"\[\]\w.]+)\s*\(([^)]*)\)\s*VALUES\s*\((.*)\)$"#,
    )
    .expect("valid INSERT pattern")
});

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid number pattern"));

/// One matched statement, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Lowercased, identifier quotes removed.
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Token>,
}

impl InsertStatement {
    /// Zip columns with coerced values. The shorter side wins.
    pub fn into_record(self) -> RawRecord {
        let fields: Map<String, Value> = self
            .columns
            .into_iter()
            .zip(self.values.iter().map(coerce_token))
            .collect();
        RawRecord::tagged(self.table, fields)
    }
}

/// Split text into statements on `;` outside quoted strings.
///
/// `--` comments outside strings are removed. A quote opens a string only
/// when it does not follow a word character, so `O'Brien` stays bare.
/// Blank statements are dropped.
pub fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut active_quote: Option<char> = None;
    let mut prev: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match active_quote {
            Some(q) => {
                current.push(ch);
                if ch == q {
                    if chars.peek() == Some(&q) {
                        current.push(q);
                        chars.next();
                    } else {
                        active_quote = None;
                    }
                }
            }
            None if ch == '-' && chars.peek() == Some(&'-') => {
                // Comment: skip to end of line, keep the line break
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        current.push('\n');
                        break;
                    }
                }
            }
            None if ch == ';' => push_statement(&mut statements, &mut current),
            None if (ch == '\'' || ch == '"') && !prev.is_some_and(is_word_char) => {
                active_quote = Some(ch);
                current.push(ch);
            }
            None => current.push(ch),
        }
        prev = Some(ch);
    }

    push_statement(&mut statements, &mut current);
    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
    current.clear();
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Match a single statement. Returns `None` for anything that is not a
/// single-row `INSERT` with a column list.
pub fn parse_statement(statement: &str) -> Option<InsertStatement> {
    let caps = INSERT_RE.captures(statement.trim())?;

    let table = strip_identifier(&caps[1]).to_lowercase();
    let columns = caps[2]
        .split(',')
        .map(strip_identifier)
        .filter(|c| !c.is_empty())
        .collect();
    let values = scan_tokens(&caps[3]);

    if has_row_boundary(&values) {
        return None;
    }

    Some(InsertStatement {
        table,
        columns,
        values,
    })
}

/// True when the value list closes one row and opens another, as in
/// `(1, 'a'), (2, 'b')`.
fn has_row_boundary(values: &[Token]) -> bool {
    values.windows(2).any(|pair| {
        !pair[0].quoted && !pair[1].quoted && pair[0].text.ends_with(')') && pair[1].text.starts_with('(')
    })
}

/// Extract every `INSERT` row from pasted SQL.
///
/// # Example
/// ```
/// use curriculum_ingest::parser::parse_inserts;
///
/// let rows = parse_inserts("INSERT INTO subjects (code, credits) VALUES ('CS101', 3);").unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].table.as_deref(), Some("subjects"));
/// assert_eq!(rows[0].fields["credits"], 3);
/// ```
pub fn parse_inserts(text: &str) -> ParseResult<Vec<RawRecord>> {
    let statements = split_statements(text);

    let records: Vec<RawRecord> = statements
        .iter()
        .filter_map(|s| parse_statement(s))
        .map(InsertStatement::into_record)
        .collect();

    if records.is_empty() {
        return Err(ParseError::NoStatementsFound {
            scanned: statements.len(),
        });
    }

    Ok(records)
}

/// Type a literal by its syntactic form.
pub fn coerce_token(token: &Token) -> Value {
    if token.quoted {
        return Value::String(token.text.clone());
    }

    let text = token.text.as_str();
    if text.eq_ignore_ascii_case("null") {
        return Value::Null;
    }

    if NUMBER_RE.is_match(text) {
        if let Some(n) = parse_number(text) {
            return Value::Number(n);
        }
    }

    Value::String(text.to_string())
}

fn parse_number(text: &str) -> Option<Number> {
    if !text.contains('.') {
        if let Ok(i) = text.parse::<i64>() {
            return Some(Number::from(i));
        }
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn strip_identifier(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '`' | '[' | ']' | '"'))
        .collect()
}
