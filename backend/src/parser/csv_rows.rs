//! Header-keyed CSV rows.
//!
//! Line-based: a quoted field cannot span lines. Values stay strings, type
//! coercion happens in the field mapper.

use serde_json::{Map, Value};

use super::tokenizer::{split_top_level, Token};
use crate::error::{ParseError, ParseResult};
use crate::models::RawRecord;

/// Split one CSV line into trimmed, de-quoted cells.
pub fn split_csv_line(line: &str) -> Vec<String> {
    split_top_level(line, ',')
        .into_iter()
        .map(|cell| Token::from_raw(cell).text)
        .collect()
}

/// Parse CSV text into one record per data line.
///
/// Blank lines are skipped. Short rows map trailing headers to `""`,
/// cells beyond the header width are dropped.
///
/// # Example
/// ```
/// use curriculum_ingest::parser::parse_csv;
///
/// let rows = parse_csv("code,name\nCS101,\"Intro, to CS\"").unwrap();
/// assert_eq!(rows[0].fields["name"], "Intro, to CS");
/// ```
pub fn parse_csv(text: &str) -> ParseResult<Vec<RawRecord>> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty());

    let Some((header_idx, header_line)) = lines.next() else {
        return Ok(Vec::new());
    };
    let headers = parse_header(header_line, header_idx + 1)?;

    let rows = lines
        .map(|(_, line)| {
            let cells = split_csv_line(line);
            let fields: Map<String, Value> = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = cells.get(i).cloned().unwrap_or_default();
                    (header.clone(), Value::String(value))
                })
                .collect();
            RawRecord::untagged(fields)
        })
        .collect();

    Ok(rows)
}

fn parse_header(line: &str, line_num: usize) -> ParseResult<Vec<String>> {
    let headers = split_csv_line(line);

    if headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::malformed_csv(line_num, "header has no column names"));
    }

    for (i, header) in headers.iter().enumerate() {
        if headers[..i].contains(header) {
            let message = if header.is_empty() {
                "more than one empty column name in header".to_string()
            } else {
                format!("duplicate column '{}' in header", header)
            };
            return Err(ParseError::malformed_csv(line_num, message));
        }
    }

    Ok(headers)
}
