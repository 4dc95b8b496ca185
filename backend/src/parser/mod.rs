//! Format parsers for pasted curriculum data.
//!
//! Each parser turns text into [`RawRecord`]s. No schema knowledge lives
//! here; field names are kept exactly as written.
//!
//! - [`tokenizer`] - Quote-aware splitting of value lists
//! - [`sql`] - `INSERT INTO ... VALUES (...)` statements
//! - [`csv_rows`] - Header + data lines
//! - [`json`] - Object or array of objects
//! - [`encoding`] - Byte decoding for uploaded files

pub mod csv_rows;
pub mod encoding;
pub mod json;
pub mod sql;
pub mod tokenizer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ParseError, ParseResult};
use crate::models::RawRecord;

pub use csv_rows::{parse_csv, split_csv_line};
pub use encoding::{decode_input, detect_encoding, read_input_file, DecodedText};
pub use json::parse_json;
pub use sql::{coerce_token, parse_inserts, parse_statement, split_statements, InsertStatement};
pub use tokenizer::{scan_tokens, split_top_level, tokenize, Token};

/// Input format of pasted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Pick from the text itself, see [`detect_format`].
    #[default]
    Auto,
    Sql,
    Csv,
    Json,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Sql => "sql",
            Self::Csv => "csv",
            Self::Json => "json",
        })
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "sql" => Ok(Self::Sql),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown input format '{}'", other)),
        }
    }
}

/// Guess the format of pasted text. Never returns [`InputFormat::Auto`].
///
/// Text starting with `{` or `[` is JSON, text containing `INSERT INTO`
/// anywhere is SQL, everything else is CSV.
pub fn detect_format(text: &str) -> InputFormat {
    let trimmed = text.trim_start();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return InputFormat::Json;
    }

    let upper = text.to_uppercase();
    let has_insert = upper
        .match_indices("INSERT")
        .any(|(i, _)| upper[i + "INSERT".len()..].trim_start().starts_with("INTO"));
    if has_insert {
        return InputFormat::Sql;
    }

    InputFormat::Csv
}

/// Records extracted from one input, with the format actually used.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInput {
    pub format: InputFormat,
    pub records: Vec<RawRecord>,
}

/// Parse text with an explicit or detected format.
pub fn parse_text(text: &str, format: InputFormat) -> ParseResult<ParsedInput> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let format = match format {
        InputFormat::Auto => detect_format(text),
        explicit => explicit,
    };

    let records = match format {
        InputFormat::Sql => parse_inserts(text)?,
        InputFormat::Json => parse_json(text)?,
        InputFormat::Csv | InputFormat::Auto => parse_csv(text)?,
    };

    Ok(ParsedInput { format, records })
}
