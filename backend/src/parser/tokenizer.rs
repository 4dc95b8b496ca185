//! Quote-aware splitting shared by the SQL and CSV parsers.
//!
//! Separators only count outside quoted runs. A run opens only when `'` or
//! `"` is the first non-blank character of a field, so an apostrophe inside
//! bare text (`Women's Studies`) is literal. Inside a run, a doubled quote
//! character is a literal quote and does not close it.

/// One value from a `VALUES (...)` list or a CSV line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Unquoted text with doubled quotes collapsed.
    pub text: String,
    /// Whether the value was written as a quoted literal.
    pub quoted: bool,
}

impl Token {
    /// Build a token from a raw slice as returned by [`split_top_level`].
    ///
    /// A slice that does not both start and end with the same quote
    /// character is kept verbatim (trimmed) as a bare token.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        let mut chars = trimmed.chars();

        if let (Some(first), Some(last)) = (chars.next(), chars.next_back()) {
            if (first == '\'' || first == '"') && first == last {
                let inner = &trimmed[1..trimmed.len() - 1];
                let doubled: String = [first, first].iter().collect();
                return Self {
                    text: inner.replace(&doubled, &first.to_string()),
                    quoted: true,
                };
            }
        }

        Self {
            text: trimmed.to_string(),
            quoted: false,
        }
    }
}

/// Split `input` on `separator` wherever it appears outside a quoted run.
///
/// Returned slices are untrimmed and still carry their quotes. A trailing
/// piece with no terminating separator is always emitted, so `"a,b,"`
/// yields `["a", "b", ""]`. An unterminated quote swallows the rest of the
/// input into the last piece.
pub fn split_top_level(input: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut active_quote: Option<char> = None;
    // Only blanks seen since the last separator
    let mut at_field_start = true;
    let mut chars = input.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match active_quote {
            Some(q) if ch == q => {
                if chars.peek().map(|&(_, next)| next) == Some(q) {
                    // Doubled quote: literal, run stays open
                    chars.next();
                } else {
                    active_quote = None;
                }
            }
            Some(_) => {}
            None if ch == separator => {
                pieces.push(&input[start..idx]);
                start = idx + ch.len_utf8();
                at_field_start = true;
            }
            None if at_field_start && (ch == '\'' || ch == '"') => {
                active_quote = Some(ch);
                at_field_start = false;
            }
            None if ch.is_whitespace() => {}
            None => at_field_start = false,
        }
    }

    pieces.push(&input[start..]);
    pieces
}

/// Split a value list into tokens, keeping the quoted/bare distinction.
pub fn scan_tokens(value_list: &str) -> Vec<Token> {
    split_top_level(value_list, ',')
        .into_iter()
        .map(Token::from_raw)
        .collect()
}

/// Split the inside of a `VALUES (...)` clause into unquoted value texts.
///
/// # Example
/// ```
/// use curriculum_ingest::parser::tokenize;
///
/// let tokens = tokenize("'CS101', 'Hello, World', 'O''Brien', 3");
/// assert_eq!(tokens, vec!["CS101", "Hello, World", "O'Brien", "3"]);
/// ```
pub fn tokenize(value_list: &str) -> Vec<String> {
    scan_tokens(value_list).into_iter().map(|t| t.text).collect()
}
