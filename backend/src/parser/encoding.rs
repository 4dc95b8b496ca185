//! Byte input decoding for uploaded files.
//!
//! Operators export from spreadsheets and old admin tools, so files arrive
//! as UTF-8 (with or without BOM), Latin-1 or Windows-1252.

use encoding_rs::Encoding;
use std::path::Path;

/// Decoded text and the encoding that was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: String,
}

/// Guess the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes with the given label. Unknown labels fall back to lossy UTF-8.
pub fn decode_with(bytes: &[u8], label: &str) -> DecodedText {
    let encoding = Encoding::for_label(label.as_bytes()).unwrap_or(encoding_rs::UTF_8);
    // decode() sniffs and strips a BOM, overriding the label when one is present
    let (text, used, _had_errors) = encoding.decode(bytes);

    DecodedText {
        text: text.into_owned(),
        encoding: used.name().to_lowercase(),
    }
}

/// Detect and decode in one step.
pub fn decode_input(bytes: &[u8]) -> DecodedText {
    let label = detect_encoding(bytes);
    decode_with(bytes, &label)
}

/// Read and decode a file.
pub fn read_input_file<P: AsRef<Path>>(path: P) -> std::io::Result<DecodedText> {
    let bytes = std::fs::read(path.as_ref())?;
    Ok(decode_input(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_plain_utf8() {
        let decoded = decode_input("code,name\nCS101,Intro".as_bytes());
        assert_eq!(decoded.text, "code,name\nCS101,Intro");
        assert_eq!(decoded.encoding, "utf-8");
    }

    #[test]
    fn test_bom_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"code,name");
        let decoded = decode_with(&bytes, "utf-8");
        assert_eq!(decoded.text, "code,name");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Génie" in ISO-8859-1
        let bytes: &[u8] = &[0x47, 0xE9, 0x6E, 0x69, 0x65];
        let decoded = decode_with(bytes, "iso-8859-1");
        assert_eq!(decoded.text, "Génie");
    }

    #[test]
    fn test_unknown_label_falls_back() {
        let decoded = decode_with(b"abc", "no-such-charset");
        assert_eq!(decoded.text, "abc");
        assert_eq!(decoded.encoding, "utf-8");
    }

    #[test]
    fn test_read_input_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"code\": \"CS101\"}}").unwrap();

        let decoded = read_input_file(file.path()).unwrap();
        assert_eq!(decoded.text, "{\"code\": \"CS101\"}");
    }
}
