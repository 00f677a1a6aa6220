//! Encoding detection and transcoding for byte input.
//!
//! XML read from files or stdin arrives as bytes. Before the reader sees it,
//! the bytes are turned into UTF-8 text:
//!
//! 1. A byte order mark, if present, selects UTF-8 or one of the UTF-16 forms.
//! 2. Without a BOM the input is assumed to be UTF-8.
//! 3. The `encoding=` pseudo-attribute of the XML declaration may override
//!    that guess; `encoding_rs` performs the actual conversion.

use std::fmt;

use tracing::debug;

/// An error that occurs during encoding detection or transcoding.
#[derive(Debug, Clone)]
pub struct EncodingError {
    /// A human-readable description of the encoding error.
    pub message: String,
}

impl EncodingError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding error: {}", self.message)
    }
}

impl std::error::Error for EncodingError {}

/// Inspects the byte order mark at the start of `bytes`.
///
/// Returns the encoding label and the number of BOM bytes to skip.
///
/// ```
/// use xml2doc::encoding::detect_encoding;
///
/// assert_eq!(detect_encoding(b"\xEF\xBB\xBF<a/>"), ("UTF-8", 3));
/// assert_eq!(detect_encoding(b"\xFF\xFE<\x00"), ("UTF-16LE", 2));
/// assert_eq!(detect_encoding(b"<a/>"), ("UTF-8", 0));
/// ```
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static str, usize) {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => ("UTF-8", 3),
        [0xFE, 0xFF, ..] => ("UTF-16BE", 2),
        [0xFF, 0xFE, ..] => ("UTF-16LE", 2),
        _ => ("UTF-8", 0),
    }
}

/// Transcodes `bytes` from the encoding named by `label` into UTF-8.
///
/// # Errors
///
/// Returns `EncodingError` if `encoding_rs` does not know the label or the
/// input contains malformed sequences for it.
pub fn transcode(bytes: &[u8], label: &str) -> Result<String, EncodingError> {
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {label}")))?;

    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::new(format!(
            "malformed byte sequence for encoding {label}"
        )));
    }
    Ok(text.into_owned())
}

/// Decodes raw XML bytes into a UTF-8 string, detecting the encoding.
///
/// # Errors
///
/// Returns `EncodingError` if the bytes are invalid for the detected encoding
/// or the declared encoding is unsupported.
///
/// ```
/// use xml2doc::encoding::decode_to_utf8;
///
/// let text = decode_to_utf8(b"<?xml version=\"1.0\"?><root/>").unwrap();
/// assert!(text.ends_with("<root/>"));
/// ```
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String, EncodingError> {
    let (bom_label, bom_len) = detect_encoding(bytes);
    let content = &bytes[bom_len..];

    if bom_label == "UTF-8" {
        // The declaration is ASCII-compatible here, so it can be read off the
        // raw bytes before deciding how to decode the rest.
        if let Some(declared) = declared_encoding(content) {
            if !is_utf8_label(&declared) {
                debug!(encoding = %declared, "transcoding declared encoding");
                return transcode(content, &declared);
            }
        }
        return std::str::from_utf8(content)
            .map(str::to_string)
            .map_err(|_| EncodingError::new("input is not valid UTF-8"));
    }

    let text = transcode(content, bom_label)?;
    if let Some(declared) = declared_encoding(text.as_bytes()) {
        let declared_upper = declared.to_ascii_uppercase();
        let same = declared_upper == bom_label
            || (declared_upper == "UTF-16" && bom_label.starts_with("UTF-16"));
        if !same {
            debug!(bom = bom_label, encoding = %declared, "declaration overrides BOM");
            return transcode(content, &declared);
        }
    }
    Ok(text)
}

/// Reads the `encoding` pseudo-attribute from a leading XML declaration.
///
/// Only the first 200 bytes are scanned; the declaration must be ASCII.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(200)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let decl_end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..decl_end];

    let needle = b"encoding";
    let pos = decl.windows(needle.len()).position(|w| w == needle)?;
    let rest = trim_ascii_start(&decl[pos + needle.len()..]);
    let rest = trim_ascii_start(rest.strip_prefix(b"=")?);

    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = rest.iter().position(|&b| b == quote)?;
    let label = &rest[..end];
    label
        .is_ascii()
        .then(|| String::from_utf8_lossy(label).into_owned())
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    &bytes[skip..]
}

fn is_utf8_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("UTF-8") || label.eq_ignore_ascii_case("UTF8")
}
