//! Percent escaping for payloads and parameter values.
//!
//! Only the RFC 2396 unreserved characters are kept as is:
//! `A-Z a-z 0-9 - _ . ! ~ * ' ( )`. Every other byte is written as `%XX`
//! with uppercase hex digits, so escaped text never contains `;`, `,`
//! or `"` and can sit anywhere inside a data URI.

use crate::error::{Error, Result};
use std::fmt::Write as _;

/// Check whether a byte can be written without escaping
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(byte, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

/// Escapes arbitrary bytes into URI-safe ASCII.
#[must_use]
pub fn escape(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len());
    for &byte in data {
        if is_unreserved(byte) {
            result.push(byte as char);
        } else {
            let _ = write!(result, "%{byte:02X}");
        }
    }
    result
}

/// Decodes `%XX` triplets back into bytes.
///
/// Bytes outside escape sequences are copied literally.
///
/// # Errors
///
/// Returns [`Error::Escape`] if a `%` is not followed by two hex digits.
pub fn unescape(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut pos = 0;

    while pos < bytes.len() {
        let byte = bytes[pos];
        if byte != b'%' {
            result.push(byte);
            pos += 1;
            continue;
        }

        let high = bytes.get(pos + 1).copied().and_then(hex_value);
        let low = bytes.get(pos + 2).copied().and_then(hex_value);
        match (high, low) {
            (Some(high), Some(low)) => {
                result.push((high << 4) | low);
                pos += 3;
            }
            _ => return Err(Error::Escape { offset: pos }),
        }
    }

    Ok(result)
}

/// Like [`unescape`], but the result must be valid UTF-8.
///
/// # Errors
///
/// Returns [`Error::Escape`] for a malformed escape and [`Error::Utf8`]
/// when the decoded bytes are not UTF-8.
pub fn unescape_to_string(text: &str) -> Result<String> {
    Ok(String::from_utf8(unescape(text)?)?)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
