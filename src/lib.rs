//! # emx-datauri
//!
//! Data URI ([RFC 2397](https://www.rfc-editor.org/rfc/rfc2397)) parsing and encoding.
//!
//! ## Format
//!
//! A data URI embeds a payload and its media type in a single string:
//!
//! ```text
//! data:[<type>/<subtype>][;<attribute>=<value>]*[;base64],<data>
//! ```
//!
//! - Without a media type, `text/plain;charset=US-ASCII` is assumed.
//! - Parameter values are either percent-escaped tokens or quoted strings
//!   with backslash escapes.
//! - `;base64` right before the comma selects base64 for the payload,
//!   otherwise the payload is percent-escaped ASCII.
//!
//! ## Decoding
//!
//! ```rust
//! let uri = emx_datauri::decode("data:text/plain;charset=utf-8;base64,aGV5YQ==")?;
//! assert_eq!(uri.content_type(), "text/plain");
//! assert_eq!(uri.param("charset"), Some("utf-8"));
//! assert_eq!(uri.data, b"heya");
//! # Ok::<(), emx_datauri::Error>(())
//! ```
//!
//! ## Encoding
//!
//! Output is canonical rather than a copy of any original text: parameters
//! are sorted by key and their values are always percent-escaped, never
//! quoted.
//!
//! ```rust
//! use emx_datauri::DataUri;
//!
//! let uri = DataUri::new(r#"{"msg": "heya"}"#, "application/json", &[]);
//! assert_eq!(uri.to_string(), "data:application/json;base64,eyJtc2ciOiAiaGV5YSJ9");
//!
//! let sniffed = emx_datauri::auto_encode(b"A brief note");
//! assert_eq!(sniffed, "data:text/plain;charset=utf-8;base64,QSBicmllZiBub3Rl");
//! ```

pub mod datauri;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod escape;
pub mod lexer;
pub mod sniff;

pub use datauri::{DataUri, Encoding, MediaType};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{ConstructError, Error, Result};
pub use escape::{escape, unescape, unescape_to_string};
pub use lexer::{Lexer, Token, TokenKind};
pub use sniff::detect_content_type;

/// Decode a data URI string
pub fn decode(input: &str) -> Result<DataUri> {
    Decoder::new().decode(input)
}

/// Read a data URI from `reader` and decode it
pub fn decode_reader<R: std::io::Read>(reader: R) -> Result<DataUri> {
    Decoder::new().decode_reader(reader)
}

/// Render a data URI in canonical form
pub fn encode(uri: &DataUri) -> String {
    Encoder::new().encode(uri)
}

/// Base64-encode `data` with a sniffed media type.
///
/// The sniffer writes parameters as `type/subtype; key=value`; the space is
/// dropped since the canonical form never has one.
pub fn auto_encode(data: &[u8]) -> String {
    let sniffed = detect_content_type(data).replace("; ", ";");

    let mut parts = sniffed.split(';');
    let media_type = parts.next().unwrap_or(sniff::OCTET_STREAM);
    let params: Vec<&str> = parts
        .flat_map(|param| {
            let (key, value) = param.split_once('=').unwrap_or((param, ""));
            [key, value]
        })
        .collect();

    // Sniffer output is always well formed
    match DataUri::try_new(data, media_type, &params) {
        Ok(uri) => encode(&uri),
        Err(err) => unreachable!("sniffer produced {sniffed:?}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    #[test]
    fn test_auto_encode_text() {
        assert_eq!(
            auto_encode(b"A brief note"),
            "data:text/plain;charset=utf-8;base64,QSBicmllZiBub3Rl"
        );
    }

    #[test]
    fn test_auto_encode_binary() {
        assert_eq!(
            auto_encode(&[0x0A, 0xFF, 0x99, 0x34, 0x56, 0x34, 0x00]),
            "data:application/octet-stream;base64,Cv+ZNFY0AA=="
        );
    }

    #[test]
    fn test_auto_encode_png() {
        let png = b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR\x00\x00\x00\x01";
        let encoded = auto_encode(png);

        assert!(encoded.starts_with("data:image/png;base64,"));
        assert_eq!(decode(&encoded).unwrap().data, png);
    }

    #[test]
    fn test_auto_encode_favicon() {
        let favicon = "AAABAAEAEBAAAAEAIABoBAAAFgAAACgAAAAQAAAAIAAAAAEAIAAAAAAAAAAAAAAAAAAAAAAAAAAA";
        let data = base64::engine::general_purpose::STANDARD.decode(favicon).unwrap();

        assert_eq!(auto_encode(&data), format!("data:image/x-icon;base64,{favicon}"));
    }

    #[test]
    fn test_auto_encode_round_trips_params() {
        let uri = decode(&auto_encode(b"<html><body>hi</body></html>")).unwrap();

        assert_eq!(uri.content_type(), "text/html");
        assert_eq!(uri.param("charset"), Some("utf-8"));
        assert_eq!(uri.encoding, Encoding::Base64);
    }

    #[test]
    fn test_decode_then_encode() {
        let uri = decode("data:,A%20brief%20note").unwrap();
        assert_eq!(uri.data, b"A brief note");
        assert_eq!(encode(&uri), "data:text/plain;charset=US-ASCII,A%20brief%20note");
    }

    #[test]
    fn test_decode_reader_helper() {
        let uri = decode_reader("data:;base64,aGV5YQ==".as_bytes()).unwrap();
        assert_eq!(uri.media_type, MediaType::default());
        assert_eq!(uri.data, b"heya");
    }

    #[test]
    fn test_encode_matches_base64_of_payload() {
        let payload = b"\x00\x01binary\xFE\xFF";
        let uri = DataUri::new(payload.to_vec(), "application/json", &[]);
        let expected = format!(
            "data:application/json;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(payload)
        );
        assert_eq!(encode(&uri), expected);
    }
}
