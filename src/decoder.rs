//! Data URI decoder

use crate::datauri::{DataUri, Encoding, MediaType, CHARSET_PARAM};
use crate::error::{Error, Result};
use crate::escape::{unescape, unescape_to_string};
use crate::lexer::{Lexer, Token, TokenKind};
use base64::Engine;
use std::io::Read;

/// Decodes data URI strings
pub struct Decoder {
    // Currently stateless, kept as a struct to mirror `Encoder`
}

impl Decoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self {}
    }

    /// Decode a data URI from a string
    pub fn decode(&self, input: &str) -> Result<DataUri> {
        let mut parser = Parser::new();
        for token in Lexer::new(input) {
            tracing::trace!(kind = %token.kind, text = token.text, offset = token.offset, "token");
            if parser.accept(token)? {
                let uri = parser.finish();
                tracing::debug!(
                    content_type = %uri.content_type(),
                    encoding = %uri.encoding,
                    len = uri.data.len(),
                    "decoded data URI"
                );
                return Ok(uri);
            }
        }
        unreachable!("lexer stopped without an EOF or error token")
    }

    /// Read everything from `reader` and decode it
    pub fn decode_reader<R: Read>(&self, mut reader: R) -> Result<DataUri> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let text = String::from_utf8(buffer)?;
        self.decode(&text)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// In-progress decode of one token stream
struct Parser {
    uri: DataUri,
    current_attr: String,
    quoted: bool,
    payload: Option<Encoding>,
}

impl Parser {
    fn new() -> Self {
        Self {
            uri: DataUri {
                media_type: MediaType::default(),
                encoding: Encoding::Ascii,
                data: Vec::new(),
            },
            current_attr: String::new(),
            quoted: false,
            payload: None,
        }
    }

    /// Apply one token. Returns `Ok(true)` once the stream is complete.
    fn accept(&mut self, token: Token<'_>) -> Result<bool> {
        match token.kind {
            TokenKind::Error => {
                tracing::debug!(message = token.text, offset = token.offset, "lexer error");
                return Err(Error::Lex {
                    message: token.text.to_string(),
                    offset: token.offset,
                });
            }
            TokenKind::MediaType => {
                self.uri.media_type.type_ = token.text.to_string();
                self.uri.media_type.params.remove(CHARSET_PARAM);
            }
            TokenKind::MediaSubType => {
                self.uri.media_type.subtype = token.text.to_string();
            }
            TokenKind::ParamAttr => {
                self.current_attr = token.text.to_string();
            }
            TokenKind::LeftQuote => {
                self.quoted = true;
            }
            TokenKind::ParamVal => {
                let value = if std::mem::take(&mut self.quoted) {
                    unquote(token.text)?
                } else {
                    unescape_to_string(token.text)?
                };
                self.uri
                    .media_type
                    .params
                    .insert(std::mem::take(&mut self.current_attr), value);
            }
            TokenKind::Base64Marker => {
                self.uri.encoding = Encoding::Base64;
                self.payload = Some(Encoding::Base64);
            }
            TokenKind::DataComma => {
                self.payload.get_or_insert(Encoding::Ascii);
            }
            TokenKind::Data => {
                self.uri.data = match self.payload {
                    Some(Encoding::Base64) => {
                        base64::engine::general_purpose::STANDARD.decode(token.text)?
                    }
                    _ => unescape(token.text)?,
                };
            }
            TokenKind::Eof => return Ok(true),
            TokenKind::Prefix
            | TokenKind::MediaSep
            | TokenKind::ParamSemicolon
            | TokenKind::ParamEqual
            | TokenKind::RightQuote => {}
        }
        Ok(false)
    }

    fn finish(self) -> DataUri {
        self.uri
    }
}

/// Undo backslash quoting: `\x` stands for `x`
fn unquote(text: &str) -> Result<String> {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let escaped = chars
                .next()
                .ok_or_else(|| Error::Quote(format!("trailing backslash in '{text}'")))?;
            result.push(escaped);
        } else {
            result.push(ch);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_decode_default_media_type_base64() {
        let decoder = Decoder::new();
        let uri = decoder.decode("data:;base64,aGV5YQ==").unwrap();

        assert_eq!(uri.media_type, MediaType::default());
        assert_eq!(uri.param("charset"), Some("US-ASCII"));
        assert_eq!(uri.encoding, Encoding::Base64);
        assert_eq!(uri.data, b"heya");
    }

    #[test]
    fn test_decode_explicit_type_clears_charset() {
        let decoder = Decoder::new();
        let uri = decoder.decode("data:text/plain;base64,aGV5YQ==").unwrap();

        assert_eq!(uri.media_type, MediaType::new("text", "plain"));
        assert!(uri.media_type.params.is_empty());
        assert_eq!(uri.data, b"heya");
    }

    #[test]
    fn test_decode_charset() {
        let decoder = Decoder::new();
        let uri = decoder.decode("data:text/plain;charset=utf-8;base64,aGV5YQ==").unwrap();

        assert_eq!(uri.media_type.params, params(&[("charset", "utf-8")]));
        assert_eq!(uri.data, b"heya");
    }

    #[test]
    fn test_decode_multiple_params() {
        let decoder = Decoder::new();
        let uri = decoder
            .decode("data:text/plain;charset=utf-8;foo=bar;base64,aGV5YQ==")
            .unwrap();

        assert_eq!(uri.media_type.params, params(&[("charset", "utf-8"), ("foo", "bar")]));
        assert_eq!(uri.encoding, Encoding::Base64);
    }

    #[test]
    fn test_decode_quoted_and_escaped_params() {
        let input = r#"data:application/json;charset=utf-8;foo="b\"<@>\"r";style=unformatted%20json;base64,eyJtc2ciOiAiaGV5YSJ9"#;

        let decoder = Decoder::new();
        let uri = decoder.decode(input).unwrap();

        assert_eq!(uri.content_type(), "application/json");
        assert_eq!(
            uri.media_type.params,
            params(&[
                ("charset", "utf-8"),
                ("foo", r#"b"<@>"r"#),
                ("style", "unformatted json"),
            ])
        );
        assert_eq!(uri.data, br#"{"msg": "heya"}"#);
    }

    #[test]
    fn test_decode_invalid_media_type() {
        let decoder = Decoder::new();
        let err = decoder.decode("data:xxx;base64,aGV5YQ==").unwrap_err();

        assert!(matches!(err, Error::Lex { offset: 8, .. }));
        assert_eq!(err.to_string(), "invalid character for media type");
    }

    #[test]
    fn test_decode_empty_payload() {
        let decoder = Decoder::new();
        let uri = decoder.decode("data:,").unwrap();

        assert_eq!(uri.media_type, MediaType::default());
        assert_eq!(uri.encoding, Encoding::Ascii);
        assert!(uri.data.is_empty());
    }

    #[test]
    fn test_decode_empty_base64_payload() {
        let decoder = Decoder::new();
        let uri = decoder.decode("data:image/png;base64,").unwrap();

        assert_eq!(uri.encoding, Encoding::Base64);
        assert!(uri.data.is_empty());
    }

    #[test]
    fn test_decode_ascii_payload() {
        let decoder = Decoder::new();
        let uri = decoder.decode("data:,A%20brief%20note").unwrap();

        assert_eq!(uri.media_type, MediaType::default());
        assert_eq!(uri.encoding, Encoding::Ascii);
        assert_eq!(uri.data, b"A brief note");
    }

    #[test]
    fn test_decode_subtype_symbols() {
        let decoder = Decoder::new();
        let uri = decoder
            .decode("data:image/svg+xml-im.a.fake;base64,cGllLXN0b2NrX1RoaXJ0eQ==")
            .unwrap();

        assert_eq!(uri.media_type, MediaType::new("image", "svg+xml-im.a.fake"));
        assert_eq!(uri.data, b"pie-stock_Thirty");
    }

    #[test]
    fn test_decode_params_without_type_keep_charset() {
        let decoder = Decoder::new();
        let uri = decoder.decode("data:;foo=bar,x").unwrap();

        assert_eq!(uri.media_type.params, params(&[("charset", "US-ASCII"), ("foo", "bar")]));
    }

    #[test]
    fn test_decode_explicit_charset_overrides_default() {
        let decoder = Decoder::new();
        let uri = decoder.decode("data:;charset=utf-8,x").unwrap();

        assert_eq!(uri.param("charset"), Some("utf-8"));
    }

    #[test]
    fn test_decode_duplicate_param_last_wins() {
        let decoder = Decoder::new();
        let uri = decoder.decode("data:text/plain;a=1;a=2,").unwrap();

        assert_eq!(uri.param("a"), Some("2"));
    }

    #[test]
    fn test_decode_quoted_param_before_comma() {
        let decoder = Decoder::new();
        let uri = decoder.decode(r#"data:text/plain;charset=utf-8;foo="bar",A%20brief%20note"#).unwrap();

        assert_eq!(uri.param("foo"), Some("bar"));
        assert_eq!(uri.data, b"A brief note");
    }

    #[test]
    fn test_decode_invalid_base64() {
        let decoder = Decoder::new();
        let err = decoder.decode("data:text/plain;base64,aGV5YQ=").unwrap_err();

        assert!(matches!(err, Error::Base64(_)));
    }

    #[test]
    fn test_decode_invalid_escape_in_payload() {
        let decoder = Decoder::new();
        let err = decoder.decode("data:,100%").unwrap_err();

        assert!(matches!(err, Error::Escape { .. }));
    }

    #[test]
    fn test_decode_invalid_escape_in_param() {
        let decoder = Decoder::new();
        let err = decoder.decode("data:text/plain;name=a%zz,").unwrap_err();

        assert!(matches!(err, Error::Escape { .. }));
    }

    #[test]
    fn test_decode_missing_comma() {
        let decoder = Decoder::new();
        let err = decoder.decode("data:text/plain;base64").unwrap_err();

        assert!(matches!(err, Error::Lex { .. }));
        assert_eq!(err.to_string(), "missing comma before data");
    }

    #[test]
    fn test_decode_unterminated_quote() {
        let decoder = Decoder::new();
        let err = decoder.decode(r#"data:text/plain;foo="bar,"#).unwrap_err();

        assert!(matches!(err, Error::Lex { .. }));
    }

    #[test]
    fn test_decode_reader() {
        let decoder = Decoder::new();
        let uri = decoder
            .decode_reader("data:text/plain;charset=utf-8;base64,aGV5YQ==".as_bytes())
            .unwrap();

        assert_eq!(uri.data, b"heya");
        assert_eq!(uri.param("charset"), Some("utf-8"));
    }

    #[test]
    fn test_decode_reader_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"data:image/vnd.microsoft.icon;name=golang%20favicon;base64,AAABAA==")
            .unwrap();

        let decoder = Decoder::new();
        let uri = decoder.decode_reader(std::fs::File::open(file.path()).unwrap()).unwrap();

        assert_eq!(uri.param("name"), Some("golang favicon"));
        assert_eq!(uri.content_type(), "image/vnd.microsoft.icon");
        assert_eq!(uri.data, vec![0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_decode_reader_rejects_invalid_utf8() {
        let decoder = Decoder::new();
        let err = decoder.decode_reader(&b"data:,\xFF"[..]).unwrap_err();

        assert!(matches!(err, Error::Utf8(_)));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#"b\"<@>\"r"#).unwrap(), r#"b"<@>"r"#);
        assert_eq!(unquote(r"a\\b").unwrap(), r"a\b");
        assert_eq!(unquote(r"\n").unwrap(), "n");
        assert!(matches!(unquote("abc\\"), Err(Error::Quote(_))));
    }
}
