//! Data URI lexer.
//!
//! The lexer is a small state machine over the input bytes. Every call to
//! [`Iterator::next`] runs states until one of them emits a token, so tokens
//! are produced lazily and strictly left to right. The stream always ends
//! with exactly one [`TokenKind::Eof`] or [`TokenKind::Error`] token, after
//! which the iterator is exhausted.
//!
//! ```text
//! data:text/plain;charset=utf-8;base64,aGV5YQ==
//! ^^^^^                                          Prefix
//!      ^^^^                                      MediaType
//!          ^                                     MediaSep
//!           ^^^^^                                MediaSubType
//!                ^                               ParamSemicolon
//!                 ^^^^^^^                        ParamAttr
//!                        ^                       ParamEqual
//!                         ^^^^^                  ParamVal
//!                              ^                 ParamSemicolon
//!                               ^^^^^^           Base64Marker
//!                                     ^          DataComma
//!                                      ^^^^^^^^  Data, then Eof
//! ```

use std::fmt;

/// Literal prefix of every data URI
pub const DATA_PREFIX: &str = "data:";

/// Encoding marker, only recognized when immediately followed by the data comma
pub const BASE64_MARKER: &str = "base64";

/// Kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `data:`
    Prefix,
    /// Media type, e.g. `text`
    MediaType,
    /// `/` between type and subtype
    MediaSep,
    /// Media subtype, e.g. `plain`
    MediaSubType,
    /// `;` introducing a parameter or the encoding marker
    ParamSemicolon,
    /// Parameter name
    ParamAttr,
    /// `=` between parameter name and value
    ParamEqual,
    /// Opening `"` of a quoted parameter value
    LeftQuote,
    /// Raw parameter value (still escaped or quoted)
    ParamVal,
    /// Closing `"` of a quoted parameter value
    RightQuote,
    /// `base64`
    Base64Marker,
    /// `,` ending the header
    DataComma,
    /// Raw payload
    Data,
    /// End of input
    Eof,
    /// Lexical error; the token text holds the message
    Error,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Prefix => "prefix",
            TokenKind::MediaType => "media type",
            TokenKind::MediaSep => "media separator",
            TokenKind::MediaSubType => "media subtype",
            TokenKind::ParamSemicolon => "semicolon",
            TokenKind::ParamAttr => "parameter attribute",
            TokenKind::ParamEqual => "equals sign",
            TokenKind::LeftQuote => "left quote",
            TokenKind::ParamVal => "parameter value",
            TokenKind::RightQuote => "right quote",
            TokenKind::Base64Marker => "base64 marker",
            TokenKind::DataComma => "data comma",
            TokenKind::Data => "data",
            TokenKind::Eof => "EOF",
            TokenKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// A classified slice of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// What the slice is
    pub kind: TokenKind,
    /// The slice itself, or the message for [`TokenKind::Error`]
    pub text: &'a str,
    /// Byte offset where the token starts (or where the error was found)
    pub offset: usize,
}

impl<'a> Token<'a> {
    /// Create a token
    pub fn new(kind: TokenKind, text: &'a str, offset: usize) -> Self {
        Self { kind, text, offset }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("EOF"),
            TokenKind::Error => f.write_str(self.text),
            kind => write!(f, "{kind} {:?}", self.text),
        }
    }
}

/// Lexer states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    MediaType,
    MediaSep,
    MediaSubType,
    ParamSemicolon,
    Base64OrParam,
    ParamAttr,
    ParamEquals,
    ParamValue,
    QuotedParamValue,
    RightQuote,
    AfterQuote,
    DataComma,
    Data,
    Eof,
    Done,
}

/// Tokenizer for a single data URI string
pub struct Lexer<'a> {
    input: &'a str,
    /// Start of the token being accumulated
    start: usize,
    pos: usize,
    state: State,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input`
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            start: 0,
            pos: 0,
            state: State::Start,
        }
    }

    /// Current byte position in the input
    pub fn position(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Emit the bytes between `start` and `pos` and move on to `next`
    fn emit(&mut self, kind: TokenKind, next: State) -> Token<'a> {
        let token = Token::new(kind, &self.input[self.start..self.pos], self.start);
        self.start = self.pos;
        self.state = next;
        token
    }

    /// Consume exactly one byte and emit it
    fn emit_byte(&mut self, kind: TokenKind, next: State) -> Token<'a> {
        self.pos += 1;
        self.emit(kind, next)
    }

    /// Stop the stream with an error token
    fn error(&mut self, message: &'static str) -> Token<'a> {
        self.state = State::Done;
        Token::new(TokenKind::Error, message, self.pos)
    }

    /// Consume a run of bytes matching `accept`
    fn accept_run(&mut self, accept: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&accept) {
            self.pos += 1;
        }
    }

    /// Compute the next token, or `None` once the stream has ended
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        loop {
            match self.state {
                State::Start => {
                    if !self.input.starts_with(DATA_PREFIX) {
                        return Some(self.error("missing data prefix"));
                    }
                    self.pos = DATA_PREFIX.len();
                    return Some(self.emit(TokenKind::Prefix, State::MediaType));
                }

                State::MediaType => {
                    match self.peek() {
                        // No explicit media type, keep the default
                        Some(b';') => self.state = State::ParamSemicolon,
                        Some(b',') => self.state = State::DataComma,
                        None => return Some(self.error("missing comma before data")),
                        Some(_) => {
                            self.accept_run(is_token_byte);
                            if self.pos > self.start && self.peek() == Some(b'/') {
                                return Some(self.emit(TokenKind::MediaType, State::MediaSep));
                            }
                            return Some(self.error("invalid character for media type"));
                        }
                    }
                }

                State::MediaSep => {
                    return Some(self.emit_byte(TokenKind::MediaSep, State::MediaSubType));
                }

                State::MediaSubType => {
                    self.accept_run(is_token_byte);
                    let next = match self.peek() {
                        Some(b';') => State::ParamSemicolon,
                        Some(b',') => State::DataComma,
                        None => return Some(self.error("missing comma before data")),
                        Some(_) => return Some(self.error("invalid character for media subtype")),
                    };
                    if self.pos == self.start {
                        return Some(self.error("invalid character for media subtype"));
                    }
                    return Some(self.emit(TokenKind::MediaSubType, next));
                }

                State::ParamSemicolon => {
                    return Some(self.emit_byte(TokenKind::ParamSemicolon, State::Base64OrParam));
                }

                State::Base64OrParam => {
                    let rest = self.rest();
                    if rest.starts_with(BASE64_MARKER)
                        && rest.as_bytes().get(BASE64_MARKER.len()) == Some(&b',')
                    {
                        self.pos += BASE64_MARKER.len();
                        return Some(self.emit(TokenKind::Base64Marker, State::DataComma));
                    }
                    self.state = State::ParamAttr;
                }

                State::ParamAttr => {
                    self.accept_run(is_token_byte);
                    match self.peek() {
                        Some(b'=') if self.pos > self.start => {
                            return Some(self.emit(TokenKind::ParamAttr, State::ParamEquals));
                        }
                        None => return Some(self.error("missing comma before data")),
                        Some(_) => {
                            return Some(self.error("invalid character for parameter attribute"));
                        }
                    }
                }

                State::ParamEquals => {
                    return Some(self.emit_byte(TokenKind::ParamEqual, State::ParamValue));
                }

                State::ParamValue => {
                    if self.peek() == Some(b'"') {
                        return Some(self.emit_byte(TokenKind::LeftQuote, State::QuotedParamValue));
                    }
                    self.accept_run(is_url_byte);
                    let next = match self.peek() {
                        Some(b';') => State::ParamSemicolon,
                        Some(b',') => State::DataComma,
                        None => return Some(self.error("missing comma before data")),
                        Some(_) => return Some(self.error("invalid character for parameter value")),
                    };
                    return Some(self.emit(TokenKind::ParamVal, next));
                }

                State::QuotedParamValue => {
                    // A backslash always takes the following byte with it
                    loop {
                        match self.peek() {
                            None => return Some(self.error("unterminated quoted parameter value")),
                            Some(b'\\') => {
                                self.pos += 1;
                                if self.peek().is_none() {
                                    return Some(self.error("unterminated quoted parameter value"));
                                }
                                self.pos += 1;
                            }
                            Some(b'"') => break,
                            Some(_) => self.pos += 1,
                        }
                    }
                    return Some(self.emit(TokenKind::ParamVal, State::RightQuote));
                }

                State::RightQuote => {
                    return Some(self.emit_byte(TokenKind::RightQuote, State::AfterQuote));
                }

                State::AfterQuote => match self.peek() {
                    Some(b';') => self.state = State::ParamSemicolon,
                    Some(b',') => self.state = State::DataComma,
                    None => return Some(self.error("missing comma before data")),
                    Some(_) => {
                        return Some(self.error("unexpected character after quoted parameter value"));
                    }
                },

                State::DataComma => {
                    if self.peek() != Some(b',') {
                        return Some(self.error("missing comma before data"));
                    }
                    return Some(self.emit_byte(TokenKind::DataComma, State::Data));
                }

                State::Data => {
                    self.pos = self.input.len();
                    if self.pos > self.start {
                        return Some(self.emit(TokenKind::Data, State::Eof));
                    }
                    self.state = State::Eof;
                }

                State::Eof => {
                    return Some(self.emit(TokenKind::Eof, State::Done));
                }

                State::Done => return None,
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

impl std::iter::FusedIterator for Lexer<'_> {}

/// Bytes allowed in media types, subtypes and parameter names
pub fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(byte, b'!' | b'#' | b'$' | b'&' | b'-' | b'^' | b'_' | b'.' | b'+')
}

/// Bytes allowed in an unquoted parameter value.
///
/// `%` is accepted here; malformed escapes are rejected by the parser.
pub fn is_url_byte(byte: u8) -> bool {
    byte.is_ascii_graphic()
        && !matches!(
            byte,
            b'<' | b'>' | b'#' | b'"' | b'{' | b'}' | b'|' | b'\\' | b'^' | b'[' | b']' | b'`'
                | b';' | b','
        )
}
