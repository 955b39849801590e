//! Error types for data URI decoding and construction.

use std::string::FromUtf8Error;

/// Result type alias for data URI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure while decoding (or writing) a data URI.
///
/// Every variant describes malformed external input or an I/O failure.
/// Programmer errors during construction are reported separately through
/// [`ConstructError`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structural problem found by the lexer. Displays the lexer message as is.
    #[error("{message}")]
    Lex {
        /// Lexer message, e.g. `invalid character for media type`.
        message: String,
        /// Byte offset in the input where the problem was detected.
        offset: usize,
    },

    /// A `%` not followed by two hex digits.
    #[error("invalid escape sequence at byte {offset}")]
    Escape {
        /// Byte offset of the offending `%`.
        offset: usize,
    },

    /// Base64 payload could not be decoded.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Malformed backslash-quoted parameter value.
    #[error("invalid quoted parameter value: {0}")]
    Quote(String),

    /// Unescaped text is not valid UTF-8.
    #[error("UTF-8 decode error: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// Reading or writing failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Precondition violated while building a [`DataUri`](crate::DataUri) by hand.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructError {
    /// The media type is not of the form `type/subtype`.
    #[error("invalid mediatype '{0}': expected type/subtype")]
    InvalidMediaType(String),

    /// The flat parameter list does not contain key/value pairs.
    #[error("requires an even number of param pairs, got {0} items")]
    OddParams(usize),
}
