//! Data URI data structures

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{ConstructError, Error};
use crate::escape::escape;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// RFC 2397 defaults
pub const DEFAULT_TYPE: &str = "text";
pub const DEFAULT_SUBTYPE: &str = "plain";
pub const DEFAULT_CHARSET: &str = "US-ASCII";
pub const CHARSET_PARAM: &str = "charset";

/// Payload encoding of a data URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Standard alphabet base64, marked with `;base64`
    Base64,
    /// Percent-escaped bytes (no marker)
    #[default]
    Ascii,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Base64 => f.write_str("base64"),
            Encoding::Ascii => f.write_str("ascii"),
        }
    }
}

/// Media type with optional parameters.
///
/// Parameters live in a [`BTreeMap`] so they always serialize sorted by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// Main type, e.g. `text`
    pub type_: String,
    /// Subtype, e.g. `plain`
    pub subtype: String,
    /// Parameters such as `charset`
    pub params: BTreeMap<String, String>,
}

impl MediaType {
    /// Create a media type without parameters
    pub fn new(type_: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            subtype: subtype.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter, replacing any previous value for `key`
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns `type/subtype` without parameters
    pub fn content_type(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }
}

/// The media type assumed when a data URI omits one:
/// `text/plain;charset=US-ASCII`.
impl Default for MediaType {
    fn default() -> Self {
        Self::new(DEFAULT_TYPE, DEFAULT_SUBTYPE).with_param(CHARSET_PARAM, DEFAULT_CHARSET)
    }
}

/// Writes `type/subtype;key=value...` with escaped, unquoted values
impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        for (key, value) in &self.params {
            write!(f, ";{}={}", key, escape(value.as_bytes()))?;
        }
        Ok(())
    }
}

/// A decoded data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Type of the payload
    pub media_type: MediaType,
    /// How the payload is written in text form
    pub encoding: Encoding,
    /// Payload bytes
    pub data: Vec<u8>,
}

impl DataUri {
    /// Create a base64 data URI from raw bytes, a `type/subtype` string and a
    /// flat list of parameter key/value pairs.
    ///
    /// For anything more involved build the struct directly.
    ///
    /// # Panics
    ///
    /// Panics if `media_type` is not `type/subtype` or `params` has an odd
    /// number of items. Use [`DataUri::try_new`] to get an error instead.
    pub fn new(data: impl Into<Vec<u8>>, media_type: &str, params: &[&str]) -> Self {
        match Self::try_new(data, media_type, params) {
            Ok(uri) => uri,
            Err(err) => panic!("datauri: {err}"),
        }
    }

    /// Fallible version of [`DataUri::new`]
    pub fn try_new(
        data: impl Into<Vec<u8>>,
        media_type: &str,
        params: &[&str],
    ) -> Result<Self, ConstructError> {
        let mut parts = media_type.split('/');
        let (type_, subtype) = match (parts.next(), parts.next(), parts.next()) {
            (Some(type_), Some(subtype), None) if !type_.is_empty() && !subtype.is_empty() => {
                (type_, subtype)
            }
            _ => return Err(ConstructError::InvalidMediaType(media_type.to_string())),
        };

        if params.len() % 2 != 0 {
            return Err(ConstructError::OddParams(params.len()));
        }

        let mut media_type = MediaType::new(type_, subtype);
        for pair in params.chunks_exact(2) {
            media_type.params.insert(pair[0].to_string(), pair[1].to_string());
        }

        Ok(Self {
            media_type,
            encoding: Encoding::Base64,
            data: data.into(),
        })
    }

    /// Returns `type/subtype` of the payload
    pub fn content_type(&self) -> String {
        self.media_type.content_type()
    }

    /// Look up a media type parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.media_type.params.get(key).map(String::as_str)
    }
}

/// Canonical text form.
///
/// This is not necessarily the text the URI was decoded from: defaults are
/// written out and quoted parameter values come back percent-escaped.
impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Encoder::new().encode(self))
    }
}

impl FromStr for DataUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decoder::new().decode(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DataUri {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DataUri {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
