//! Data URI encoder

use crate::datauri::{DataUri, Encoding};
use crate::error::Result;
use crate::escape::escape;
use crate::lexer::{BASE64_MARKER, DATA_PREFIX};
use base64::Engine;

/// Encodes data URIs into their canonical text form
pub struct Encoder {
    // Currently stateless, but reserved for future options
}

impl Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self {}
    }

    /// Encode a data URI to a string.
    ///
    /// Parameters are written in key order with percent-escaped values,
    /// never quoted.
    pub fn encode(&self, uri: &DataUri) -> String {
        let mut output = String::with_capacity(DATA_PREFIX.len() + 32 + uri.data.len() * 4 / 3);

        output.push_str(DATA_PREFIX);
        output.push_str(&uri.media_type.to_string());

        if uri.encoding == Encoding::Base64 {
            output.push(';');
            output.push_str(BASE64_MARKER);
        }
        output.push(',');

        match uri.encoding {
            Encoding::Base64 => {
                base64::engine::general_purpose::STANDARD.encode_string(&uri.data, &mut output);
            }
            Encoding::Ascii => output.push_str(&escape(&uri.data)),
        }

        tracing::debug!(
            content_type = %uri.content_type(),
            encoding = %uri.encoding,
            len = output.len(),
            "encoded data URI"
        );
        output
    }

    /// Encode a data URI directly to a writer
    pub fn encode_to_writer<W: std::io::Write>(&self, uri: &DataUri, mut writer: W) -> Result<()> {
        let encoded = self.encode(uri);
        writer.write_all(encoded.as_bytes())?;
        Ok(())
    }

    /// Encode a data URI to a file
    pub fn encode_to_file(&self, uri: &DataUri, path: &std::path::Path) -> Result<()> {
        let encoded = self.encode(uri);
        std::fs::write(path, encoded)?;
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
