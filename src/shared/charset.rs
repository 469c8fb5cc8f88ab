use std::borrow::Cow;
use std::fmt::{self, Display};

use encoding_rs::{Encoding, UTF_8};

use client::ClientError;


/// Text encoding used for request bytes and response text
///
/// The queue service echoes the charset of the request back in the
/// `Content-Type` of the response, so the same value is used in both
/// directions. Labels are resolved the way browsers do, so `ISO-8859-1`
/// and `US-ASCII` both mean `windows-1252`, and `GB2312` means `GBK`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Charset(&'static Encoding);

impl Charset {
    pub fn utf8() -> Charset {
        Charset(UTF_8)
    }

    /// Wraps an encoding that can be used for requests
    ///
    /// Encodings that can't be written (UTF-16 and the `replacement`
    /// encoding) are rejected.
    pub fn new(encoding: &'static Encoding) -> Result<Charset, ClientError> {
        if encoding.output_encoding() != encoding {
            return Err(ClientError::UnsupportedCharset(
                encoding.name().to_string()));
        }
        Ok(Charset(encoding))
    }

    /// Looks up a charset by its label, case-insensitively
    pub fn from_label(label: &str) -> Result<Charset, ClientError> {
        Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| ClientError::UnsupportedCharset(label.to_string()))
            .and_then(Charset::new)
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.0
    }

    /// Canonical name, as written into `Content-Type`
    pub fn label(&self) -> &'static str {
        self.0.name()
    }

    /// Encodes text, failing on characters the charset can't represent
    pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>, ClientError>
    {
        let (bytes, _, unmappable) = self.0.encode(text);
        if unmappable {
            return Err(ClientError::MalformedRequest(format!(
                "text {:?} is not representable in {}", text, self.label())));
        }
        Ok(bytes)
    }

    /// Decodes bytes, replacing invalid sequences with U+FFFD
    ///
    /// A byte order mark is kept as part of the text.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        let (text, had_errors) = self.0.decode_without_bom_handling(bytes);
        if had_errors {
            debug!("invalid {} sequences replaced", self.label());
        }
        text
    }
}

impl Default for Charset {
    fn default() -> Charset {
        Charset::utf8()
    }
}

impl Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}
