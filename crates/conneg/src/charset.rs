//! Content-Type parsing and charset conversion.
//!
//! Charset labels are resolved with the WHATWG encoding standard through `encoding_rs`. UTF-16
//! is handled here directly since `encoding_rs` only decodes it.

use std::borrow::Cow;
use std::fmt;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use http::HeaderValue;
use mime::Mime;

use crate::error::{CharsetError, ContentError};
use crate::registry::Registration;

/// A supported character encoding.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    encoding: &'static Encoding,
}

impl Charset {
    pub fn utf_8() -> Self {
        Self { encoding: UTF_8 }
    }

    /// Resolves a charset label such as `utf-8`, `latin1` or `UTF-16BE`.
    ///
    /// Labels that map to the WHATWG `replacement` encoding are refused, that encoding can not
    /// round-trip anything.
    pub fn for_label(label: &str) -> Result<Self, CharsetError> {
        let trimmed = label.trim().trim_matches('"');
        match Encoding::for_label(trimmed.as_bytes()) {
            Some(encoding) if encoding != encoding_rs::REPLACEMENT => Ok(Self { encoding }),
            _ => Err(CharsetError::Unsupported { label: label.to_string() }),
        }
    }

    /// The lower-case canonical name, as written into `charset=` parameters.
    pub fn name(&self) -> String {
        self.encoding.name().to_ascii_lowercase()
    }

    /// Converts bytes into text, failing on the first malformed sequence.
    ///
    /// A byte order mark is not special, it has to be valid in the charset like any other
    /// character.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>, CharsetError> {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .ok_or(CharsetError::Decode { charset: self.encoding.name() })
    }

    /// Converts text into bytes, failing when a character has no mapping in the charset.
    pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>, CharsetError> {
        if self.encoding == UTF_16LE {
            return Ok(Cow::Owned(text.encode_utf16().flat_map(u16::to_le_bytes).collect()));
        }
        if self.encoding == UTF_16BE {
            return Ok(Cow::Owned(text.encode_utf16().flat_map(u16::to_be_bytes).collect()));
        }

        let (bytes, _, had_unmappable) = self.encoding.encode(text);
        if had_unmappable {
            return Err(CharsetError::Encode { charset: self.encoding.name() });
        }
        Ok(bytes)
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Charset").field(&self.encoding.name()).finish()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Parses a `Content-Type` header value.
///
/// Unreadable or malformed values are a client error.
pub fn parse_content_type(value: &HeaderValue) -> Result<Mime, ContentError> {
    let raw = value
        .to_str()
        .map_err(|e| ContentError::bad_request(format!("content-type header is not visible ascii: {e}")))?;
    raw.trim()
        .parse::<Mime>()
        .map_err(|e| ContentError::bad_request(format!("malformed content-type {raw:?}: {e}")))
}

/// Picks the charset used to read a text body.
///
/// The `charset` parameter wins over the registration default. A label the resolver does not
/// know is `406`, no charset at all is `415`.
pub fn resolve_charset(content_type: &Mime, registration: &Registration) -> Result<Charset, ContentError> {
    if let Some(label) = content_type.get_param(mime::CHARSET) {
        return Charset::for_label(label.as_str())
            .map_err(|e| ContentError::not_acceptable(format!("{e} in {content_type}")));
    }

    registration
        .default_charset()
        .ok_or_else(|| ContentError::unsupported_media_type(content_type.essence_str()))
}
