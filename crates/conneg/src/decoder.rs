//! Request body decoding.

use std::sync::OnceLock;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Request};
use serde_json::Value;
use tracing::{debug, warn};

use crate::charset::{parse_content_type, resolve_charset};
use crate::codec::Codec;
use crate::error::ContentError;
use crate::registry::ContentRegistry;

/// Decodes a raw request body according to its `Content-Type`.
///
/// A request without `Content-Type` and without body decodes to [`Value::Null`]. Codec
/// failures and bodies that are invalid in their charset are `400`, unregistered types `415`
/// and unknown charsets `406`.
pub fn decode_body(registry: &ContentRegistry, headers: &HeaderMap, body: &[u8]) -> Result<Value, ContentError> {
    let Some(content_type) = headers.get(CONTENT_TYPE) else {
        if body.is_empty() {
            return Ok(Value::Null);
        }
        return Err(ContentError::bad_request("request body without content-type"));
    };

    let content_type = parse_content_type(content_type)?;
    let Some(registration) = registry.lookup(content_type.essence_str()) else {
        return Err(ContentError::unsupported_media_type(content_type.essence_str()));
    };

    let decoded = match registration.codec() {
        Codec::Binary(codec) => codec.decode(body),
        Codec::Text(codec) => {
            let charset = resolve_charset(&content_type, &registration)?;
            let text = charset.decode(body).map_err(ContentError::bad_request)?;
            codec.decode(&text)
        }
    };

    decoded.map_err(|e| {
        warn!(content_type = %content_type, cause = %e, "failed to decode request body");
        ContentError::bad_request(format!("failed to decode {} body: {e}", registration.mime_type()))
    })
}

/// Progress of a [`RequestBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Undecoded,
    Decoded,
    DecodeFailed,
}

/// The body of one inbound request, decoded at most once.
///
/// The first [`RequestBody::decode`] runs the codec, later calls return the cached value or
/// the cached error.
#[derive(Debug, Clone)]
pub struct RequestBody {
    headers: HeaderMap,
    raw: Bytes,
    decoded: OnceLock<Result<Value, ContentError>>,
}

impl RequestBody {
    pub fn new(headers: HeaderMap, raw: Bytes) -> Self {
        Self { headers, raw, decoded: OnceLock::new() }
    }

    pub fn from_request(request: &Request<Bytes>) -> Self {
        Self::new(request.headers().clone(), request.body().clone())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn decode(&self, registry: &ContentRegistry) -> Result<&Value, ContentError> {
        self.decoded
            .get_or_init(|| {
                debug!(length = self.raw.len(), "decode request body");
                decode_body(registry, &self.headers, &self.raw)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn state(&self) -> DecodeState {
        match self.decoded.get() {
            None => DecodeState::Undecoded,
            Some(Ok(_)) => DecodeState::Decoded,
            Some(Err(_)) => DecodeState::DecodeFailed,
        }
    }
}
