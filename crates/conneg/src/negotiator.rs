//! Proactive content negotiation (RFC 9110 §12.1).

use std::cmp::Reverse;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, HeaderValue, VARY};
use http::{HeaderMap, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, error};

use crate::charset::Charset;
use crate::codec::{BinaryCodec, Codec, TextCodec};
use crate::decoder::{RequestBody, decode_body};
use crate::error::ContentError;
use crate::media_range::{MediaRange, parse_accept};
use crate::registry::{ContentRegistry, Registration};

/// The representation chosen for a response.
#[derive(Debug, Clone)]
pub struct Selection {
    registration: Arc<Registration>,
    charset: Option<Charset>,
}

impl Selection {
    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    /// The charset of a text representation, `None` for binary ones.
    pub fn charset(&self) -> Option<Charset> {
        self.charset
    }

    /// The `Content-Type` value, with a `charset` parameter for text representations.
    pub fn content_type(&self) -> String {
        match self.charset {
            Some(charset) => format!("{}; charset={}", self.registration.mime_type(), charset.name()),
            None => self.registration.mime_type().to_string(),
        }
    }
}

/// Decodes request bodies and encodes responses with the codecs of a [`ContentRegistry`].
///
/// Hosts hold one negotiator and call it around their handlers: decode, handle, then encode.
///
/// # Example
///
/// ```
/// use http::HeaderValue;
/// use micro_conneg::ContentNegotiator;
/// use serde_json::json;
///
/// let negotiator = ContentNegotiator::with_defaults();
/// let accept = HeaderValue::from_static("application/json");
/// let (content_type, body) = negotiator.negotiate_response(Some(&accept), &json!({"result": 10})).unwrap();
///
/// assert_eq!(content_type, "application/json; charset=utf-8");
/// assert_eq!(&body[..], br#"{"result":10}"#);
/// ```
#[derive(Debug, Clone)]
pub struct ContentNegotiator {
    registry: Arc<ContentRegistry>,
}

impl ContentNegotiator {
    pub fn new(registry: Arc<ContentRegistry>) -> Self {
        Self { registry }
    }

    /// A negotiator over a fresh registry holding the built-in codecs.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(ContentRegistry::with_defaults()))
    }

    /// A negotiator over the process-wide registry.
    pub fn global() -> Self {
        Self::new(ContentRegistry::global())
    }

    pub fn registry(&self) -> &Arc<ContentRegistry> {
        &self.registry
    }

    pub fn register_binary_type(&self, mime_type: &str, codec: impl BinaryCodec + 'static) -> Result<(), ContentError> {
        self.registry.register_binary(mime_type, codec)
    }

    pub fn register_text_type(
        &self,
        mime_type: &str,
        default_charset: &str,
        codec: impl TextCodec + 'static,
    ) -> Result<(), ContentError> {
        self.registry.register_text(mime_type, default_charset, codec)
    }

    pub fn clear_handlers(&self) {
        self.registry.clear();
    }

    /// Decodes a request body, see [`decode_body`].
    pub fn decode_request_body(&self, headers: &HeaderMap, body: &[u8]) -> Result<Value, ContentError> {
        decode_body(&self.registry, headers, body)
    }

    /// Decodes a request body through its per-request cache.
    pub fn request_body<'b>(&self, body: &'b RequestBody) -> Result<&'b Value, ContentError> {
        body.decode(&self.registry)
    }

    /// Chooses the representation for an `Accept` header value.
    ///
    /// Each registration is weighed by the most specific range matching it, the earliest in the
    /// header among equally specific ones. Ranges asking for an unsupported charset match
    /// nothing. The best registration has the highest quality, then the most specific range,
    /// then the earliest range; binary registrations come before text ones, then registration
    /// order decides. Quality zero refuses a registration.
    pub fn select(&self, accept: Option<&HeaderValue>) -> Result<Selection, ContentError> {
        let ranges = match accept.map(HeaderValue::to_str) {
            None => parse_accept(None),
            Some(Ok(accept)) => parse_accept(Some(accept)),
            Some(Err(_)) => {
                debug!("accept header is not visible ascii, nothing is acceptable");
                Vec::new()
            }
        };

        let snapshot = self.registry.snapshot();
        let candidates = snapshot
            .iter()
            .filter(|registration| registration.is_binary())
            .chain(snapshot.iter().filter(|registration| !registration.is_binary()));

        let selected = candidates
            .enumerate()
            .filter_map(|(order, registration)| {
                let range = effective_range(&ranges, registration)?;
                (range.quality() > 0).then_some((order, registration, range))
            })
            .min_by_key(|(order, _, range)| (Reverse(range.quality()), Reverse(range.specificity()), range.position(), *order));

        if let Some((_, registration, range)) = selected {
            debug!(range = ?range, mime_type = registration.mime_type(), "selected representation");
            return Ok(Selection { registration: Arc::clone(registration), charset: response_charset(range, registration) });
        }

        Err(ContentError::not_acceptable(format!(
            "no registered content type satisfies accept {:?}",
            accept.and_then(|a| a.to_str().ok()).unwrap_or("*/*")
        )))
    }

    /// Selects a representation and encodes `value` with it.
    ///
    /// Returns the `Content-Type` header value and the body bytes.
    pub fn negotiate_response(&self, accept: Option<&HeaderValue>, value: &Value) -> Result<(HeaderValue, Bytes), ContentError> {
        let selection = self.select(accept)?;
        self.encode(&selection, value).inspect_err(|e| error!(cause = %e, "failed to encode response"))
    }

    /// Encodes `value` with an already chosen representation.
    pub fn encode(&self, selection: &Selection, value: &Value) -> Result<(HeaderValue, Bytes), ContentError> {
        let content_type = selection.content_type();
        let internal = |reason: String| ContentError::internal_encoding(&content_type, reason);

        let body = match (selection.registration.codec(), selection.charset) {
            (Codec::Binary(codec), _) => codec.encode(value).map_err(|e| internal(e.to_string()))?,
            (Codec::Text(codec), charset) => {
                let text = codec.encode(value).map_err(|e| internal(e.to_string()))?;
                let charset = charset.unwrap_or_else(Charset::utf_8);
                charset.encode(&text).map_err(|e| internal(e.to_string()))?.into_owned()
            }
        };

        let header = HeaderValue::from_str(&content_type).map_err(|e| internal(e.to_string()))?;
        Ok((header, Bytes::from(body)))
    }

    /// Builds a complete response for `value`, negotiated against the request headers.
    ///
    /// Negotiation and encoding failures become their status response. Every response carries
    /// `Vary: Accept`.
    pub fn respond(&self, status: StatusCode, request_headers: &HeaderMap, value: &Value) -> Response<Bytes> {
        let mut response = match self.negotiate_response(request_headers.get(ACCEPT), value) {
            Ok((content_type, body)) => {
                let mut response = Response::new(body);
                *response.status_mut() = status;
                response.headers_mut().insert(CONTENT_TYPE, content_type);
                response
            }
            Err(e) => e.into_response(),
        };
        response.headers_mut().insert(VARY, HeaderValue::from_static("accept"));
        response
    }

    /// An RFC 2295 `Alternatives` value listing every registered variant of `uri`.
    ///
    /// `None` when nothing is registered or `uri` can not be carried in a header.
    pub fn alternatives(&self, uri: &str) -> Option<HeaderValue> {
        let variants = self
            .registry
            .content_types()
            .iter()
            .map(|content_type| format!("{{\"{uri}\" 1.0 {{type {content_type}}}}}"))
            .collect::<Vec<_>>();

        if variants.is_empty() {
            return None;
        }
        HeaderValue::from_str(&variants.join(", ")).ok()
    }
}

/// The range deciding the quality of `registration`: the most specific one matching it, first
/// in the header among equals.
fn effective_range<'r>(ranges: &'r [MediaRange], registration: &Registration) -> Option<&'r MediaRange> {
    ranges
        .iter()
        .filter(|range| range.matches(registration) && charset_supported(range))
        .min_by_key(|range| (Reverse(range.specificity()), range.position()))
}

fn charset_supported(range: &MediaRange) -> bool {
    range.parameter("charset").is_none_or(|label| match Charset::for_label(label) {
        Ok(_) => true,
        Err(e) => {
            debug!(cause = %e, range = ?range, "range asks for an unsupported charset");
            false
        }
    })
}

/// The charset requested by the range, else the registration default.
fn response_charset(range: &MediaRange, registration: &Registration) -> Option<Charset> {
    if registration.is_binary() {
        return None;
    }

    let requested = range.parameter("charset").and_then(|label| Charset::for_label(label).ok());
    requested.or(registration.default_charset()).or(Some(Charset::utf_8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{JsonCodec, MockBinaryCodec, MockTextCodec};
    use serde_json::json;

    fn accept(value: &'static str) -> HeaderValue {
        HeaderValue::from_static(value)
    }

    fn selected(negotiator: &ContentNegotiator, value: &'static str) -> String {
        negotiator.select(Some(&accept(value))).unwrap().registration().mime_type().to_string()
    }

    #[test]
    fn exact_type_wins_over_registration_order() {
        let negotiator = ContentNegotiator::with_defaults();
        assert_eq!(selected(&negotiator, "application/yaml"), "application/yaml");
        assert_eq!(selected(&negotiator, "application/json"), "application/json");
    }

    #[test]
    fn header_order_breaks_quality_ties() {
        let negotiator = ContentNegotiator::with_defaults();
        assert_eq!(selected(&negotiator, "application/yaml, application/json"), "application/yaml");
        assert_eq!(selected(&negotiator, "application/json, application/yaml"), "application/json");
    }

    #[test]
    fn quality_wins_over_position() {
        let negotiator = ContentNegotiator::new(Arc::new(ContentRegistry::new()));
        negotiator.register_text_type("text/plain", "utf-8", JsonCodec).unwrap();
        negotiator.register_text_type("application/json", "utf-8", JsonCodec).unwrap();

        assert_eq!(selected(&negotiator, "text/*;q=0.5, application/json;q=0.9"), "application/json");
    }

    #[test]
    fn specific_range_overrides_wildcard_quality() {
        let negotiator = ContentNegotiator::new(Arc::new(ContentRegistry::new()));
        negotiator.register_text_type("application/json", "utf-8", JsonCodec).unwrap();
        negotiator.register_text_type("application/yaml", "utf-8", JsonCodec).unwrap();

        assert_eq!(selected(&negotiator, "*/*;q=0.9, application/json;q=0.1"), "application/yaml");
        assert_eq!(selected(&negotiator, "application/*;q=0.2, */*, application/yaml;q=0.1"), "application/json");
    }

    #[test]
    fn first_of_equally_specific_ranges_decides() {
        let negotiator = ContentNegotiator::with_defaults();

        let error = negotiator.select(Some(&accept("application/json;q=0, application/json"))).unwrap_err();
        assert!(matches!(error, ContentError::NotAcceptable { .. }));
        assert_eq!(selected(&negotiator, "application/json;q=0.5, application/json;q=0"), "application/json");
    }

    #[test]
    fn no_accept_prefers_binary() {
        let negotiator = ContentNegotiator::new(Arc::new(ContentRegistry::new()));
        negotiator.register_text_type("application/json", "utf-8", JsonCodec).unwrap();
        negotiator.register_binary_type("application/msgpack", MockBinaryCodec::new()).unwrap();

        let selection = negotiator.select(None).unwrap();
        assert_eq!(selection.registration().mime_type(), "application/msgpack");
        assert_eq!(selection.content_type(), "application/msgpack");
    }

    #[test]
    fn zero_quality_refuses_a_type() {
        let negotiator = ContentNegotiator::with_defaults();
        assert_eq!(selected(&negotiator, "application/cbor;q=0, */*"), "application/json");

        let error = negotiator.select(Some(&accept("application/json;q=0"))).unwrap_err();
        assert!(matches!(error, ContentError::NotAcceptable { .. }));
    }

    #[test]
    fn nothing_matches() {
        let negotiator = ContentNegotiator::with_defaults();
        let error = negotiator.negotiate_response(Some(&accept("image/png")), &json!({})).unwrap_err();
        assert_eq!(error.status_code(), StatusCode::NOT_ACCEPTABLE);
    }

    #[test]
    fn requested_charset_is_used_when_supported() {
        let negotiator = ContentNegotiator::with_defaults();

        let (content_type, body) =
            negotiator.negotiate_response(Some(&accept("application/json; charset=utf-16be")), &json!("\u{e9}")).unwrap();
        assert_eq!(content_type, "application/json; charset=utf-16be");
        assert_eq!(&body[..], &[0, b'"', 0, 0xe9, 0, b'"']);

    }

    #[test]
    fn unsupported_requested_charset_is_not_acceptable() {
        let negotiator = ContentNegotiator::with_defaults();

        let error = negotiator
            .negotiate_response(Some(&accept("application/json; charset=bogus-charset")), &json!(1))
            .unwrap_err();
        assert!(matches!(error, ContentError::NotAcceptable { .. }));
        assert_eq!(error.status_code(), StatusCode::NOT_ACCEPTABLE);

        let (content_type, _) = negotiator
            .negotiate_response(Some(&accept("application/json; charset=bogus-charset, application/yaml;q=0.5")), &json!(1))
            .unwrap();
        assert_eq!(content_type, "application/yaml; charset=utf-8");
    }

    #[test]
    fn unrepresentable_text_is_an_internal_error() {
        let negotiator = ContentNegotiator::with_defaults();
        let error = negotiator
            .negotiate_response(Some(&accept("application/json; charset=us-ascii")), &json!("\u{4e2d}"))
            .unwrap_err();
        assert!(matches!(error, ContentError::InternalEncoding { .. }));
    }

    #[test]
    fn failing_encoder_is_an_internal_error() {
        let negotiator = ContentNegotiator::new(Arc::new(ContentRegistry::new()));
        let mut codec = MockTextCodec::new();
        codec.expect_encode().times(1).returning(|_| Err("encoder exploded".into()));
        negotiator.register_text_type("application/json", "utf-8", codec).unwrap();

        let response = negotiator.respond(StatusCode::OK, &HeaderMap::new(), &json!({}));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[VARY], "accept");
    }

    #[test]
    fn respond_sets_headers() {
        let negotiator = ContentNegotiator::with_defaults();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, accept("application/yaml"));

        let response = negotiator.respond(StatusCode::CREATED, &headers, &json!({"hi": "there"}));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/yaml; charset=utf-8");
        assert_eq!(response.body(), &Bytes::from_static(b"hi: there\n"));
    }

    #[test]
    fn lists_alternatives() {
        let negotiator = ContentNegotiator::new(Arc::new(ContentRegistry::new()));
        assert!(negotiator.alternatives("/negotiate").is_none());

        negotiator.register_text_type("application/json", "utf-8", JsonCodec).unwrap();
        negotiator.register_binary_type("application/cbor", MockBinaryCodec::new()).unwrap();
        assert_eq!(
            negotiator.alternatives("/negotiate").unwrap(),
            r#"{"/negotiate" 1.0 {type application/json}}, {"/negotiate" 1.0 {type application/cbor}}"#
        );
    }

    #[test]
    fn cleared_registry_refuses_everything() {
        let negotiator = ContentNegotiator::with_defaults();
        negotiator.clear_handlers();

        let error = negotiator.negotiate_response(None, &json!({})).unwrap_err();
        assert!(matches!(error, ContentError::NotAcceptable { .. }));
    }
}
