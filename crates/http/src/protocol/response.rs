//! HTTP response head handling.
//!
//! A response head is `http::Response<()>`. Custom reason phrases travel in the response
//! extensions as a [`ReasonPhrase`], since `http::StatusCode` only knows canonical ones.

use http::{Response, StatusCode};

/// The status line and headers of an outbound response.
pub type ResponseHead = Response<()>;

/// A reason phrase that replaces the canonical one on the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonPhrase(String);

impl ReasonPhrase {
    /// Creates a reason phrase, dropping characters not allowed on a status line.
    pub fn new(reason: impl AsRef<str>) -> Self {
        let cleaned = reason
            .as_ref()
            .chars()
            .filter(|c| *c == '\t' || *c == ' ' || c.is_ascii_graphic())
            .collect::<String>();
        Self(cleaned)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resolves the reason phrase for a response head.
///
/// Order: explicit [`ReasonPhrase`] extension, canonical reason, then `"Unknown"` for
/// status codes that have none (e.g. 456).
pub fn reason_of(head: &ResponseHead) -> &str {
    head.extensions()
        .get::<ReasonPhrase>()
        .map(ReasonPhrase::as_str)
        .or_else(|| head.status().canonical_reason())
        .unwrap_or("Unknown")
}

/// Builds a response with an empty body, used for transport level failures.
pub fn error_response(status: StatusCode) -> Response<bytes::Bytes> {
    let mut response = Response::new(bytes::Bytes::new());
    *response.status_mut() = status;
    response
}
