use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use thiserror::Error;

/// Failure of a codec supplied to the registry.
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while decoding request bodies or negotiating responses.
///
/// Every variant except [`ContentError::Configuration`] maps to an HTTP status through
/// [`ContentError::status_code`]; configuration errors come from registration calls and are
/// meant to stop startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("bad request: {reason}")]
    BadRequest { reason: String },

    #[error("unsupported media type: {content_type}")]
    UnsupportedMediaType { content_type: String },

    #[error("not acceptable: {reason}")]
    NotAcceptable { reason: String },

    #[error("invalid content type registration: {reason}")]
    Configuration { reason: String },

    #[error("failed to encode response as {content_type}: {reason}")]
    InternalEncoding { content_type: String, reason: String },
}

impl ContentError {
    pub fn bad_request<S: ToString>(reason: S) -> Self {
        Self::BadRequest { reason: reason.to_string() }
    }

    pub fn unsupported_media_type<S: ToString>(content_type: S) -> Self {
        Self::UnsupportedMediaType { content_type: content_type.to_string() }
    }

    pub fn not_acceptable<S: ToString>(reason: S) -> Self {
        Self::NotAcceptable { reason: reason.to_string() }
    }

    pub fn configuration<S: ToString>(reason: S) -> Self {
        Self::Configuration { reason: reason.to_string() }
    }

    pub fn internal_encoding<C: ToString, S: ToString>(content_type: C, reason: S) -> Self {
        Self::InternalEncoding { content_type: content_type.to_string(), reason: reason.to_string() }
    }

    /// The HTTP status a host should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            Self::Configuration { .. } | Self::InternalEncoding { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts the error into a plain text response carrying its status.
    ///
    /// Server side failures do not leak their cause to the client.
    pub fn into_response(self) -> Response<Bytes> {
        let status = self.status_code();
        let body = if status.is_server_error() {
            Bytes::from_static(b"internal server error")
        } else {
            Bytes::from(self.to_string())
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        response
    }
}

/// Errors of the byte to text conversion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CharsetError {
    #[error("unsupported charset: {label}")]
    Unsupported { label: String },

    #[error("body is not valid {charset}")]
    Decode { charset: &'static str },

    #[error("text is not representable in {charset}")]
    Encode { charset: &'static str },
}
