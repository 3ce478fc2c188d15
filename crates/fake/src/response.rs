use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use micro_wire::protocol::ReasonPhrase;

/// A canned reply of a fake service.
///
/// Status, reason phrase, headers and body are sent as programmed, only `Content-Length` is
/// always computed from the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    reason: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self { status, reason: None, headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Replaces the canonical reason phrase on the status line.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub(crate) fn to_http(&self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body.clone());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();
        if let Some(reason) = &self.reason {
            response.extensions_mut().insert(ReasonPhrase::new(reason));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    #[test]
    fn converts_to_http() {
        let response = Response::new(StatusCode::from_u16(222).unwrap())
            .with_reason("Custom")
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(r#"{"result":10}"#)
            .to_http();

        assert_eq!(response.status().as_u16(), 222);
        assert_eq!(response.extensions().get::<ReasonPhrase>().unwrap().as_str(), "Custom");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.body(), &Bytes::from_static(br#"{"result":10}"#));
    }
}
