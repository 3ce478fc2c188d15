use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use tracing::warn;

use crate::path::{decode_query, quote_path};

/// A request made to a fake service, or a pattern describing one.
///
/// As a pattern, method and path always take part in matching. Headers, body and query only
/// constrain the match when they were set: every pattern header and query pair must be
/// present on the actual request, and a pattern body must equal the actual body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
    query: Vec<(String, String)>,
}

impl Request {
    /// A request for `path`; each path segment is percent-encoded.
    pub fn new(method: Method, path: &str) -> Self {
        Self { method, path: quote_path(path), headers: HeaderMap::new(), body: None, query: Vec::new() }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Snapshots an inbound request as it came off the wire.
    ///
    /// The path is kept in its encoded form, an empty body is recorded as no body.
    pub(crate) fn record(request: &http::Request<Bytes>) -> Self {
        let query = match request.uri().query().map(decode_query) {
            None => Vec::new(),
            Some(Ok(query)) => query,
            Some(Err(e)) => {
                warn!(cause = %e, uri = %request.uri(), "failed to decode query, recording it empty");
                Vec::new()
            }
        };
        let path = match request.uri().path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };
        let body = (!request.body().is_empty()).then(|| request.body().clone());

        Self { method: request.method().clone(), path, headers: request.headers().clone(), body, query }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The percent-encoded path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The first value of header `name` when it is visible ascii.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// The first value of query parameter `name`.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Returns true when `actual` satisfies this pattern.
    pub fn matches(&self, actual: &Request) -> bool {
        if self.method != actual.method || self.path != actual.path {
            return false;
        }

        let headers_match = self
            .headers
            .iter()
            .all(|(name, value)| actual.headers.get_all(name).iter().any(|actual_value| actual_value == value));

        let body_match = match &self.body {
            None => true,
            Some(body) => actual.body.as_deref().unwrap_or_default() == &body[..],
        };

        let query_match = self.query.iter().all(|pair| actual.query.contains(pair));

        headers_match && body_match && query_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{ACCEPT, CONTENT_TYPE};

    fn recorded(raw: http::Request<Bytes>) -> Request {
        Request::record(&raw)
    }

    #[test]
    fn records_wire_form() {
        let actual = recorded(
            http::Request::post("/add?b=2&a=one+two")
                .header(CONTENT_TYPE, "application/json")
                .body(Bytes::from_static(b"[1,2,3,4]"))
                .unwrap(),
        );

        assert_eq!(actual.method(), Method::POST);
        assert_eq!(actual.path(), "/add");
        assert_eq!(actual.header("content-type"), Some("application/json"));
        assert_eq!(actual.body(), Some(&Bytes::from_static(b"[1,2,3,4]")));
        assert_eq!(actual.query_value("a"), Some("one two"));
        assert_eq!(actual.query()[0], ("b".to_string(), "2".to_string()));
    }

    #[test]
    fn empty_body_is_absent() {
        let actual = recorded(http::Request::get("/status").body(Bytes::new()).unwrap());
        assert_eq!(actual.body(), None);
    }

    #[test]
    fn method_and_path_always_match() {
        let actual = recorded(http::Request::post("/add").body(Bytes::from_static(b"[1]")).unwrap());

        assert!(Request::post("/add").matches(&actual));
        assert!(Request::post("add").matches(&actual));
        assert!(!Request::get("/add").matches(&actual));
        assert!(!Request::post("/sub").matches(&actual));
    }

    #[test]
    fn optional_refinements() {
        let actual = recorded(
            http::Request::post("/search?q=witch&page=2")
                .header(CONTENT_TYPE, "application/json")
                .header(ACCEPT, "application/json")
                .header(ACCEPT, "application/yaml")
                .body(Bytes::from_static(b"{}"))
                .unwrap(),
        );

        assert!(Request::post("/search").with_body("{}").matches(&actual));
        assert!(!Request::post("/search").with_body("[]").matches(&actual));

        assert!(Request::post("/search").with_header(ACCEPT, HeaderValue::from_static("application/yaml")).matches(&actual));
        assert!(!Request::post("/search").with_header(ACCEPT, HeaderValue::from_static("text/plain")).matches(&actual));

        assert!(Request::post("/search").with_query("page", "2").matches(&actual));
        assert!(!Request::post("/search").with_query("page", "3").matches(&actual));
    }

    #[test]
    fn pattern_paths_are_quoted() {
        let actual = recorded(http::Request::get("/path%20that/quo%2Bing").body(Bytes::new()).unwrap());
        assert!(Request::get("/path that/quo+ing").matches(&actual));
    }
}
