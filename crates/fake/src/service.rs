//! A single named fake service.
//!
//! Calls are recorded in arrival order. A call then consumes the first pending programmed pair
//! whose pattern matches it, oldest first, and is answered with that pair's response. Calls
//! matching nothing get the unmatched status.

use std::collections::{BTreeSet, VecDeque};
use std::convert::Infallible;
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use micro_wire::handler::Handler;
use tracing::{debug, info, warn};

use crate::error::FakeError;
use crate::path::{encode_query, quote_path};
use crate::request::Request;
use crate::response::Response;

#[derive(Debug, Default)]
struct ServiceState {
    pending: VecDeque<(Request, Response)>,
    recorded: Vec<Request>,
    endpoints: BTreeSet<String>,
}

/// A fake HTTP service listening on its own port.
///
/// Obtained from [`ServiceLayer::get_or_create`](crate::ServiceLayer::get_or_create).
#[derive(Debug)]
pub struct Service {
    name: String,
    addr: SocketAddr,
    unmatched_status: StatusCode,
    unmatched_reason: Option<String>,
    state: Mutex<ServiceState>,
}

impl Service {
    pub(crate) fn new(name: &str, addr: SocketAddr, unmatched_status: StatusCode, unmatched_reason: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            addr,
            unmatched_status,
            unmatched_reason,
            state: Mutex::new(ServiceState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// `host:port`, bracketed for IPv6.
    pub fn netloc(&self) -> String {
        self.addr.to_string()
    }

    /// The absolute URL of `path` on this service, path segments percent-encoded.
    pub fn url_for(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, quote_path(path))
    }

    /// Like [`url_for`](Self::url_for), with `query` sorted and form-encoded.
    pub fn url_for_with_query<K, V>(&self, path: &str, query: &[(K, V)]) -> Result<String, FakeError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = self.url_for(path);
        if !query.is_empty() {
            let query = encode_query(query).map_err(FakeError::invalid_query)?;
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }

    /// Queues `response` for the next call matching `pattern`.
    pub fn program(&self, pattern: Request, response: Response) {
        debug!(service = %self.name, method = %pattern.method(), path = pattern.path(), "programmed response");
        let mut state = self.lock();
        state.endpoints.insert(pattern.path().to_string());
        state.pending.push_back((pattern, response));
    }

    /// Declares a known path that has no programmed response.
    pub fn add_endpoint(&self, path: &str) {
        self.lock().endpoints.insert(quote_path(path));
    }

    /// Every path that was programmed or declared.
    pub fn endpoints(&self) -> Vec<String> {
        self.lock().endpoints.iter().cloned().collect()
    }

    /// Programmed responses not yet consumed.
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn recorded_requests(&self) -> Vec<Request> {
        self.lock().recorded.clone()
    }

    /// All recorded requests matching `pattern`, in arrival order.
    pub fn requests_for(&self, pattern: &Request) -> Vec<Request> {
        self.lock().recorded.iter().filter(|actual| pattern.matches(actual)).cloned().collect()
    }

    /// The first recorded request matching `pattern`.
    pub fn get_request(&self, pattern: &Request) -> Result<Request, FakeError> {
        self.lock()
            .recorded
            .iter()
            .find(|actual| pattern.matches(actual))
            .cloned()
            .ok_or_else(|| FakeError::not_found(pattern.method(), pattern.path()))
    }

    /// Like [`get_request`](Self::get_request), for use in tests.
    ///
    /// # Panics
    ///
    /// Panics listing the recorded requests when none matches `pattern`.
    #[track_caller]
    pub fn assert_request(&self, pattern: &Request) -> Request {
        match self.get_request(pattern) {
            Ok(actual) => actual,
            Err(e) => {
                let mut recorded = String::new();
                for actual in &self.lock().recorded {
                    let _ = write!(recorded, "\n  {} {}", actual.method(), actual.path());
                }
                panic!("{e} on service {}, recorded:{recorded}", self.name);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, request: &http::Request<Bytes>) -> Response {
        let actual = Request::record(request);

        let mut state = self.lock();
        state.recorded.push(actual.clone());
        let matched = state.pending.iter().position(|(pattern, _)| pattern.matches(&actual));

        match matched.and_then(|index| state.pending.remove(index)) {
            Some((_, response)) => {
                info!(service = %self.name, method = %actual.method(), path = actual.path(), status = %response.status(), "answered programmed response");
                response
            }
            None => {
                warn!(service = %self.name, method = %actual.method(), path = actual.path(), "no programmed response matches");
                self.unmatched(&actual)
            }
        }
    }

    fn unmatched(&self, actual: &Request) -> Response {
        let mut response = Response::new(self.unmatched_status)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))
            .with_body(format!("unexpected request: {} {}\n", actual.method(), actual.path()));
        if let Some(reason) = &self.unmatched_reason {
            response = response.with_reason(reason);
        }
        response
    }
}

#[async_trait]
impl Handler for Service {
    type Error = Infallible;

    async fn call(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>, Self::Error> {
        Ok(self.dispatch(&req).to_http())
    }
}
