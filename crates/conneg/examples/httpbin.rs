//! An httpbin-like echo service answering in whatever representation the client accepts.
//!
//! ```text
//! cargo run -p micro-conneg --example httpbin
//! curl -H 'Accept: application/yaml' 'http://127.0.0.1:8080/?name=glinda'
//! curl -H 'Content-Type: application/json' -d '{"good":"witch"}' http://127.0.0.1:8080/
//! curl -i -H 'Negotiate: vlist' -H 'Accept: image/png' http://127.0.0.1:8080/negotiate
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderValue, VARY};
use http::{Method, Request, Response, StatusCode};
use micro_conneg::{ContentError, ContentNegotiator, RequestBody};
use micro_wire::handler::Handler;
use micro_wire::protocol::ReasonPhrase;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let port = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(8080);
    info!(port, "start listening");
    let tcp_listener = match TcpListener::bind(("127.0.0.1", port)).await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    let handler = Arc::new(Httpbin { negotiator: ContentNegotiator::with_defaults() });
    micro_wire::server::serve(tcp_listener, handler, CancellationToken::new()).await;
}

struct Httpbin {
    negotiator: ContentNegotiator,
}

#[async_trait]
impl Handler for Httpbin {
    type Error = Infallible;

    async fn call(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Self::Error> {
        let response = match (req.method(), req.uri().path()) {
            (&Method::GET, "/") => self.negotiator.respond(StatusCode::OK, req.headers(), &Value::Object(standard_response(&req))),
            (&Method::POST, "/") => self.echo_post(&req),
            (&Method::GET, "/negotiate") => self.negotiate(&req),
            _ => {
                let mut response = Response::new(Bytes::from_static(b"not found"));
                *response.status_mut() = StatusCode::NOT_FOUND;
                response
            }
        };
        Ok(response)
    }
}

impl Httpbin {
    fn echo_post(&self, req: &Request<Bytes>) -> Response<Bytes> {
        let body = RequestBody::from_request(req);
        let decoded = match self.negotiator.request_body(&body) {
            Ok(decoded) => decoded.clone(),
            Err(e) => return e.into_response(),
        };

        let mut response = standard_response(req);
        response.insert("data".to_string(), Value::String(String::from_utf8_lossy(body.raw()).into_owned()));
        response.insert("files".to_string(), json!({}));
        response.insert("form".to_string(), json!({}));
        response.insert("body".to_string(), decoded);
        self.negotiator.respond(StatusCode::OK, req.headers(), &Value::Object(response))
    }

    /// Transparent negotiation (RFC 2295) in its simplest form: the variant list is sent when
    /// asked for, and a 406 turns into `300 Multiple Choices`.
    fn negotiate(&self, req: &Request<Bytes>) -> Response<Bytes> {
        let wants_list = req
            .headers()
            .get_all("negotiate")
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|directive| directive.trim().eq_ignore_ascii_case("vlist"));

        let value = json!({"hi": "there"});
        let mut response = match self.negotiator.select(req.headers().get(http::header::ACCEPT)) {
            Ok(selection) => match self.negotiator.encode(&selection, &value) {
                Ok((content_type, body)) => {
                    let mut response = Response::new(body);
                    response.headers_mut().insert(http::header::CONTENT_TYPE, content_type);
                    response
                }
                Err(e) => e.into_response(),
            },
            Err(ContentError::NotAcceptable { .. }) => {
                let mut response = Response::new(Bytes::new());
                *response.status_mut() = StatusCode::MULTIPLE_CHOICES;
                response.extensions_mut().insert(ReasonPhrase::new("Multiple Choices"));
                response.headers_mut().insert(VARY, HeaderValue::from_static("negotiate, accept"));
                response
            }
            Err(e) => e.into_response(),
        };

        if wants_list && let Some(alternatives) = self.negotiator.alternatives(req.uri().path()) {
            response.headers_mut().insert("alternatives", alternatives);
            response.headers_mut().insert("tcn", HeaderValue::from_static("list"));
        }
        response
    }
}

fn standard_response(req: &Request<Bytes>) -> Map<String, Value> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(req.uri().query().unwrap_or("")).unwrap_or_default();
    let mut args = Map::new();
    for (name, value) in pairs {
        let values = args.entry(name).or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = values {
            values.push(Value::String(value));
        }
    }

    let mut headers = Map::new();
    for (name, value) in req.headers() {
        headers.insert(name.to_string(), Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()));
    }

    let mut response = Map::new();
    response.insert("args".to_string(), Value::Object(args));
    response.insert("headers".to_string(), Value::Object(headers));
    response.insert("url".to_string(), Value::String(req.uri().to_string()));
    response
}
