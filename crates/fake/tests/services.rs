mod common;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use common::{send, send_raw};
use http::header::{ACCEPT, CONTENT_TYPE, ETAG};
use http::{HeaderValue, Method, StatusCode};
use indoc::indoc;
use micro_fake::{FakeError, Request, Response, ServiceLayer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn json_response(body: &'static str) -> Response {
    Response::ok().with_header(CONTENT_TYPE, HeaderValue::from_static("application/json")).with_body(body)
}

#[tokio::test]
async fn programmed_add_is_answered_and_recorded() {
    common::init_tracing();
    let layer = ServiceLayer::new();
    let calc = layer.get_or_create("calc").unwrap();
    calc.program(Request::post("/add").with_body("[1,2,3,4]"), json_response(r#"{"result":10}"#));

    let response = send(calc.addr(), "POST", "/add", &[("Content-Type", "application/json")], b"[1,2,3,4]").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.reason, "OK");
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(response.body_text(), r#"{"result":10}"#);

    let recorded = calc.get_request(&Request::post("/add")).unwrap();
    assert_eq!(recorded.body(), Some(&Bytes::from_static(b"[1,2,3,4]")));
    assert_eq!(recorded.header("content-type"), Some("application/json"));

    layer.shutdown().await;
}

#[tokio::test]
async fn unmatched_call_gets_456_and_is_recorded() {
    common::init_tracing();
    let layer = ServiceLayer::new();
    let calc = layer.get_or_create("calc").unwrap();
    calc.program(Request::post("/add"), json_response("{}"));

    let response = send(calc.addr(), "GET", "/missing", &[], b"").await;
    assert_eq!(response.status, 456);
    assert_eq!(response.reason, "Unexpected Request");
    assert_eq!(response.body_text(), "unexpected request: GET /missing\n");

    let recorded = calc.get_request(&Request::get("/missing")).unwrap();
    assert_eq!(recorded.body(), None);
    assert_eq!(calc.pending_count(), 1);

    layer.shutdown().await;
}

#[tokio::test]
async fn programmed_response_is_single_use() {
    let layer = ServiceLayer::new();
    let svc = layer.get_or_create("svc").unwrap();
    svc.program(Request::get("/token"), Response::ok().with_body("first"));
    svc.program(Request::get("/token"), Response::ok().with_body("second"));

    assert_eq!(send(svc.addr(), "GET", "/token", &[], b"").await.body_text(), "first");
    assert_eq!(send(svc.addr(), "GET", "/token", &[], b"").await.body_text(), "second");
    assert_eq!(send(svc.addr(), "GET", "/token", &[], b"").await.status, 456);
    assert_eq!(svc.requests_for(&Request::get("/token")).len(), 3);

    layer.shutdown().await;
}

#[tokio::test]
async fn patterns_refine_on_body_headers_and_query() {
    let layer = ServiceLayer::new();
    let svc = layer.get_or_create("search").unwrap();
    svc.program(
        Request::get("/search").with_query("q", "witch").with_header(ACCEPT, HeaderValue::from_static("application/json")),
        json_response(r#"["hazel"]"#),
    );
    svc.program(Request::post("/search").with_body("exact"), Response::new(StatusCode::CREATED));

    let wrong_query = send(svc.addr(), "GET", "/search?q=wizard", &[("Accept", "application/json")], b"").await;
    assert_eq!(wrong_query.status, 456);
    let wrong_header = send(svc.addr(), "GET", "/search?q=witch", &[("Accept", "text/plain")], b"").await;
    assert_eq!(wrong_header.status, 456);
    let matching = send(svc.addr(), "GET", "/search?page=1&q=witch", &[("Accept", "application/json")], b"").await;
    assert_eq!(matching.body_text(), r#"["hazel"]"#);

    assert_eq!(send(svc.addr(), "POST", "/search", &[], b"inexact").await.status, 456);
    assert_eq!(send(svc.addr(), "POST", "/search", &[], b"exact").await.status, 201);

    let recorded = svc.get_request(&Request::get("/search").with_query("page", "1")).unwrap();
    assert_eq!(recorded.query_value("q"), Some("witch"));

    layer.shutdown().await;
}

#[tokio::test]
async fn quoted_paths_match_wire_paths() {
    let layer = ServiceLayer::new();
    let svc = layer.get_or_create("files").unwrap();
    svc.program(Request::get("/path that/needs quoting"), Response::ok().with_body("found"));

    let url = svc.url_for("/path that/needs quoting");
    let target = url.strip_prefix(&format!("http://{}", svc.netloc())).unwrap();
    assert_eq!(target, "/path%20that/needs%20quoting");

    assert_eq!(send(svc.addr(), "GET", target, &[], b"").await.body_text(), "found");
    layer.shutdown().await;
}

#[tokio::test]
async fn head_gets_headers_without_body() {
    let layer = ServiceLayer::new();
    let svc = layer.get_or_create("svc").unwrap();
    svc.program(Request::new(Method::HEAD, "/doc"), Response::ok().with_body("twelve bytes"));

    let response = send(svc.addr(), "HEAD", "/doc", &[], b"").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-length"), Some("12"));
    assert!(response.body.is_empty());

    layer.shutdown().await;
}

#[tokio::test]
async fn custom_reason_headers_and_length() {
    let layer = ServiceLayer::new();
    let svc = layer.get_or_create("svc").unwrap();
    svc.program(
        Request::put("/doc"),
        Response::new(StatusCode::ACCEPTED)
            .with_reason("Queued For Later")
            .with_header(ETAG, HeaderValue::from_static("\"v2\""))
            .with_header(http::header::CONTENT_LENGTH, HeaderValue::from_static("999"))
            .with_body("queued"),
    );

    let response = send(svc.addr(), "PUT", "/doc", &[], b"v2").await;
    assert_eq!(response.status, 202);
    assert_eq!(response.reason, "Queued For Later");
    assert_eq!(response.header("etag"), Some("\"v2\""));
    assert_eq!(response.header("content-length"), Some("6"));
    assert_eq!(response.body_text(), "queued");

    layer.shutdown().await;
}

#[tokio::test]
async fn chunked_request_body_is_recorded_whole() {
    let layer = ServiceLayer::new();
    let svc = layer.get_or_create("svc").unwrap();
    svc.program(Request::post("/upload").with_body("hello world"), Response::new(StatusCode::NO_CONTENT));

    let request = indoc! {"
        POST /upload HTTP/1.1\r
        Host: localhost\r
        Transfer-Encoding: chunked\r
        Connection: close\r
        \r
        5\r
        hello\r
        6\r
         world\r
        0\r
        \r
        "};
    let response = send_raw(svc.addr(), request.as_bytes()).await;
    assert_eq!(response.status, 204);
    assert_eq!(response.header("content-length"), None);

    let recorded = svc.assert_request(&Request::post("/upload"));
    assert_eq!(recorded.body(), Some(&Bytes::from_static(b"hello world")));

    layer.shutdown().await;
}

#[tokio::test]
async fn configured_unmatched_status() {
    let layer = ServiceLayer::builder().unmatched_status(StatusCode::from_u16(599).unwrap()).build();
    let svc = layer.get_or_create("svc").unwrap();

    let response = send(svc.addr(), "DELETE", "/anything", &[], b"").await;
    assert_eq!(response.status, 599);
    assert_eq!(response.reason, "Unexpected Request");

    let layer = ServiceLayer::builder().unmatched_status(StatusCode::NOT_FOUND).build();
    let svc = layer.get_or_create("svc").unwrap();
    let response = send(svc.addr(), "GET", "/anything", &[], b"").await;
    assert_eq!(response.status, 404);
    assert_eq!(response.reason, "Not Found");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_consume_each_response_once() {
    let layer = ServiceLayer::new();
    let svc = layer.get_or_create("svc").unwrap();
    for i in 0..16 {
        svc.program(Request::get("/ticket"), Response::ok().with_body(i.to_string()));
    }

    let calls = (0..16).map(|_| {
        let addr = svc.addr();
        tokio::spawn(async move { send(addr, "GET", "/ticket", &[], b"").await })
    });
    let mut bodies = Vec::new();
    for call in calls.collect::<Vec<_>>() {
        let response = call.await.unwrap();
        assert_eq!(response.status, 200);
        bodies.push(response.body_text().parse::<u32>().unwrap());
    }
    bodies.sort_unstable();

    assert_eq!(bodies, (0..16).collect::<Vec<_>>());
    assert_eq!(svc.pending_count(), 0);
    assert_eq!(svc.recorded_requests().len(), 16);

    layer.shutdown().await;
}

#[tokio::test]
async fn shutdown_releases_every_listener() {
    let layer = ServiceLayer::new();
    let first = layer.get_or_create("first").unwrap();
    let second = layer.get_or_create("second").unwrap();
    assert!(Arc::ptr_eq(&first, &layer.get_or_create("first").unwrap()));
    assert_ne!(first.port(), second.port());

    layer.shutdown().await;
    layer.shutdown().await;

    assert!(TcpStream::connect(first.addr()).await.is_err());
    assert!(TcpStream::connect(second.addr()).await.is_err());
    assert!(matches!(layer.get_or_create("third"), Err(FakeError::ShutDown)));
}

#[tokio::test]
async fn shutdown_closes_connection_with_partial_body() {
    let layer = ServiceLayer::new();
    let svc = layer.get_or_create("svc").unwrap();

    let mut stream = TcpStream::connect(svc.addr()).await.unwrap();
    stream.write_all(b"POST /upload HTTP/1.1\r\nContent-Length: 10\r\n\r\nab").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    layer.shutdown().await;

    // the server side is gone once shutdown returns, the read must not wait for the body
    let mut output = Vec::new();
    let closed = tokio::time::timeout(Duration::from_secs(2), stream.read_to_end(&mut output)).await;
    assert!(matches!(closed, Ok(_)), "connection still open after shutdown");
    assert!(output.is_empty());
    assert!(svc.recorded_requests().is_empty());
}

#[tokio::test]
async fn drop_stops_listeners() {
    let addr = {
        let layer = ServiceLayer::new();
        layer.get_or_create("svc").unwrap().addr()
    };

    // aborted listener tasks release their sockets on the next scheduler turn
    let mut refused = false;
    for _ in 0..50 {
        if TcpStream::connect(addr).await.is_err() {
            refused = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(refused);
}

#[test]
fn services_need_a_runtime() {
    let layer = ServiceLayer::new();
    assert!(matches!(layer.get_or_create("svc"), Err(FakeError::NoRuntime)));
}
