//! HTTP connection handling.
//!
//! [`HttpConnection`] drives one client connection: it decodes requests, answers
//! `Expect: 100-continue`, calls the [`Handler`](crate::handler::Handler) with the buffered body
//! and writes the complete response. Persistent connections are kept open until the client
//! closes them or sends `Connection: close`.

mod http_connection;

pub use http_connection::HttpConnection;
