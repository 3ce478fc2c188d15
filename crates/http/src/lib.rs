//! A small buffered HTTP/1.1 server for in-process fake services.
//!
//! Each request body is read completely before the [`handler::Handler`] runs and each response
//! is written with an exact `Content-Length`. That is all an in-process test double needs,
//! and it keeps recorded requests byte-exact.
//!
//! - [`codec`]: request decoding and response encoding on top of `tokio_util::codec`
//! - [`connection`]: the per-connection request loop
//! - [`handler`]: the async handler trait
//! - [`protocol`]: heads, messages and errors
//! - [`server`]: the accept loop
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use micro_wire::handler::make_handler;
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let handler = make_handler(|req: Request<Bytes>| async move {
//!         Ok::<_, Infallible>(Response::new(req.into_body()))
//!     });
//!
//!     micro_wire::server::serve(listener, Arc::new(handler), CancellationToken::new()).await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
