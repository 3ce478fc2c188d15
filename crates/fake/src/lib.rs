//! In-process fake HTTP services for integration tests.
//!
//! A [`ServiceLayer`] starts named [`Service`]s, each a real HTTP/1.1 listener on its own
//! ephemeral port. Tests program `(pattern, response)` pairs on a service, point the code under
//! test at [`Service::url_for`], and afterwards inspect what was actually sent with
//! [`Service::get_request`].
//!
//! # Example
//!
//! ```
//! use http::header::CONTENT_TYPE;
//! use http::HeaderValue;
//! use micro_fake::{Request, Response, ServiceLayer};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), micro_fake::FakeError> {
//! let layer = ServiceLayer::new();
//! let calc = layer.get_or_create("calc")?;
//!
//! calc.program(
//!     Request::post("/add").with_body("[1,2,3,4]"),
//!     Response::ok()
//!         .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
//!         .with_body(r#"{"result":10}"#),
//! );
//! assert_eq!(calc.url_for("/add"), format!("http://127.0.0.1:{}/add", calc.port()));
//!
//! // nothing has called the service yet
//! assert!(calc.get_request(&Request::post("/add")).is_err());
//!
//! layer.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod layer;
pub mod path;
mod request;
mod response;
mod service;

pub use error::FakeError;
pub use layer::{ServiceLayer, ServiceLayerBuilder};
pub use request::Request;
pub use response::Response;
pub use service::Service;
