//! Content negotiation for HTTP services.
//!
//! Request bodies are decoded according to their `Content-Type`, responses are encoded in the
//! representation the client prefers according to `Accept`. Which MIME types are available is
//! decided by a [`ContentRegistry`] of codecs.
//!
//! - [`registry`]: the MIME type to codec table
//! - [`charset`]: `Content-Type` parsing and charset conversion
//! - [`media_range`]: `Accept` parsing and ordering
//! - [`decoder`]: request body decoding with a per-request cache
//! - [`negotiator`]: response selection and encoding
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use http::header::{ACCEPT, CONTENT_TYPE};
//! use http::{Request, StatusCode};
//! use micro_conneg::{ContentNegotiator, RequestBody};
//! use serde_json::json;
//!
//! let negotiator = ContentNegotiator::with_defaults();
//! let request = Request::post("/add")
//!     .header(CONTENT_TYPE, "application/json")
//!     .header(ACCEPT, "application/yaml, application/json;q=0.5")
//!     .body(Bytes::from_static(b"[1,2,3,4]"))
//!     .unwrap();
//!
//! let body = RequestBody::from_request(&request);
//! let numbers = negotiator.request_body(&body).unwrap();
//! let sum: i64 = numbers.as_array().unwrap().iter().filter_map(|n| n.as_i64()).sum();
//!
//! let response = negotiator.respond(StatusCode::OK, request.headers(), &json!({"result": sum}));
//! assert_eq!(response.headers()[CONTENT_TYPE], "application/yaml; charset=utf-8");
//! assert_eq!(response.body(), &Bytes::from_static(b"result: 10\n"));
//! ```

pub mod charset;
pub mod codec;
pub mod decoder;
mod error;
pub mod media_range;
pub mod negotiator;
pub mod registry;

pub use charset::Charset;
pub use codec::{BinaryCodec, Codec, TextCodec};
pub use decoder::{DecodeState, RequestBody};
pub use error::{CharsetError, CodecError, ContentError};
pub use media_range::MediaRange;
pub use negotiator::{ContentNegotiator, Selection};
pub use registry::{ContentRegistry, Registration};

pub use serde_json::Value;
