//! HTTP codec module for decoding requests and encoding responses.
//!
//! - [`RequestDecoder`]: request head via [`header`], then the complete body via [`body`]
//! - [`ResponseEncoder`]: status line and fields, then the body bytes
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_wire::codec::RequestDecoder;
//! use micro_wire::protocol::Message;
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from(&b"GET /status HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);
//!
//! let head = decoder.decode(&mut buffer).unwrap();
//! assert!(matches!(head, Some(Message::Header(_))));
//! let body = decoder.decode(&mut buffer).unwrap().and_then(Message::into_payload);
//! assert_eq!(body.as_deref(), Some(&b""[..]));
//! ```

pub mod body;
pub mod header;
mod request_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
