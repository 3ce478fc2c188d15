//! Request head decoding and response head encoding.
//!
//! - [`HeaderDecoder`]: parses the request line and fields, enforces the header limits
//! - [`HeaderEncoder`]: writes the status line and fields with an exact `Content-Length`

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_decoder::MAX_HEADER_BYTES;
pub use header_decoder::MAX_HEADER_NUM;
pub use header_encoder::HeaderEncoder;
pub(crate) use header_encoder::allows_body;
