//! Request body decoding.
//!
//! - [`ChunkedDecoder`]: chunked transfer coding (RFC 9112 §7.1)
//! - [`LengthDecoder`]: `Content-Length` framed bodies
//! - [`PayloadDecoder`]: selects one of the above from the request head
//!
//! Bodies are buffered completely; a fake service has to see the whole request before it
//! can match it against programmed patterns.

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;

pub use payload_decoder::MAX_BODY_BYTES;
pub use payload_decoder::PayloadDecoder;
