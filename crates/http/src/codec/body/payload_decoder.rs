//! Unified decoder for request bodies.
//!
//! Picks the framing strategy from the [`PayloadSize`] found in the request head:
//! - Content-Length based bodies
//! - Chunked transfer coding
//! - Requests with no body

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::ensure;
use crate::protocol::{ParseError, PayloadSize};
use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

/// Largest request body buffered in memory.
pub const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Length(LengthDecoder),
    Chunked(ChunkedDecoder),
    NoBody,
}

impl PayloadDecoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new(MAX_BODY_BYTES)) }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    /// Builds the decoder for a request head, refusing bodies above [`MAX_BODY_BYTES`].
    pub fn for_payload(payload_size: PayloadSize) -> Result<Self, ParseError> {
        match payload_size {
            PayloadSize::Length(size) => {
                ensure!(size <= MAX_BODY_BYTES, ParseError::too_large_body(size, MAX_BODY_BYTES));
                Ok(Self::fix_length(size))
            }
            PayloadSize::Chunked => Ok(Self::chunked()),
            PayloadSize::Empty => Ok(Self::empty()),
        }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody)
    }
}

impl Decoder for PayloadDecoder {
    type Item = Bytes;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src),
            Kind::NoBody => Ok(Some(Bytes::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_strategy_from_payload_size() {
        assert!(PayloadDecoder::for_payload(PayloadSize::Empty).unwrap().is_empty());
        assert!(PayloadDecoder::for_payload(PayloadSize::Chunked).unwrap().is_chunked());
        assert!(PayloadDecoder::for_payload(PayloadSize::Length(MAX_BODY_BYTES + 1)).is_err());
    }

    #[test]
    fn empty_body_is_immediate() {
        let mut buffer = BytesMut::from(&b"GET / HTTP/1.1\r\n"[..]);
        let body = PayloadDecoder::empty().decode(&mut buffer).unwrap().unwrap();
        assert!(body.is_empty());
        assert_eq!(buffer.len(), 16);
    }
}
