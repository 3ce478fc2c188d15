//! Decoder for the chunked transfer coding.
//!
//! See [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112.html#section-7.1).
//! Chunk data is accumulated until the last chunk and the trailer section have been read;
//! chunk extensions and trailer fields are discarded.

use std::cmp;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::ParseError;

/// Longest chunk-size or trailer line accepted before giving up on the peer.
const MAX_LINE_BYTES: usize = 4 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    body: BytesMut,
    max_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size line
    Size,
    /// Read chunk data, with the number of bytes still missing
    Data(u64),
    /// Read the CRLF closing a chunk
    DataCrlf,
    /// Read trailer lines until the empty line
    Trailer,
    /// The whole body has been read
    End,
}

impl ChunkedDecoder {
    pub fn new(max_size: u64) -> Self {
        Self { state: ChunkedState::Size, body: BytesMut::new(), max_size }
    }
}

impl Decoder for ChunkedDecoder {
    type Item = Bytes;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            self.state = match self.state {
                ChunkedState::Size => {
                    let Some(line) = take_line(src)? else {
                        return Ok(None);
                    };
                    let size = parse_chunk_size(&line)?;
                    trace!(size, "read chunk size");

                    if size == 0 {
                        ChunkedState::Trailer
                    } else {
                        let current_size = self.body.len() as u64 + size;
                        ensure!(current_size <= self.max_size, ParseError::too_large_body(current_size, self.max_size));
                        ChunkedState::Data(size)
                    }
                }

                ChunkedState::Data(remaining) => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    let len = cmp::min(remaining, src.len() as u64) as usize;
                    self.body.extend_from_slice(&src[..len]);
                    src.advance(len);

                    match remaining - len as u64 {
                        0 => ChunkedState::DataCrlf,
                        left => ChunkedState::Data(left),
                    }
                }

                ChunkedState::DataCrlf => {
                    if src.len() < 2 {
                        return Ok(None);
                    }
                    ensure!(&src[..2] == b"\r\n", ParseError::invalid_chunk("missing CRLF after chunk data"));
                    src.advance(2);
                    ChunkedState::Size
                }

                ChunkedState::Trailer => {
                    let Some(line) = take_line(src)? else {
                        return Ok(None);
                    };
                    if line.is_empty() { ChunkedState::End } else { ChunkedState::Trailer }
                }

                ChunkedState::End => {
                    trace!(len = self.body.len(), "finished reading chunked body");
                    return Ok(Some(std::mem::take(&mut self.body).freeze()));
                }
            };
        }
    }
}

/// Splits one CRLF terminated line off `src`, without the terminator.
fn take_line(src: &mut BytesMut) -> Result<Option<BytesMut>, ParseError> {
    match src.windows(2).position(|w| w == b"\r\n") {
        Some(end) => {
            let line = src.split_to(end);
            src.advance(2);
            Ok(Some(line))
        }
        None => {
            ensure!(src.len() <= MAX_LINE_BYTES, ParseError::invalid_chunk("chunk line too long"));
            Ok(None)
        }
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    let size = line.split(|b| *b == b';').next().unwrap_or_default().trim_ascii();
    ensure!(!size.is_empty(), ParseError::invalid_chunk("empty chunk size"));

    let size = std::str::from_utf8(size).map_err(|_| ParseError::invalid_chunk("chunk size is not ascii"))?;
    u64::from_str_radix(size, 16).map_err(|_| ParseError::invalid_chunk(format!("invalid chunk size {size}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: u64 = 1024;

    #[test]
    fn decodes_chunks_with_extension_and_trailer() {
        let mut buffer = BytesMut::from(&b"4\r\nWiki\r\n5;name=value\r\npedia\r\n0\r\nExpires: never\r\n\r\nGET"[..]);
        let mut decoder = ChunkedDecoder::new(MAX);

        let body = decoder.decode(&mut buffer).unwrap().unwrap();

        assert_eq!(&body[..], b"Wikipedia");
        assert_eq!(&buffer[..], b"GET");
    }

    #[test]
    fn resumes_across_partial_reads() {
        let mut decoder = ChunkedDecoder::new(MAX);
        let mut buffer = BytesMut::from(&b"A\r\n0123"[..]);

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        buffer.extend_from_slice(b"456789\r");
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        buffer.extend_from_slice(b"\n0\r\n\r\n");

        let body = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&body[..], b"0123456789");
        assert!(buffer.is_empty());
    }

    #[test]
    fn rejects_bad_size() {
        let mut buffer = BytesMut::from(&b"zz\r\n"[..]);
        let mut decoder = ChunkedDecoder::new(MAX);
        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::InvalidChunk { .. })));
    }

    #[test]
    fn rejects_missing_crlf_after_data() {
        let mut buffer = BytesMut::from(&b"2\r\nhiXX"[..]);
        let mut decoder = ChunkedDecoder::new(MAX);
        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::InvalidChunk { .. })));
    }

    #[test]
    fn enforces_body_limit() {
        let mut buffer = BytesMut::from(&b"800\r\n"[..]);
        let mut decoder = ChunkedDecoder::new(MAX);
        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::TooLargeBody { .. })));
    }
}
