//! HTTP response head encoder.
//!
//! Serializes the status line and header fields. Framing headers are owned by the encoder:
//! any `Content-Length` or `Transfer-Encoding` on the head is replaced by a `Content-Length`
//! matching the body that is actually sent, while every other field is written as given.

use crate::protocol::{ResponseHead, SendError, reason_of};

use bytes::{BufMut, BytesMut};

use http::{StatusCode, Version, header};
use std::io;
use std::io::{ErrorKind, Write};
use tokio_util::codec::Encoder;
use tracing::error;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encodes a [`ResponseHead`] together with the length of the body that follows.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl Encoder<(ResponseHead, u64)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (ResponseHead, u64), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut head, content_length) = item;

        dst.reserve(INIT_HEADER_SIZE);
        match head.version() {
            Version::HTTP_11 | Version::HTTP_10 => {
                write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", head.status().as_str(), reason_of(&head))?;
            }
            v => {
                error!(http_version = ?v, "unsupported http version");
                return Err(io::Error::from(ErrorKind::Unsupported).into());
            }
        }

        head.headers_mut().remove(header::TRANSFER_ENCODING);
        head.headers_mut().remove(header::CONTENT_LENGTH);

        for (header_name, header_value) in head.headers() {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }

        if allows_body(head.status()) {
            write!(FastWrite(dst), "content-length: {content_length}\r\n")?;
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// 1xx, 204 and 304 responses never carry a body or a `Content-Length`.
pub(crate) fn allows_body(status: StatusCode) -> bool {
    !(status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED)
}

/// `io::Write` adapter over `BytesMut`, space is reserved up front.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
