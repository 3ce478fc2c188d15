//! HTTP request decoder.
//!
//! Coordinates header and body parsing: every request is emitted as a
//! [`Message::Header`] followed by one [`Message::Payload`] with the complete body. The
//! split lets the connection answer `Expect: 100-continue` before the body arrives.

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Message, ParseError, PayloadSize, RequestHead};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Two-phase request decoder.
///
/// `payload_decoder` is `None` while a head is being parsed and `Some` while the body of the
/// current request is being read.
#[derive(Debug, Default)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<(RequestHead, PayloadSize)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let Some(body) = payload_decoder.decode(src)? else {
                return Ok(None);
            };
            // no need payload decoder in this request now
            self.payload_decoder = None;
            return Ok(Some(Message::Payload(body)));
        }

        let message = match self.header_decoder.decode(src)? {
            Some((head, payload_size)) => {
                self.payload_decoder = Some(PayloadDecoder::for_payload(payload_size)?);
                Some(Message::Header((head, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }
}
