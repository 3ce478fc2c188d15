use crate::codec::header::HeaderEncoder;
use crate::protocol::{Message, ResponseHead, SendError};
use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::error;

/// Encodes a response as a head followed by exactly one payload.
///
/// The head carries the body length so the header encoder can frame it; the payload may be
/// empty (e.g. for `HEAD` requests) even when the announced length is not.
#[derive(Debug, Default)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
    payload_pending: bool,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encoder<Message<(ResponseHead, u64)>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message<(ResponseHead, u64)>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header(head) => {
                if self.payload_pending {
                    error!("expect payload item but receive response head");
                    return Err(SendError::invalid_response("response head sent twice"));
                }
                self.payload_pending = true;
                self.header_encoder.encode(head, dst)
            }

            Message::Payload(bytes) => {
                if !self.payload_pending {
                    error!("expect response header but receive payload item");
                    return Err(SendError::invalid_response("payload sent before response head"));
                }
                self.payload_pending = false;
                dst.extend_from_slice(&bytes);
                Ok(())
            }
        }
    }
}
