use bytes::Bytes;

/// A decoded or to-be-encoded HTTP message part.
///
/// Bodies are buffered: a message is always one `Header` followed by exactly one `Payload`
/// holding the complete body (possibly empty).
#[derive(Debug)]
pub enum Message<T> {
    /// The head of the message (request line or status line plus headers).
    Header(T),
    /// The complete message body.
    Payload(Bytes),
}

impl<T> Message<T> {
    #[inline]
    pub fn is_payload(&self) -> bool {
        matches!(self, Message::Payload(_))
    }

    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, Message::Header(_))
    }

    /// Consumes the message, returning the body when this is a payload.
    pub fn into_payload(self) -> Option<Bytes> {
        match self {
            Message::Header(_) => None,
            Message::Payload(bytes) => Some(bytes),
        }
    }
}

/// How the body of a request is framed on the wire.
///
/// Determined from `Content-Length` and `Transfer-Encoding` per RFC 9112 §6.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Body with known length in bytes
    Length(u64),
    /// Body using chunked transfer coding
    Chunked,
    /// No body
    Empty,
}

impl PayloadSize {
    #[inline]
    pub fn new_length(length: u64) -> Self {
        if length == 0 { PayloadSize::Empty } else { PayloadSize::Length(length) }
    }

    #[inline]
    pub fn new_chunked() -> Self {
        PayloadSize::Chunked
    }

    #[inline]
    pub fn new_empty() -> Self {
        PayloadSize::Empty
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }
}

impl From<Bytes> for Message<()> {
    fn from(bytes: Bytes) -> Self {
        Self::Payload(bytes)
    }
}
