use std::error::Error;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::{CONNECTION, HeaderValue};
use http::{Method, Response, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::select;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::codec::header::allows_body;
use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::{HttpError, Message, ParseError, RequestHead, ResponseHead, SendError, error_response};

/// One HTTP/1.1 connection.
///
/// Requests are read one at a time, each body is buffered before the handler runs, and the
/// connection stays open while the client allows it. Malformed input gets a `400` and closes
/// the connection.
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    /// Serves requests until the peer closes, asks to close, or `shutdown` is cancelled.
    ///
    /// A cancelled request body read closes the connection without a response; a cancelled
    /// handler call is answered with `503` before closing.
    pub async fn process<H>(mut self, handler: Arc<H>, shutdown: CancellationToken) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            let next = select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("shutdown requested, stop reading requests");
                    return Ok(());
                }
                next = self.framed_read.next() => next,
            };

            match next {
                Some(Ok(Message::Header((head, _)))) => {
                    if !self.do_process(head, handler.as_ref(), &shutdown).await? {
                        return Ok(());
                    }
                }

                Some(Ok(Message::Payload(_))) => {
                    error!("receive body while expecting a request head");
                    self.send_error(StatusCode::BAD_REQUEST).await?;
                    return Err(ParseError::invalid_body("need header while receive body").into());
                }

                Some(Err(e)) => {
                    error!(cause = %e, "can't receive next request");
                    self.send_error(StatusCode::BAD_REQUEST).await?;
                    return Err(e.into());
                }

                None => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
            }
        }
    }

    /// Handles one request, returns whether the connection may be reused.
    async fn do_process<H>(&mut self, head: RequestHead, handler: &H, shutdown: &CancellationToken) -> Result<bool, HttpError>
    where
        H: Handler,
    {
        if head.expects_continue() {
            let writer = self.framed_write.get_mut();
            writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await.map_err(SendError::io)?;
            writer.flush().await.map_err(SendError::io)?;
            info!("receive expect request header, sent continue response");
        }

        let next = select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("shutdown requested while reading request body, close connection");
                return Ok(false);
            }
            next = self.framed_read.next() => next,
        };

        let body = match next {
            Some(Ok(Message::Payload(body))) => body,
            Some(Ok(Message::Header(_))) => {
                error!("receive request head while expecting a body");
                self.send_error(StatusCode::BAD_REQUEST).await?;
                return Err(ParseError::invalid_body("need body while receive header").into());
            }
            Some(Err(e)) => {
                error!(cause = %e, "can't read request body");
                self.send_error(StatusCode::BAD_REQUEST).await?;
                return Err(e.into());
            }
            None => {
                info!("connection closed before the request body was complete");
                return Ok(false);
            }
        };

        let keep_alive = head.keep_alive();
        let head_only = *head.method() == Method::HEAD;

        let result = select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("shutdown requested while handling request, close connection");
                self.send_error(StatusCode::SERVICE_UNAVAILABLE).await?;
                return Ok(false);
            }
            result = handler.call(head.body(body)) => result,
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let e: Box<dyn Error + Send + Sync> = e.into();
                error!(cause = %e, "handle request error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        self.send_response(response, head_only, keep_alive).await?;
        Ok(keep_alive)
    }

    async fn send_error(&mut self, status: StatusCode) -> Result<(), HttpError> {
        self.send_response(error_response(status), false, false).await
    }

    async fn send_response(&mut self, response: Response<Bytes>, head_only: bool, keep_alive: bool) -> Result<(), HttpError> {
        let (parts, body) = response.into_parts();
        let mut head = ResponseHead::from_parts(parts, ());
        if !keep_alive {
            head.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
        }

        let payload = if head_only || !allows_body(head.status()) { Bytes::new() } else { body.clone() };

        // feed the head, the payload send flushes both
        self.framed_write.feed(Message::Header((head, body.len() as u64))).await?;
        self.framed_write.send(Message::Payload(payload)).await?;
        Ok(())
    }
}
