//! Accept loop tying a listener to a handler.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::connection::HttpConnection;
use crate::handler::Handler;

/// Accepts connections on `listener` and serves each on its own task until `shutdown` is
/// cancelled.
///
/// Connections get a child token of `shutdown`, so cancelling it also stops idle and in-flight
/// connections. Returns once the listener is closed and every connection task has finished.
pub async fn serve<H>(listener: TcpListener, handler: Arc<H>, shutdown: CancellationToken)
where
    H: Handler + 'static,
{
    let local_addr = listener.local_addr().ok();
    info!(address = ?local_addr, "start listening");

    let connections = TaskTracker::new();

    loop {
        let (tcp_stream, remote_addr) = select! {
            biased;
            _ = shutdown.cancelled() => {
                info!(address = ?local_addr, "stop listening");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            },
        };

        let handler = Arc::clone(&handler);
        let connection_shutdown = shutdown.child_token();

        connections.spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let connection = HttpConnection::new(reader, writer);
            match connection.process(handler, connection_shutdown).await {
                Ok(_) => {
                    info!(%remote_addr, "finished process, connection shutdown");
                }
                Err(e) => {
                    error!(%remote_addr, cause = %e, "service has error, connection shutdown");
                }
            }
        });
    }

    drop(listener);
    connections.close();
    connections.wait().await;
    info!(address = ?local_addr, "all connections closed");
}
