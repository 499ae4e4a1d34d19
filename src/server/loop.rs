// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;

use super::connection::{accept_connection, ServerContext};
use crate::logger;

/// Accept loop; returns once `shutdown` completes
///
/// Connections already being served keep running on their own tasks.
pub async fn start_server_loop<F>(listener: TcpListener, ctx: Arc<ServerContext>, shutdown: F)
where
    F: Future<Output = ()>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &ctx, &active_connections);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to accept connection");
                    }
                }
            }

            () = &mut shutdown => {
                tracing::info!(
                    active = active_connections.load(Ordering::SeqCst),
                    "listener closed"
                );
                break;
            }
        }
    }

    logger::log_shutdown("accept loop stopped");
}
