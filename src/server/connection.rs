// Connection handling module
// Serves one TCP connection with hyper and hands each request to the mux

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};

use crate::config::Config;
use crate::error::RestError;
use crate::http::response::HttpResponse;
use crate::logger::{self, AccessLogEntry};
use crate::mux::Mux;

/// Everything a connection task needs, shared across connections
pub struct ServerContext {
    pub mux: Arc<Mux>,
    /// Largest request body accepted, in bytes
    pub max_body_size: u64,
    /// Idle time allowed between requests on a kept-alive connection
    pub keep_alive: Duration,
    /// Time allowed to receive request headers
    pub read_timeout: Duration,
    /// Upper bound on a connection's lifetime
    pub connection_timeout: Duration,
    pub max_connections: Option<u64>,
    /// Access log format, `None` when access logging is off
    pub access_log: Option<String>,
}

impl ServerContext {
    /// Context with stock limits and no access log
    pub fn new(mux: Arc<Mux>) -> Self {
        Self {
            mux,
            max_body_size: 10 * 1024 * 1024,
            keep_alive: Duration::from_secs(75),
            read_timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(75),
            max_connections: None,
            access_log: None,
        }
    }

    pub fn from_config(mux: Arc<Mux>, config: &Config) -> Self {
        let perf = &config.performance;
        Self {
            mux,
            max_body_size: config.http.max_body_size,
            keep_alive: perf.keep_alive(),
            read_timeout: perf.read(),
            connection_timeout: perf.keep_alive().max(perf.read()).max(perf.write()),
            max_connections: perf.max_connections,
            access_log: config
                .logging
                .access_log
                .then(|| config.logging.access_log_format.clone()),
        }
    }
}

/// Accept a connection, enforcing the connection limit.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    ctx: &Arc<ServerContext>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = ctx.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_connection_rejected(&peer_addr, max_conn);
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(ctx), Arc::clone(conn_counter));
}

/// Serve a connection in a spawned task, decrementing the counter when done.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    ctx: Arc<ServerContext>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_duration = ctx.connection_timeout;

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(!ctx.keep_alive.is_zero())
            .header_read_timeout(ctx.read_timeout);

        let service_ctx = Arc::clone(&ctx);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handle_request(req, peer_addr, Arc::clone(&service_ctx))),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                tracing::debug!(
                    peer = %peer_addr,
                    timeout_secs = timeout_duration.as_secs(),
                    "connection timed out"
                );
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Collect the body under the size limit, then dispatch off the reactor.
async fn handle_request(
    req: Request<Incoming>,
    peer_addr: SocketAddr,
    ctx: Arc<ServerContext>,
) -> Result<HttpResponse, Infallible> {
    let started = Instant::now();
    let mut entry = ctx
        .access_log
        .as_ref()
        .map(|_| AccessLogEntry::from_request(peer_addr.ip(), &req));

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(ctx.max_body_size).unwrap_or(usize::MAX);
    let response = match Limited::new(body, limit).collect().await {
        Ok(collected) => {
            let req = Request::from_parts(parts, collected.to_bytes());
            let mux = Arc::clone(&ctx.mux);
            match tokio::task::spawn_blocking(move || mux.serve(&req)).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "dispatch task failed");
                    let mut response = RestError::internal(e.to_string()).to_response();
                    ctx.mux.stamp(&mut response);
                    response
                }
            }
        }
        Err(e) => {
            let err = if e.downcast_ref::<LengthLimitError>().is_some() {
                RestError::PayloadTooLarge {
                    limit: ctx.max_body_size,
                }
            } else {
                RestError::BadRequest(format!("failed to read request body: {e}"))
            };
            tracing::debug!(peer = %peer_addr, error = %err, "request body rejected");
            let mut response = err.to_response();
            ctx.mux.stamp(&mut response);
            response
        }
    };

    if let (Some(entry), Some(format)) = (entry.as_mut(), ctx.access_log.as_deref()) {
        entry.complete(&response, started.elapsed());
        logger::log_access(entry, format);
    }
    Ok(response)
}
