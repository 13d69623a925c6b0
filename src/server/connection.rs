// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;

use crate::api::Router;
use crate::config::{Config, PerformanceConfig};
use crate::jobs::JobClient;
use crate::logger;

/// Per-connection limits and logging switches
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub keep_alive: bool,
    /// Limit on receiving a request head, `None` to wait indefinitely.
    /// Response bodies are never cut off by a timer.
    pub header_read_timeout: Option<Duration>,
    /// How long open connections may keep running after shutdown
    pub shutdown_grace: Duration,
    pub max_connections: Option<u64>,
    pub log_accepts: bool,
}

impl ConnectionSettings {
    pub fn from_config(config: &Config) -> Self {
        let PerformanceConfig {
            keep_alive_timeout,
            read_timeout,
            write_timeout,
            max_connections,
        } = config.performance;

        Self {
            keep_alive: keep_alive_timeout > 0,
            header_read_timeout: (read_timeout > 0).then_some(Duration::from_secs(read_timeout)),
            shutdown_grace: Duration::from_secs(write_timeout),
            max_connections,
            log_accepts: config.logging.access_log,
        }
    }
}

/// Accept a connection, enforcing the connection limit
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `router` - Shared request router
/// * `conn_counter` - Active connection counter
/// * `settings` - Limits and timeouts
pub fn accept_connection<C: JobClient>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    router: &Arc<Router<C>>,
    conn_counter: &Arc<AtomicUsize>,
    settings: &ConnectionSettings,
) {
    // Increment first, then check, so two racing accepts cannot both slip in
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = settings.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    if settings.log_accepts {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(router),
        Arc::clone(conn_counter),
        settings.clone(),
    );
}

/// Serve one connection on a spawned task.
///
/// A client that stalls before sending its request head is dropped after
/// `header_read_timeout`. Once a response is streaming the connection lives
/// as long as the client keeps reading; if the client goes away the body is
/// dropped, which closes its file.
fn handle_connection<C: JobClient>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    router: Arc<Router<C>>,
    conn_counter: Arc<AtomicUsize>,
    settings: ConnectionSettings,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(settings.keep_alive);
        builder.timer(TokioTimer::new());
        if let Some(limit) = settings.header_read_timeout {
            builder.header_read_timeout(limit);
        }

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let router = Arc::clone(&router);
                async move { router.handle_request(req, peer_addr).await }
            }),
        );

        if let Err(err) = conn.await {
            if err.is_timeout() {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} sent no request head in time"
                ));
            } else {
                logger::log_connection_error(&err);
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
