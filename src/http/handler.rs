//! Per-connection request handling.
//!
//! # Responsibilities
//! - Accumulate inbound bytes until one request is completely framed
//! - Classify it and pick a backend
//! - Forward in the background or wait for the backend, per route
//! - Write exactly one reply, then close
//!
//! # Design Decisions
//! - Bytes arrive in arbitrary-sized reads; nothing is classified before the
//!   framer says the message is complete
//! - A head httparse refuses is still classified by its request line, as a
//!   bodyless request ending at the first empty line; only a line without
//!   method and path gets 400
//! - The round-robin cursor advances once for every request with a valid
//!   request line, before any forwarding
//! - No keep-alive: one request per client connection

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;

use crate::config::{LimitsConfig, ProxyConfig};
use crate::forward::Forwarder;
use crate::http::framing::{head_end, FramingError, RequestFramer};
use crate::http::response::{self, synthesized_status};
use crate::load_balancer::{BackendPool, PoolError};
use crate::net::ConnectionId;
use crate::observability::metrics;
use crate::routing::{self, Route};

/// Shared, immutable state for every connection.
#[derive(Debug)]
pub struct AppState {
    pub pool: BackendPool,
    pub forwarder: Forwarder,
    pub limits: LimitsConfig,
    pub client_read_timeout: Duration,
}

impl AppState {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, PoolError> {
        Ok(Self {
            pool: BackendPool::from_config(&config.backends)?,
            forwarder: Forwarder::from_config(config),
            limits: config.limits.clone(),
            client_read_timeout: config.timeouts.client_read(),
        })
    }
}

/// Outcome of reading from the client.
#[derive(Debug)]
enum Inbound {
    /// One complete request.
    Request(Bytes),
    /// Reply without classifying (unframeable or too large).
    Reply(&'static [u8]),
    /// Peer closed without sending anything.
    Closed,
    /// Client stalled before completing a request.
    TimedOut,
}

/// Serve one client connection from first byte to close.
///
/// Every event emitted while serving, detached forwards included, carries
/// the connection id.
pub async fn handle_connection<S>(stream: S, state: Arc<AppState>, id: ConnectionId) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    serve(stream, state)
        .instrument(tracing::debug_span!("connection", id = %id))
        .await
}

async fn serve<S>(mut stream: S, state: Arc<AppState>) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let reply = match read_request(&mut stream, &state).await? {
        Inbound::Request(request) => dispatch(request, &state).await,
        Inbound::Reply(reply) => {
            metrics::record_request(Route::Reject, synthesized_status(reply));
            Bytes::from_static(reply)
        }
        Inbound::Closed => {
            tracing::trace!("Client closed without a request");
            return Ok(());
        }
        Inbound::TimedOut => {
            tracing::debug!("Client request timed out");
            return Ok(());
        }
    };

    stream.write_all(&reply).await?;
    stream.shutdown().await
}

async fn read_request<S>(stream: &mut S, state: &AppState) -> std::io::Result<Inbound>
where
    S: AsyncRead + Unpin,
{
    let max_bytes = state.limits.max_request_bytes;
    let mut buf = BytesMut::with_capacity(4096);
    let mut framer = RequestFramer::new(state.limits.max_headers, max_bytes);
    // Set once httparse refuses the head; from then on only the empty line
    // ending the head is looked for.
    let mut lenient = false;
    let deadline = tokio::time::Instant::now() + state.client_read_timeout;

    loop {
        let read = tokio::time::timeout_at(deadline, stream.read_buf(&mut buf)).await;
        let n = match read {
            Ok(result) => result?,
            Err(_) => return Ok(Inbound::TimedOut),
        };

        if n == 0 {
            return Ok(match (buf.is_empty(), lenient) {
                (true, _) => Inbound::Closed,
                (false, true) => Inbound::Request(buf.freeze()),
                // An unfinished message cannot be forwarded.
                (false, false) => Inbound::Reply(response::BAD_REQUEST),
            });
        }

        if !lenient {
            match framer.poll(&buf) {
                Ok(Some(len)) => {
                    buf.truncate(len);
                    return Ok(Inbound::Request(buf.freeze()));
                }
                Ok(None) => continue,
                Err(FramingError::TooLarge(limit)) => return Ok(too_large(limit)),
                Err(FramingError::Head(e)) if e != httparse::Error::TooManyHeaders => {
                    tracing::debug!(error = %e, "Unparseable head, classifying by request line");
                    lenient = true;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Unframeable request");
                    return Ok(Inbound::Reply(response::BAD_REQUEST));
                }
            }
        }

        match head_end(&buf) {
            Some(len) => {
                buf.truncate(len);
                return Ok(Inbound::Request(buf.freeze()));
            }
            None if buf.len() > max_bytes => return Ok(too_large(max_bytes)),
            None => {}
        }
    }
}

fn too_large(limit: usize) -> Inbound {
    tracing::debug!(limit, "Request exceeds size limit");
    Inbound::Reply(response::PAYLOAD_TOO_LARGE)
}

/// Classify a complete request, forward it, and produce the client reply.
pub async fn dispatch(request: Bytes, state: &AppState) -> Bytes {
    let route = routing::route_request(&request);
    if route == Route::Reject {
        metrics::record_request(route, 400);
        return Bytes::from_static(response::BAD_REQUEST);
    }

    let backend = state.pool.next();
    tracing::debug!(route = %route, backend = %backend, "Request classified");

    let reply = if !route.forwards() {
        Bytes::from_static(response::NOT_FOUND)
    } else if route.awaits_backend() {
        state
            .forwarder
            .forward(backend, &request, true)
            .await
            .unwrap_or_else(|| Bytes::from_static(response::BAD_GATEWAY))
    } else {
        let forwarder = state.forwarder.clone();
        let backend = Arc::clone(backend);
        tokio::spawn(
            async move {
                forwarder.forward(&backend, &request, false).await;
            }
            .in_current_span(),
        );
        if route == Route::AckPayment {
            Bytes::from_static(response::ACK_PAYMENT)
        } else {
            Bytes::from_static(response::ACK_EMPTY)
        }
    };

    metrics::record_request(route, synthesized_status(&reply));
    reply
}
