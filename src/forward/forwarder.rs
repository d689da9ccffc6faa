//! Backend forwarder.
//!
//! # Responsibilities
//! - Open one fresh connection per forwarded request
//! - Write the raw client request verbatim
//! - Optionally read back exactly one response
//! - Bound the whole exchange with a deadline
//!
//! # Design Decisions
//! - No pooling: the connection is dropped (closed) on every exit path
//! - Failures are logged with backend and phase, then reported as `None`
//! - Deadline expiry is handled exactly like an unreachable backend

use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};

use crate::config::{LimitsConfig, ProxyConfig};
use crate::forward::error::ForwardError;
use crate::forward::reader::{read_response, ReadLimits};
use crate::http::response::BackendResponse;
use crate::load_balancer::BackendAddr;
use crate::observability::metrics;

/// Sends raw requests to backends.
///
/// Cheap to clone; fire-and-forget tasks take their own copy.
#[derive(Debug, Clone)]
pub struct Forwarder {
    timeout: Duration,
    limits: ReadLimits,
}

impl Forwarder {
    pub fn new(timeout: Duration, limits: &LimitsConfig) -> Self {
        Self {
            timeout,
            limits: ReadLimits {
                max_headers: limits.max_headers,
                max_bytes: limits.max_response_bytes,
            },
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(config.timeouts.backend(), &config.limits)
    }

    /// Forward `request` and, if `expect_response`, return the serialized reply.
    ///
    /// Returns `None` for fire-and-forget calls and for every failure; failures
    /// are logged here and never surface to the caller.
    pub async fn forward(&self, backend: &BackendAddr, request: &[u8], expect_response: bool) -> Option<Bytes> {
        let mode = if expect_response { "proxy" } else { "fire-and-forget" };
        match self.try_forward(backend, request, expect_response).await {
            Ok(response) => {
                metrics::record_forwarded(backend, mode);
                response.map(|r| r.to_bytes())
            }
            Err(e) => {
                tracing::warn!(
                    backend = %backend,
                    phase = e.phase(),
                    mode,
                    error = %e,
                    "Backend exchange failed"
                );
                metrics::record_backend_failure(backend, e.phase());
                None
            }
        }
    }

    /// Same exchange as [`forward`](Self::forward) with the failure reason kept.
    pub async fn try_forward(
        &self,
        backend: &BackendAddr,
        request: &[u8],
        expect_response: bool,
    ) -> Result<Option<BackendResponse>, ForwardError> {
        tokio::time::timeout(self.timeout, self.connect_and_exchange(backend, request, expect_response))
            .await
            .map_err(|_| ForwardError::Timeout(self.timeout))?
    }

    async fn connect_and_exchange(
        &self,
        backend: &BackendAddr,
        request: &[u8],
        expect_response: bool,
    ) -> Result<Option<BackendResponse>, ForwardError> {
        match backend {
            BackendAddr::Unix(path) => {
                let stream = UnixStream::connect(path).await.map_err(ForwardError::Connect)?;
                self.exchange(stream, request, expect_response).await
            }
            BackendAddr::Tcp(authority) => {
                let stream = TcpStream::connect(authority.as_str())
                    .await
                    .map_err(ForwardError::Connect)?;
                if let Err(e) = stream.set_nodelay(true) {
                    tracing::debug!(backend = %authority, error = %e, "Failed to set TCP_NODELAY");
                }
                self.exchange(stream, request, expect_response).await
            }
        }
    }

    async fn exchange<S>(
        &self,
        mut stream: S,
        request: &[u8],
        expect_response: bool,
    ) -> Result<Option<BackendResponse>, ForwardError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        stream.write_all(request).await.map_err(ForwardError::Write)?;

        if !expect_response {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!(error = %e, "Backend shutdown failed");
            }
            return Ok(None);
        }

        let response = read_response(&mut stream, self.limits).await?;
        tracing::trace!(
            status = response.status(),
            body_bytes = response.body.len(),
            "Backend response read"
        );
        Ok(Some(response))
    }
}
