//! Accept loop for the balancer.
//!
//! # Responsibilities
//! - Accept client connections under the listener's connection limit
//! - Spawn one task per connection running the handler
//! - Stop accepting on shutdown and drain in-flight connections

use std::sync::Arc;
use std::time::Duration;

use crate::config::ProxyConfig;
use crate::http::handler::{handle_connection, AppState};
use crate::lifecycle::ShutdownSignal;
use crate::load_balancer::PoolError;
use crate::net::{ConnectionTracker, Listener};

/// Reverse proxy server: owns the shared state and serves a listener.
#[derive(Debug)]
pub struct ProxyServer {
    state: Arc<AppState>,
    tracker: ConnectionTracker,
    drain_timeout: Duration,
}

impl ProxyServer {
    /// Build the server state from a validated configuration.
    pub fn new(config: &ProxyConfig) -> Result<Self, PoolError> {
        let state = AppState::from_config(config)?;
        tracing::info!(
            backends = state.pool.len(),
            backend_timeout_ms = config.timeouts.backend_ms,
            "Backend pool ready"
        );
        Ok(Self {
            state: Arc::new(state),
            tracker: ConnectionTracker::new(),
            drain_timeout: config.timeouts.shutdown_drain(),
        })
    }

    /// Serve connections until `shutdown` fires, then drain.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownSignal) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Proxy server starting");

        loop {
            let accepted = tokio::select! {
                _ = shutdown.wait() => break,
                accepted = listener.accept() => accepted,
            };

            let (stream, peer, permit) = match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    continue;
                }
            };

            if let Err(e) = stream.set_nodelay(true) {
                tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
            }

            let guard = self.tracker.track();
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let id = guard.id();
                tracing::trace!(connection_id = %id, peer = %peer, "Connection accepted");
                if let Err(e) = handle_connection(stream, state, id).await {
                    tracing::debug!(connection_id = %id, error = %e, "Connection error");
                }
                drop(permit);
                drop(guard);
            });
        }

        drop(listener);
        let active = self.tracker.active_count();
        tracing::info!(active_connections = active, "Stopped accepting, draining");

        if !self.tracker.wait_for_drain(self.drain_timeout).await {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Drain timeout elapsed with connections still open"
            );
        }

        tracing::info!("Proxy server stopped");
        Ok(())
    }
}
