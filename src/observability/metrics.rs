//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): client replies by route, status
//! - `proxy_forwarded_total` (counter): successful backend exchanges by backend, mode
//! - `proxy_backend_failures_total` (counter): failed exchanges by backend, phase
//! - `proxy_active_connections` (gauge): client connections being served
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing unless `init_metrics` ran.

use std::net::SocketAddr;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::load_balancer::BackendAddr;
use crate::routing::Route;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(route: Route, status: u16) {
    ::metrics::counter!(
        "proxy_requests_total",
        "route" => route.as_str(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_forwarded(backend: &BackendAddr, mode: &'static str) {
    ::metrics::counter!(
        "proxy_forwarded_total",
        "backend" => backend.to_string(),
        "mode" => mode
    )
    .increment(1);
}

pub fn record_backend_failure(backend: &BackendAddr, phase: &'static str) {
    ::metrics::counter!(
        "proxy_backend_failures_total",
        "backend" => backend.to_string(),
        "phase" => phase
    )
    .increment(1);
}

pub fn connection_opened() {
    ::metrics::gauge!("proxy_active_connections").increment(1.0);
}

pub fn connection_closed() {
    ::metrics::gauge!("proxy_active_connections").decrement(1.0);
}
