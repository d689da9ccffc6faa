//! Payments load balancer library.
//!
//! A minimal HTTP/1.x reverse proxy that spreads payment traffic over a fixed
//! set of backends in strict round-robin order.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod routing;

// Traffic management
pub mod forward;
pub mod load_balancer;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
