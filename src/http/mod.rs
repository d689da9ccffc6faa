//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, per-connection task)
//!     → framing.rs (wait for one complete request)
//!     → handler.rs (route, pick backend, forward)
//!     → response.rs (fixed replies, backend response relay)
//!     → Send to client, close
//! ```
//!
//! # Design Decisions
//! - HTTP/1.x only, hand-framed on top of httparse
//! - Requests are forwarded as received; nothing is rewritten

pub mod framing;
pub mod handler;
pub mod response;
pub mod server;

pub use handler::{handle_connection, AppState};
pub use server::ProxyServer;
