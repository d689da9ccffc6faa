//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Complete inbound request (raw bytes)
//!     → request_line.rs (first line → method, path without query)
//!     → router.rs (exact (method, path) lookup)
//!     → Return: Route (forwarding mode, Reject or NotFound)
//! ```
//!
//! # Design Decisions
//! - Route table is static, immutable at runtime
//! - Deterministic: same input always matches same route

pub mod request_line;
pub mod router;

pub use request_line::RequestLine;
pub use router::{classify, Route, ROUTES};

/// Classify a complete raw request.
pub fn route_request(raw: &[u8]) -> Route {
    match RequestLine::parse(raw) {
        Some(line) => classify(line.method, line.path),
        None => Route::Reject,
    }
}
