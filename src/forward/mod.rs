//! Backend forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Raw client request + selected backend
//!     → forwarder.rs (connect, write verbatim, deadline)
//!     → reader.rs (one framed response, only when the route awaits it)
//!     → http::response (re-serialize status line + headers + body)
//!     → Option<Bytes> back to the connection handler
//! ```
//!
//! # Design Decisions
//! - Failures stay inside this module; callers only see "no response"
//! - Nothing is retried

pub mod error;
pub mod forwarder;
pub mod reader;

pub use error::ForwardError;
pub use forwarder::Forwarder;
pub use reader::{read_response, ReadLimits};
