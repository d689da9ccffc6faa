//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request classified (not rejected)
//!     → pool.rs (fixed backend list)
//!     → round_robin.rs (atomic cursor, index = cursor++ % len)
//!     → backend.rs (address handed to the forwarder)
//! ```
//!
//! # Design Decisions
//! - Pool is built once at startup and never mutated
//! - The cursor is the only shared mutable state; a single atomic, no lock
//! - No health tracking: every configured backend is always eligible

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::BackendAddr;
pub use pool::{BackendPool, PoolError};
