//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse CLI → Load + validate config → Logging → Metrics → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal (non-zero exit)
//! - Shutdown has a deadline: in-flight connections get `shutdown_drain_secs`
//! - Detached fire-and-forget forwards are not awaited

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
