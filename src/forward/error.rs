//! Backend forwarding errors.

use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::http::framing::FramingError;

/// Everything that can go wrong during one backend exchange.
///
/// These never reach the client; the forwarder logs them and reports
/// "no response".
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("malformed response: {0}")]
    Malformed(#[from] FramingError),

    #[error("backend closed the connection before a complete response")]
    PrematureClose,

    #[error("response exceeds {0} bytes")]
    TooLarge(usize),

    #[error("no complete exchange within {0:?}")]
    Timeout(Duration),
}

impl ForwardError {
    /// The stage of the exchange that failed, for logs and metrics.
    pub fn phase(&self) -> &'static str {
        match self {
            ForwardError::Connect(_) => "connect",
            ForwardError::Write(_) => "write",
            ForwardError::Read(_)
            | ForwardError::Malformed(_)
            | ForwardError::PrematureClose
            | ForwardError::TooLarge(_) => "read",
            ForwardError::Timeout(_) => "timeout",
        }
    }
}
