//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent the address of a single backend process
//! - Parse the address strings found in configuration
//!
//! A plain path or `unix:<path>` names a Unix domain socket; `tcp://host:port`
//! names a TCP backend, which is handy when running the backends outside of
//! a shared socket directory.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a backend address string cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddrParseError {
    #[error("address is empty")]
    Empty,

    #[error("tcp address must look like host:port")]
    MissingPort,
}

/// The address of a single backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendAddr {
    /// Unix domain socket path.
    Unix(PathBuf),
    /// `host:port` reachable over TCP.
    Tcp(String),
}

impl FromStr for BackendAddr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(authority) = s.strip_prefix("tcp://") {
            return match authority.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                    Ok(BackendAddr::Tcp(authority.to_string()))
                }
                _ => Err(AddrParseError::MissingPort),
            };
        }

        let path = s.strip_prefix("unix:").unwrap_or(s);
        if path.is_empty() {
            return Err(AddrParseError::Empty);
        }
        Ok(BackendAddr::Unix(PathBuf::from(path)))
    }
}

impl fmt::Display for BackendAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendAddr::Unix(path) => write!(f, "{}", path.display()),
            BackendAddr::Tcp(authority) => write!(f, "tcp://{}", authority),
        }
    }
}
