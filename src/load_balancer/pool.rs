//! Backend pool management.
//!
//! # Responsibilities
//! - Hold the fixed, ordered list of backends established at startup
//! - Apply round-robin selection across it

use std::sync::Arc;
use thiserror::Error;

use crate::load_balancer::{
    backend::{AddrParseError, BackendAddr},
    round_robin::RoundRobin,
};

/// Error building a pool from configured addresses.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("backend pool must contain at least one address")]
    Empty,

    #[error("invalid backend address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddrParseError,
    },
}

/// Immutable set of backends plus the shared round-robin cursor.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Arc<BackendAddr>>,
    cursor: RoundRobin,
}

impl BackendPool {
    /// Create a pool from already-parsed addresses.
    pub fn new(backends: Vec<BackendAddr>) -> Result<Self, PoolError> {
        if backends.is_empty() {
            return Err(PoolError::Empty);
        }
        Ok(Self {
            backends: backends.into_iter().map(Arc::new).collect(),
            cursor: RoundRobin::new(),
        })
    }

    /// Create a pool from configuration strings.
    pub fn from_config(addresses: &[String]) -> Result<Self, PoolError> {
        let backends = addresses
            .iter()
            .map(|address| {
                address.parse().map_err(|source| PoolError::InvalidAddress {
                    address: address.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pool = Self::new(backends)?;
        for (i, backend) in pool.backends.iter().enumerate() {
            tracing::debug!(index = i, backend = %backend, "Backend registered");
        }
        Ok(pool)
    }

    /// Select the next backend in round-robin order.
    ///
    /// Lock-free and allocation-free; callers clone the `Arc` if they need to
    /// move the address into a task.
    pub fn next(&self) -> &Arc<BackendAddr> {
        &self.backends[self.cursor.next_index(self.backends.len())]
    }

    /// All backends in selection order.
    pub fn backends(&self) -> &[Arc<BackendAddr>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Always false; construction refuses empty pools.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
