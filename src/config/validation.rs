//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Refuse to start without at least one backend
//! - Validate value ranges (timeouts > 0, limits > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::load_balancer::backend::BackendAddr;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no backends configured (set EXTERNAL_HOSTS to a comma-separated list of socket paths)")]
    NoBackends,

    #[error("backend #{index} has an invalid address {address:?}: {reason}")]
    InvalidBackend {
        index: usize,
        address: String,
        reason: String,
    },

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    #[error("invalid metrics address {0:?}")]
    InvalidMetricsAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    for (index, address) in config.backends.iter().enumerate() {
        if let Err(e) = address.parse::<BackendAddr>() {
            errors.push(ValidationError::InvalidBackend {
                index,
                address: address.clone(),
                reason: e.to_string(),
            });
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let positive = [
        ("listener.max_connections", config.listener.max_connections as u64),
        ("timeouts.backend_ms", config.timeouts.backend_ms),
        ("timeouts.client_read_ms", config.timeouts.client_read_ms),
        ("limits.max_request_bytes", config.limits.max_request_bytes as u64),
        ("limits.max_response_bytes", config.limits.max_response_bytes as u64),
        ("limits.max_headers", config.limits.max_headers as u64),
    ];
    for (name, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.backends = vec!["/tmp/api1.sock".into()];
        config
    }

    #[test]
    fn accepts_minimal_config() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn refuses_empty_pool() {
        let mut config = valid();
        config.backends.clear();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::NoBackends]));
    }

    #[test]
    fn reports_every_error() {
        let mut config = valid();
        config.backends.push("   ".into());
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.backend_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ValidationError::InvalidBackend { index: 1, .. }));
        assert_eq!(errors[1], ValidationError::InvalidBindAddress("not-an-address".into()));
        assert_eq!(errors[2], ValidationError::Zero("timeouts.backend_ms"));
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = valid();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidMetricsAddress("nope".into())])
        );
    }
}
