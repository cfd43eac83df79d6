//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend addresses must be http(s) URLs with a host
//! - Validate value ranges (timeouts > 0, thresholds > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::load_balancer::backend::parse_address;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one backend must be configured")]
    NoBackends,

    #[error("backend #{index}: {reason}")]
    InvalidBackend { index: usize, reason: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a valid socket address: {value:?}")]
    InvalidSocketAddr { field: &'static str, value: String },

    #[error("health_check.path must start with '/': {0:?}")]
    InvalidHealthPath(String),
}

fn non_zero(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::Zero { field });
    }
}

fn socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidSocketAddr {
            field,
            value: value.to_string(),
        });
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    for (index, backend) in config.backends.iter().enumerate() {
        if let Err(e) = parse_address(&backend.address) {
            errors.push(ValidationError::InvalidBackend {
                index,
                reason: e.to_string(),
            });
        }
    }

    non_zero(&mut errors, "timeouts.connect_secs", config.timeouts.connect_secs);
    non_zero(&mut errors, "timeouts.request_secs", config.timeouts.request_secs);

    let health = &config.health_check;
    if health.enabled {
        non_zero(&mut errors, "health_check.interval_secs", health.interval_secs);
        non_zero(&mut errors, "health_check.timeout_secs", health.timeout_secs);
        non_zero(&mut errors, "health_check.unhealthy_threshold", health.unhealthy_threshold as u64);
        non_zero(&mut errors, "health_check.healthy_threshold", health.healthy_threshold as u64);
        if !health.path.starts_with('/') {
            errors.push(ValidationError::InvalidHealthPath(health.path.clone()));
        }
    }

    if config.observability.metrics_enabled {
        socket_addr(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }
    if config.admin.enabled {
        socket_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
