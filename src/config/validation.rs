//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parseable)
//! - Catch settings the pipeline cannot operate with
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted into the system, on load and reload

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// One semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &str, message: String| {
        errors.push(ValidationError {
            field: field.to_string(),
            message,
        });
    };

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        fail(
            "listener.bind_address",
            format!("not a valid socket address: {:?}", config.listener.bind_address),
        );
    }
    if config.listener.max_connections == 0 {
        fail("listener.max_connections", "must be at least 1".to_string());
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            fail("listener.tls.cert_path", "must not be empty".to_string());
        }
        if tls.key_path.is_empty() {
            fail("listener.tls.key_path", "must not be empty".to_string());
        }
    }

    if config.timeouts.request_secs == 0 {
        fail("timeouts.request_secs", "must be at least 1".to_string());
    }
    if config.timeouts.stage_secs == 0 {
        fail("timeouts.stage_secs", "must be at least 1".to_string());
    }

    if config.pipeline.web_root.as_os_str().is_empty() {
        fail("pipeline.web_root", "must not be empty".to_string());
    }
    if config.pipeline.default_index.is_empty() || config.pipeline.default_index.contains('/') {
        fail(
            "pipeline.default_index",
            "must be a bare filename".to_string(),
        );
    }
    if config.pipeline.max_body_size == 0 {
        fail("pipeline.max_body_size", "must be at least 1".to_string());
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        fail(
            "observability.metrics_address",
            format!(
                "not a valid socket address: {:?}",
                config.observability.metrics_address
            ),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
