//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (concurrency and timeouts > 0)
//! - Reject unknown log levels
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::ClientConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("client.concurrent_transfers must be greater than 0")]
    ZeroConcurrency,

    #[error("client.request_timeout_secs must be greater than 0")]
    ZeroTimeout,

    #[error("client.user_agent must not be empty")]
    EmptyUserAgent,

    #[error("stats.log_path must not be empty when set")]
    EmptyLogPath,

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.client.concurrent_transfers == 0 {
        errors.push(ValidationError::ZeroConcurrency);
    }
    if config.client.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.client.user_agent.trim().is_empty() {
        errors.push(ValidationError::EmptyUserAgent);
    }
    if matches!(config.stats.log_path.as_deref(), Some(p) if p.trim().is_empty()) {
        errors.push(ValidationError::EmptyLogPath);
    }
    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
