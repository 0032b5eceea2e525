//! Configuration validation.
//!
//! Serde handles the syntax; this module checks value ranges and cross-field
//! constraints. Every problem found is reported, not just the first one.

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A semantic problem in an otherwise well-formed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("access_hours.start_hour ({start}) must be lower than end_hour ({end})")]
    EmptyAccessWindow { start: u32, end: u32 },

    #[error("access_hours.end_hour ({0}) must not exceed 24")]
    HourOutOfRange(u32),

    #[error("rate_limit.max_events must be greater than zero")]
    ZeroMaxEvents,

    #[error("rate_limit.time_window_secs must be greater than zero")]
    ZeroTimeWindow,

    #[error("rate_limit.path_substring must not be empty")]
    EmptyPathSubstring,

    #[error("roles.allowed must name at least one role")]
    NoAllowedRoles,

    #[error("pipeline stage '{0}' appears more than once")]
    DuplicateStage(&'static str),

    #[error("{field} is not a valid socket address: '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let hours = &config.access_hours;
    if hours.end_hour > 24 {
        errors.push(ValidationError::HourOutOfRange(hours.end_hour));
    }
    if hours.start_hour >= hours.end_hour {
        errors.push(ValidationError::EmptyAccessWindow {
            start: hours.start_hour,
            end: hours.end_hour,
        });
    }

    if config.rate_limit.max_events == 0 {
        errors.push(ValidationError::ZeroMaxEvents);
    }
    if config.rate_limit.time_window_secs == 0 {
        errors.push(ValidationError::ZeroTimeWindow);
    }
    if config.rate_limit.path_substring.trim().is_empty() {
        errors.push(ValidationError::EmptyPathSubstring);
    }

    if config.roles.allowed.is_empty() {
        errors.push(ValidationError::NoAllowedRoles);
    }

    let mut seen = HashSet::new();
    for kind in &config.pipeline.order {
        if !seen.insert(*kind) {
            errors.push(ValidationError::DuplicateStage(kind.as_str()));
        }
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_address(&mut errors, "upstream.address", &config.upstream.address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::MissingAdminKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
