//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Root configuration for the chat gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream chat service that receives admitted requests.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Interceptor order.
    pub pipeline: PipelineConfig,

    /// Message rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Opening hours enforced by the time gate.
    pub access_hours: AccessHoursConfig,

    /// Role authorization.
    pub roles: RoleConfig,

    /// Where caller identity comes from.
    pub identity: IdentityConfig,

    /// Per-request access log.
    pub request_log: RequestLogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream chat service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:8000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Interceptors the gateway knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    RequestLogger,
    TimeWindow,
    MessageRate,
    RolePermission,
}

impl PolicyKind {
    /// Stage name used in logs, metrics and the admin API.
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::RequestLogger => "request_logger",
            PolicyKind::TimeWindow => "time_window",
            PolicyKind::MessageRate => "message_rate",
            PolicyKind::RolePermission => "role_permission",
        }
    }
}

/// Pipeline composition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stages in evaluation order. A policy left out is disabled.
    pub order: Vec<PolicyKind>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            order: vec![
                PolicyKind::RequestLogger,
                PolicyKind::TimeWindow,
                PolicyKind::MessageRate,
                PolicyKind::RolePermission,
            ],
        }
    }
}

/// Sliding-window message rate limiting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum admitted messages per key inside one window.
    pub max_events: usize,

    /// Window length in seconds.
    pub time_window_secs: u64,

    /// POSTs whose path contains this (case-insensitive) are limited.
    pub path_substring: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_events: 5,
            time_window_secs: 60,
            path_substring: "/messages".to_string(),
        }
    }
}

/// Timezone in which the wall-clock hour is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HourZone {
    #[default]
    Utc,
    Local,
}

impl HourZone {
    /// Hour of day (0-23) of `at` in this zone.
    pub fn hour_of(&self, at: DateTime<Utc>) -> u32 {
        match self {
            HourZone::Utc => at.hour(),
            HourZone::Local => at.with_timezone(&Local).hour(),
        }
    }

    /// Render `at` for the access log.
    pub fn timestamp(&self, at: DateTime<Utc>) -> String {
        const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
        match self {
            HourZone::Utc => at.format(FORMAT).to_string(),
            HourZone::Local => at.with_timezone(&Local).format(FORMAT).to_string(),
        }
    }
}

/// Opening hours for the chat, `[start_hour, end_hour)`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessHoursConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    pub timezone: HourZone,
}

impl Default for AccessHoursConfig {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 18,
            timezone: HourZone::Utc,
        }
    }
}

/// Role-based authorization.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoleConfig {
    /// Roles allowed past the gate.
    pub allowed: Vec<String>,

    /// Path prefixes the gate guards. Empty guards every path.
    pub guarded_prefixes: Vec<String>,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            allowed: vec!["admin".to_string(), "moderator".to_string()],
            guarded_prefixes: Vec::new(),
        }
    }
}

/// Identity headers set by a trusted authenticator in front of the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Build the caller identity from the headers below.
    ///
    /// On by default. Any client that reaches the listener directly can then
    /// claim any role, so the gateway must only be reachable through the
    /// authenticator that sets these headers. When off, inbound identity
    /// headers are removed before the pipeline and upstream see them.
    pub trust_headers: bool,
    pub id_header: String,
    pub name_header: String,
    pub role_header: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            trust_headers: true,
            id_header: "x-user-id".to_string(),
            name_header: "x-user-name".to_string(),
            role_header: "x-user-role".to_string(),
        }
    }
}

/// Destination of the per-request access log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    #[default]
    Tracing,
    File,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestLogConfig {
    pub sink: SinkKind,

    /// Target file when `sink = "file"`.
    pub path: String,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::Tracing,
            path: "requests.log".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = GatewayConfig::default();
        assert_eq!(config.rate_limit.max_events, 5);
        assert_eq!(config.rate_limit.time_window_secs, 60);
        assert_eq!(config.rate_limit.path_substring, "/messages");
        assert_eq!(config.access_hours.start_hour, 9);
        assert_eq!(config.access_hours.end_hour, 18);
        assert_eq!(config.roles.allowed, vec!["admin", "moderator"]);
        assert_eq!(config.pipeline.order.len(), 4);
        assert_eq!(config.pipeline.order[0], PolicyKind::RequestLogger);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [rate_limit]
            max_events = 10

            [access_hours]
            timezone = "local"

            [pipeline]
            order = ["message_rate", "role_permission"]
            "#,
        )
        .unwrap();

        assert_eq!(config.rate_limit.max_events, 10);
        assert_eq!(config.rate_limit.time_window_secs, 60);
        assert_eq!(config.access_hours.timezone, HourZone::Local);
        assert_eq!(config.access_hours.start_hour, 9);
        assert_eq!(
            config.pipeline.order,
            vec![PolicyKind::MessageRate, PolicyKind::RolePermission]
        );
    }

    #[test]
    fn test_utc_hour_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 20, 15, 0).unwrap();
        assert_eq!(HourZone::Utc.hour_of(at), 20);
        assert_eq!(HourZone::Utc.timestamp(at), "2024-05-01 20:15:00.000000");
    }
}
