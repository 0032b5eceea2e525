//! Request policies and their assembly into a pipeline.
//!
//! # Data Flow
//! ```text
//! [pipeline] order from config
//!     → build_pipeline (one interceptor per listed policy)
//!     → request_logger.rs  (access log, never rejects)
//!     → time_window.rs     (opening hours)
//!     → message_rate.rs    (sliding-window limit on message POSTs)
//!     → role_permission.rs (authenticated + allowed role)
//! ```
//!
//! Every rejection is a 403 with a body unique to the policy.

pub mod message_rate;
pub mod request_logger;
pub mod role_permission;
pub mod time_window;

pub use message_rate::MessageRateGate;
pub use request_logger::RequestLogger;
pub use role_permission::RolePermissionGate;
pub use time_window::TimeWindowGate;

use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::{GatewayConfig, PolicyKind};
use crate::observability::logging::LogSink;
use crate::pipeline::{Interceptor, Pipeline};
use crate::security::Admission;

/// Shared collaborators the policies are built from.
#[derive(Clone)]
pub struct PolicyDeps {
    pub limiter: Arc<dyn Admission>,
    pub clock: Arc<dyn Clock>,
    pub sink: Arc<dyn LogSink>,
}

/// Build the pipeline in the configured order.
pub fn build_pipeline(config: &GatewayConfig, deps: &PolicyDeps) -> Pipeline {
    config
        .pipeline
        .order
        .iter()
        .fold(Pipeline::builder(), |builder, kind| {
            builder.stage(build_stage(*kind, config, deps))
        })
        .build()
}

fn build_stage(kind: PolicyKind, config: &GatewayConfig, deps: &PolicyDeps) -> Arc<dyn Interceptor> {
    match kind {
        PolicyKind::RequestLogger => Arc::new(RequestLogger::new(
            deps.sink.clone(),
            deps.clock.clone(),
            config.access_hours.timezone,
        )),
        PolicyKind::TimeWindow => Arc::new(TimeWindowGate::new(
            &config.access_hours,
            deps.clock.clone(),
        )),
        PolicyKind::MessageRate => Arc::new(MessageRateGate::new(
            deps.limiter.clone(),
            deps.clock.clone(),
            &config.rate_limit.path_substring,
        )
        .with_retry_after(Duration::from_secs(config.rate_limit.time_window_secs))),
        PolicyKind::RolePermission => Arc::new(RolePermissionGate::from_config(&config.roles)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::observability::logging::TracingSink;
    use crate::security::SlidingWindowLimiter;
    use chrono::{TimeZone, Utc};

    fn deps() -> PolicyDeps {
        let config = GatewayConfig::default();
        PolicyDeps {
            limiter: Arc::new(SlidingWindowLimiter::from_config(&config.rate_limit)),
            clock: Arc::new(MockClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())),
            sink: Arc::new(TracingSink),
        }
    }

    #[test]
    fn test_default_order() {
        let pipeline = build_pipeline(&GatewayConfig::default(), &deps());
        assert_eq!(
            pipeline.stage_names(),
            vec!["request_logger", "time_window", "message_rate", "role_permission"]
        );
    }

    #[test]
    fn test_configured_order_and_subset() {
        let mut config = GatewayConfig::default();
        config.pipeline.order = vec![PolicyKind::RolePermission, PolicyKind::RequestLogger];

        let pipeline = build_pipeline(&config, &deps());
        assert_eq!(pipeline.stage_names(), vec!["role_permission", "request_logger"]);
    }

    #[test]
    fn test_stage_names_match_config_names() {
        let pipeline = build_pipeline(&GatewayConfig::default(), &deps());
        let expected: Vec<&str> = GatewayConfig::default()
            .pipeline
            .order
            .iter()
            .map(PolicyKind::as_str)
            .collect();
        assert_eq!(pipeline.stage_names(), expected);
    }
}
