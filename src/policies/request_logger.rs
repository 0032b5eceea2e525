//! Access logging for every request.

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::HourZone;
use crate::http::request::RequestContext;
use crate::observability::logging::{AccessRecord, LogSink};
use crate::pipeline::{Flow, Interceptor};

/// Name logged for callers without an authenticated identity.
pub const ANONYMOUS: &str = "Anonymous";

/// Writes one access record per request and always continues.
pub struct RequestLogger {
    sink: Arc<dyn LogSink>,
    clock: Arc<dyn Clock>,
    zone: HourZone,
}

impl RequestLogger {
    pub fn new(sink: Arc<dyn LogSink>, clock: Arc<dyn Clock>, zone: HourZone) -> Self {
        Self { sink, clock, zone }
    }
}

impl Interceptor for RequestLogger {
    fn name(&self) -> &'static str {
        "request_logger"
    }

    fn apply(&self, ctx: &mut RequestContext) -> Flow {
        let user = ctx
            .authenticated_user()
            .map(|u| u.username.clone())
            .unwrap_or_else(|| ANONYMOUS.to_string());

        self.sink.record(&AccessRecord {
            timestamp: self.zone.timestamp(self.clock.wall()),
            user,
            path: ctx.path().to_string(),
        });

        Flow::Continue
    }
}
