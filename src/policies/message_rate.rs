//! Message posting rate gate.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};

use crate::clock::Clock;
use crate::http::request::RequestContext;
use crate::http::response::TerminalResponse;
use crate::pipeline::{Flow, Interceptor};
use crate::security::{client_key, Admission};

/// Annotation holding the resolved client key.
pub const CLIENT_KEY: &str = "client-key";

pub const LIMIT_EXCEEDED: &str =
    "Message limit exceeded. Please wait before sending more messages.";

/// Limits message POSTs per client key.
///
/// Only `POST` requests whose path contains the configured substring reach
/// the limiter; everything else passes without touching any budget.
pub struct MessageRateGate {
    limiter: Arc<dyn Admission>,
    clock: Arc<dyn Clock>,
    path_substring: String,
    retry_after: Option<Duration>,
}

impl MessageRateGate {
    pub fn new(limiter: Arc<dyn Admission>, clock: Arc<dyn Clock>, path_substring: &str) -> Self {
        Self {
            limiter,
            clock,
            path_substring: path_substring.to_lowercase(),
            retry_after: None,
        }
    }

    /// Advertise `Retry-After` on rejections.
    pub fn with_retry_after(mut self, after: Duration) -> Self {
        self.retry_after = Some(after);
        self
    }

    fn rejection(&self) -> TerminalResponse {
        let response = TerminalResponse::forbidden(LIMIT_EXCEEDED);
        match self.retry_after {
            Some(after) => response.with_header(
                header::RETRY_AFTER,
                HeaderValue::from(after.as_secs().max(1)),
            ),
            None => response,
        }
    }

    pub fn applies_to(&self, ctx: &RequestContext) -> bool {
        *ctx.method() == Method::POST && ctx.path().to_lowercase().contains(&self.path_substring)
    }
}

impl Interceptor for MessageRateGate {
    fn name(&self) -> &'static str {
        "message_rate"
    }

    fn apply(&self, ctx: &mut RequestContext) -> Flow {
        if !self.applies_to(ctx) {
            return Flow::Continue;
        }

        let key = client_key(ctx);
        if self.limiter.admit(&key, self.clock.now()) {
            ctx.annotate(CLIENT_KEY, key);
            Flow::Continue
        } else {
            tracing::warn!(client = %key, path = %ctx.path(), "Message rate limit exceeded");
            Flow::Terminate(self.rejection())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::security::SlidingWindowLimiter;
    use axum::http::StatusCode;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Admission stub that records every key it is asked about.
    #[derive(Default)]
    struct Recording(Mutex<Vec<String>>);

    impl Admission for Recording {
        fn admit(&self, key: &str, _now: Instant) -> bool {
            self.0.lock().unwrap().push(key.to_string());
            true
        }
    }

    fn clock() -> MockClock {
        MockClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
    }

    fn post(path: &str) -> RequestContext {
        RequestContext::new(Method::POST, path).with_header("x-forwarded-for", "1.2.3.4")
    }

    #[test]
    fn test_only_matching_posts_reach_limiter() {
        let recording = Arc::new(Recording::default());
        let gate = MessageRateGate::new(recording.clone(), Arc::new(clock()), "/messages");

        gate.apply(&mut RequestContext::new(Method::GET, "/conversations"));
        gate.apply(&mut RequestContext::new(Method::GET, "/api/messages/"));
        gate.apply(&mut post("/api/conversations/"));
        gate.apply(&mut post("/api/conversations/3/MESSAGES/"));

        assert_eq!(*recording.0.lock().unwrap(), vec!["1.2.3.4"]);
    }

    #[test]
    fn test_rejects_over_budget_and_recovers() {
        let clock = clock();
        let limiter = Arc::new(SlidingWindowLimiter::new(5, Duration::from_secs(60)));
        let gate = MessageRateGate::new(limiter.clone(), Arc::new(clock.clone()), "/messages");

        for _ in 0..5 {
            assert_eq!(gate.apply(&mut post("/messages")), Flow::Continue);
            clock.advance(Duration::from_secs(10));
        }

        match gate.apply(&mut post("/messages")) {
            Flow::Terminate(response) => {
                assert_eq!(response.status(), StatusCode::FORBIDDEN);
                assert_eq!(response.body(), LIMIT_EXCEEDED);
            }
            Flow::Continue => panic!("sixth message must be rejected"),
        }

        clock.advance(Duration::from_secs(11));
        assert_eq!(gate.apply(&mut post("/messages")), Flow::Continue);
    }

    #[test]
    fn test_admitted_request_is_annotated() {
        let limiter = Arc::new(SlidingWindowLimiter::new(5, Duration::from_secs(60)));
        let gate = MessageRateGate::new(limiter, Arc::new(clock()), "/messages");

        let mut ctx = post("/messages");
        gate.apply(&mut ctx);

        assert_eq!(ctx.annotations().get(CLIENT_KEY), Some("1.2.3.4"));
    }

    #[test]
    fn test_unrelated_traffic_keeps_budget() {
        let limiter = Arc::new(SlidingWindowLimiter::new(1, Duration::from_secs(60)));
        let gate = MessageRateGate::new(limiter.clone(), Arc::new(clock()), "/messages");

        for _ in 0..10 {
            let mut ctx = RequestContext::new(Method::GET, "/conversations")
                .with_header("x-forwarded-for", "1.2.3.4");
            assert_eq!(gate.apply(&mut ctx), Flow::Continue);
        }

        assert_eq!(limiter.tracked_keys(), 0);
        assert_eq!(gate.apply(&mut post("/messages")), Flow::Continue);
    }

    #[test]
    fn test_rejection_advertises_retry_after() {
        let limiter = Arc::new(SlidingWindowLimiter::new(1, Duration::from_secs(60)));
        let gate = MessageRateGate::new(limiter, Arc::new(clock()), "/messages")
            .with_retry_after(Duration::from_secs(60));

        assert_eq!(gate.apply(&mut post("/messages")), Flow::Continue);
        match gate.apply(&mut post("/messages")) {
            Flow::Terminate(response) => {
                assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");
            }
            Flow::Continue => panic!("second message must be rejected"),
        }
    }
}
