//! Opening-hours gate.

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::{AccessHoursConfig, HourZone};
use crate::http::request::RequestContext;
use crate::http::response::TerminalResponse;
use crate::pipeline::{Flow, Interceptor};

/// Rejects requests outside `[start_hour, end_hour)` on the wall clock.
pub struct TimeWindowGate {
    start_hour: u32,
    end_hour: u32,
    zone: HourZone,
    clock: Arc<dyn Clock>,
    message: String,
}

impl TimeWindowGate {
    pub fn new(config: &AccessHoursConfig, clock: Arc<dyn Clock>) -> Self {
        let message = format!(
            "Access to the chat is restricted outside of {} to {}.",
            twelve_hour(config.start_hour),
            twelve_hour(config.end_hour)
        );
        Self {
            start_hour: config.start_hour,
            end_hour: config.end_hour,
            zone: config.timezone,
            clock,
            message,
        }
    }

    pub fn is_open_at(&self, hour: u32) -> bool {
        (self.start_hour..self.end_hour).contains(&hour)
    }
}

impl Interceptor for TimeWindowGate {
    fn name(&self) -> &'static str {
        "time_window"
    }

    fn apply(&self, _ctx: &mut RequestContext) -> Flow {
        let hour = self.zone.hour_of(self.clock.wall());
        if self.is_open_at(hour) {
            Flow::Continue
        } else {
            Flow::Terminate(TerminalResponse::forbidden(self.message.as_str()))
        }
    }
}

/// 9 → "9 AM", 18 → "6 PM", 0 and 24 → "12 AM".
fn twelve_hour(hour: u32) -> String {
    let suffix = if hour % 24 < 12 { "AM" } else { "PM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{} {}", display, suffix)
}
