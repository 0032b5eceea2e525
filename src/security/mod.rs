//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (attach the caller identity from trusted headers)
//!     → headers.rs (resolve the client key from X-Forwarded-For / peer)
//!     → rate_limit.rs (per-key sliding window, used by the message gate)
//! ```
//!
//! # Design Decisions
//! - No credential checks here: identity is supplied, never verified
//! - Limiter state is owned by one injected object, not a global
//! - Unknown clients share one key rather than bypassing limits

pub mod access_control;
pub mod headers;
pub mod rate_limit;

pub use headers::{client_key, UNKNOWN_CLIENT};
pub use rate_limit::{Admission, SlidingWindowLimiter};
