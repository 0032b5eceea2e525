//! Chat Gateway Library
//!
//! A policy-enforcing reverse proxy for a chat service. Every request runs
//! through an ordered pipeline of interceptors (access log, opening hours,
//! message rate limit, role check) before it may reach the upstream.

pub mod admin;
pub mod clock;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod policies;
pub mod security;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use pipeline::{Flow, Interceptor, Pipeline};
