//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → read once at startup to build the pipeline and server
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks
//! - Bad configuration is fatal at startup, never tolerated at runtime

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AccessHoursConfig, AdminConfig, GatewayConfig, HourZone, IdentityConfig, ListenerConfig,
    ObservabilityConfig, PipelineConfig, PolicyKind, RateLimitConfig, RequestLogConfig,
    RoleConfig, SinkKind, TimeoutConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
