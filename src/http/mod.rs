//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, RequestContext snapshot)
//!     → [pipeline decides admit / reject]
//!     → response.rs (TerminalResponse on rejection)
//!     → server.rs forward_handler (admitted: proxy to upstream)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{AuthenticatedUser, RequestContext, X_REQUEST_ID};
pub use response::TerminalResponse;
pub use server::{AppState, GatewayServer, ServerError};
