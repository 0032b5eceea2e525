//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build pipeline → Start listeners
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C → broadcast → listeners stop accepting → in-flight requests drain
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

pub mod shutdown;

pub use shutdown::Shutdown;
