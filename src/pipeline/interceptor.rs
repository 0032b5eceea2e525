//! The contract every policy implements.

use crate::http::request::RequestContext;
use crate::http::response::TerminalResponse;

/// Outcome of one interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Hand the request to the next stage.
    Continue,
    /// Stop here and answer with this response.
    Terminate(TerminalResponse),
}

impl Flow {
    pub fn is_continue(&self) -> bool {
        matches!(self, Flow::Continue)
    }
}

/// A request policy.
///
/// Implementations inspect the context, may add annotations to it, and
/// decide whether the request goes on. They never see or alter the response
/// of later stages.
pub trait Interceptor: Send + Sync {
    /// Stage name for logs and metrics.
    fn name(&self) -> &'static str;

    fn apply(&self, ctx: &mut RequestContext) -> Flow;
}
