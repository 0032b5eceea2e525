//! Ordered interceptor pipeline.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → stage 0 ─ Terminate? ──▶ TerminalResponse (403 ...)
//!     → stage 1 ─ Terminate? ──▶ TerminalResponse
//!     → ...
//!     → business handler ──────▶ Response (returned unmodified)
//! ```
//!
//! # Design Decisions
//! - Stages run strictly in configured order
//! - The first `Terminate` wins: no later stage and no handler runs
//! - The handler only ever sees requests every stage let through

mod interceptor;

pub use interceptor::{Flow, Interceptor};

use std::future::Future;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};

use crate::http::request::RequestContext;
use crate::http::response::TerminalResponse;
use crate::observability::metrics;

/// Result of running every stage over a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    Reject {
        stage: &'static str,
        response: TerminalResponse,
    },
}

/// An immutable, ordered list of interceptors.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("stages", &self.stage_names()).finish()
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Stage names in evaluation order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run the stages until one terminates or all continue.
    pub fn evaluate(&self, ctx: &mut RequestContext) -> Verdict {
        let mut dispatch = Dispatch::new(&self.stages);
        while let Some((stage, flow)) = dispatch.step(ctx) {
            if let Flow::Terminate(response) = flow {
                tracing::debug!(
                    stage,
                    path = %ctx.path(),
                    status = response.status().as_u16(),
                    "Request rejected"
                );
                return Verdict::Reject { stage, response };
            }
        }
        Verdict::Admit
    }

    /// Run the stages, then `handler` if every stage continued.
    ///
    /// The handler receives the annotated context and its response is
    /// returned as is.
    pub async fn handle<F, Fut>(&self, mut ctx: RequestContext, handler: F) -> Response
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = Response>,
    {
        match self.evaluate(&mut ctx) {
            Verdict::Admit => handler(ctx).await,
            Verdict::Reject { stage, response } => {
                metrics::record_rejection(stage);
                response.into_response()
            }
        }
    }
}

/// Cursor over the stages of one request.
struct Dispatch<'a> {
    stages: &'a [Arc<dyn Interceptor>],
    index: usize,
}

impl<'a> Dispatch<'a> {
    fn new(stages: &'a [Arc<dyn Interceptor>]) -> Self {
        Self { stages, index: 0 }
    }

    /// Apply the next stage; `None` once all stages have run.
    fn step(&mut self, ctx: &mut RequestContext) -> Option<(&'static str, Flow)> {
        let stage = self.stages.get(self.index)?;
        self.index += 1;
        Some((stage.name(), stage.apply(ctx)))
    }
}

/// Builds a [`Pipeline`] stage by stage.
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Interceptor>>,
}

impl PipelineBuilder {
    /// Append a stage; it runs after every stage added before it.
    pub fn stage(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.stages.push(interceptor);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}
