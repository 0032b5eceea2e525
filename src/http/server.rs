//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the forwarding handler
//! - Wire up middleware (tracing, request ID, timeout, identity, pipeline)
//! - Forward admitted requests to the upstream chat service
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        HeaderName, HeaderValue, Request, StatusCode, Uri,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::clock::{Clock, SystemClock};
use crate::config::GatewayConfig;
use crate::http::request::{Annotations, GatewayRequestId, RequestContext, X_REQUEST_ID};
use crate::observability::logging::{self, LogSink};
use crate::observability::metrics;
use crate::pipeline::Pipeline;
use crate::policies::{build_pipeline, PolicyDeps};
use crate::security::access_control::{identity_middleware, IdentityState};
use crate::security::SlidingWindowLimiter;

/// Prefix for annotation headers forwarded upstream.
const ANNOTATION_HEADER_PREFIX: &str = "x-gateway-";

/// Errors raised while assembling or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to open access log: {0}")]
    AccessLog(#[source] std::io::Error),

    #[error("invalid upstream address '{0}'")]
    Upstream(String),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub limiter: Arc<SlidingWindowLimiter>,
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// The gateway: pipeline in front of the upstream chat service.
pub struct GatewayServer {
    router: Router,
    state: AppState,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a server using the system clock and the configured log sink.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let sink = logging::sink_from_config(&config.request_log).map_err(ServerError::AccessLog)?;
        Self::with_parts(config, Arc::new(SystemClock), sink)
    }

    /// Create a server with an explicit clock and access-log sink.
    pub fn with_parts(
        config: GatewayConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self, ServerError> {
        let upstream = Authority::from_str(&config.upstream.address)
            .map_err(|_| ServerError::Upstream(config.upstream.address.clone()))?;

        let limiter = Arc::new(SlidingWindowLimiter::from_config(&config.rate_limit));
        let deps = PolicyDeps {
            limiter: limiter.clone(),
            clock,
            sink,
        };
        let pipeline = Arc::new(build_pipeline(&config, &deps));

        tracing::info!(stages = ?pipeline.stage_names(), "Pipeline assembled");

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            pipeline,
            limiter,
            client,
            upstream,
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            state,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Outermost first: request ID, trace, ID propagation, timeout, identity,
    /// pipeline, forwarding.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let identity = IdentityState {
            config: Arc::new(config.identity.clone()),
        };
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .fallback(forward_handler)
            .layer(middleware::from_fn_with_state(state.clone(), pipeline_middleware))
            .layer(middleware::from_fn_with_state(identity, identity_middleware))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(x_request_id, GatewayRequestId))
    }

    /// The router, for driving the gateway without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared state, for the admin API.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.state.upstream,
            "Gateway starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Gateway received shutdown signal");
            })
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Runs the policy pipeline; admitted requests continue to the handler with
/// their annotations attached.
async fn pipeline_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_request(&request);

    state
        .pipeline
        .handle(ctx, |ctx| async move {
            let mut request = request;
            request.extensions_mut().insert(ctx.into_annotations());
            next.run(request).await
        })
        .await
}

/// Forwards an admitted request to the upstream chat service.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (mut parts, body) = request.into_parts();

    // Only the pipeline may set annotation headers.
    let forged: Vec<HeaderName> = parts
        .headers
        .keys()
        .filter(|name| name.as_str().starts_with(ANNOTATION_HEADER_PREFIX))
        .cloned()
        .collect();
    for name in forged {
        parts.headers.remove(&name);
    }

    if let Some(annotations) = parts.extensions.get::<Annotations>() {
        for (key, value) in annotations.iter() {
            let name = HeaderName::from_str(&format!("{ANNOTATION_HEADER_PREFIX}{key}"));
            if let (Ok(name), Ok(value)) = (name, HeaderValue::from_str(value)) {
                parts.headers.insert(name, value);
            }
        }
    }

    // URI rewrite
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Could not build upstream URI");
            return (StatusCode::BAD_REQUEST, "Invalid request URI").into_response();
        }
    };

    tracing::debug!(request_id = %request_id, uri = %parts.uri, "Forwarding request");

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), start_time);
            relay(response)
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_request(&method, 502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Hand an upstream response back to the client unchanged.
fn relay(response: hyper::Response<Incoming>) -> Response {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(body))
}
