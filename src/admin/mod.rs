//! Admin API: read-only views of the running gateway.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

/// State shared by the admin routes.
#[derive(Clone)]
pub struct AdminState {
    pub gateway: AppState,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(gateway: AppState, api_key: &str) -> Router {
    let state = AdminState {
        gateway,
        api_key: Arc::from(api_key),
    };

    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/limiter", get(get_limiter))
        .route("/admin/pipeline", get(get_pipeline))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::http::server::GatewayServer;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn router() -> Router {
        let server = GatewayServer::new(GatewayConfig::default()).unwrap();
        setup_admin_router(server.state(), "secret")
    }

    #[tokio::test]
    async fn test_requires_bearer_key() {
        let response = router()
            .oneshot(Request::get("/admin/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router()
            .oneshot(
                Request::get("/admin/status")
                    .header("authorization", "Bearer wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_pipeline_view() {
        let response = router()
            .oneshot(
                Request::get("/admin/pipeline")
                    .header("authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: PipelineStatus = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            status.stages,
            vec!["request_logger", "time_window", "message_rate", "role_permission"]
        );
    }

    #[tokio::test]
    async fn test_limiter_view() {
        let response = router()
            .oneshot(
                Request::get("/admin/limiter")
                    .header("authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: LimiterStatus = serde_json::from_slice(&body).unwrap();
        assert_eq!(status.tracked_keys, 0);
        assert_eq!(status.max_events, 5);
        assert_eq!(status.time_window_secs, 60);
    }
}
