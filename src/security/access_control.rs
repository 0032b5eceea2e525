//! Identity hand-off from a trusted authenticator.
//!
//! The gateway does not authenticate anyone. When `identity.trust_headers` is
//! on, an authenticator in front of it is expected to set the user headers;
//! this middleware turns them into an [`AuthenticatedUser`] extension for the
//! pipeline to read. An embedding application can instead insert the
//! extension itself and switch header trust off.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::config::IdentityConfig;
use crate::http::request::AuthenticatedUser;

/// State required for identity extraction.
#[derive(Clone)]
pub struct IdentityState {
    pub config: Arc<IdentityConfig>,
}

/// Build a user from the configured headers.
///
/// A request without the id header is anonymous. A missing name falls back
/// to the id and a missing role to the empty string.
pub fn user_from_headers(config: &IdentityConfig, headers: &HeaderMap) -> Option<AuthenticatedUser> {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let id = read(&config.id_header)?;
    let username = read(&config.name_header).unwrap_or(id);
    let role = read(&config.role_header).unwrap_or_default();

    Some(AuthenticatedUser::new(id, username, role))
}

pub async fn identity_middleware(
    State(state): State<IdentityState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if state.config.trust_headers {
        match user_from_headers(&state.config, req.headers()) {
            Some(user) => {
                tracing::trace!(user = %user.username, role = %user.role, "Identity attached");
                req.extensions_mut().insert(user);
            }
            None => {
                // A stale extension must not outlive a request that carries
                // no identity headers.
                req.extensions_mut().remove::<AuthenticatedUser>();
            }
        }
    } else {
        strip_identity_headers(&state.config, req.headers_mut());
    }

    next.run(req).await
}

/// Drop client-supplied identity headers so they never reach upstream.
pub fn strip_identity_headers(config: &IdentityConfig, headers: &mut HeaderMap) {
    for name in [&config.id_header, &config.name_header, &config.role_header] {
        headers.remove(name.as_str());
    }
}
