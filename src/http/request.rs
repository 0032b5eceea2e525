//! Per-request context seen by the interceptors.
//!
//! # Responsibilities
//! - Snapshot the routing-relevant parts of a request (method, path, headers)
//! - Carry the caller identity supplied by the identity provider
//! - Hold annotations interceptors attach on the way through
//! - Generate the `x-request-id` for every request

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, HeaderValue, Method, Request},
};
use serde::{Deserialize, Serialize};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Identity record handed over by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub username: String,
    pub is_authenticated: bool,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn new(id: impl Into<String>, username: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            is_authenticated: true,
            role: role.into(),
        }
    }
}

/// Key/value notes attached to a request by interceptors.
///
/// Stored in the request extensions once the pipeline admits a request, so
/// the business handler can read them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations(BTreeMap<String, String>);

impl Annotations {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What an interceptor gets to look at.
///
/// Everything except the annotations is fixed when the context is created.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    path: String,
    headers: HeaderMap,
    remote_addr: Option<String>,
    user: Option<AuthenticatedUser>,
    annotations: Annotations,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            remote_addr: None,
            user: None,
            annotations: Annotations::default(),
        }
    }

    /// Snapshot an incoming request.
    ///
    /// The remote address comes from axum's `ConnectInfo` and the user from
    /// whatever identity layer ran before the pipeline.
    pub fn from_request(req: &Request<Body>) -> Self {
        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Self {
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            headers: req.headers().clone(),
            remote_addr,
            user: req.extensions().get::<AuthenticatedUser>().cloned(),
            annotations: Annotations::default(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn with_user(mut self, user: AuthenticatedUser) -> Self {
        self.user = Some(user);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text; lookup is case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    /// The user, only if the identity provider marked it authenticated.
    pub fn authenticated_user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref().filter(|u| u.is_authenticated)
    }

    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.annotations.insert(key, value);
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn into_annotations(self) -> Annotations {
        self.annotations
    }
}

/// Generates UUID v4 request IDs for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatewayRequestId;

impl MakeRequestId for GatewayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request_snapshot() {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("http://chat.local/api/messages/?page=2")
            .header("X-Forwarded-For", "10.0.0.1")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo::<SocketAddr>("192.168.1.7:5555".parse().unwrap()));
        req.extensions_mut()
            .insert(AuthenticatedUser::new("1", "alice", "admin"));

        let ctx = RequestContext::from_request(&req);

        assert_eq!(*ctx.method(), Method::POST);
        assert_eq!(ctx.path(), "/api/messages/");
        assert_eq!(ctx.header("x-forwarded-for"), Some("10.0.0.1"));
        assert_eq!(ctx.remote_addr(), Some("192.168.1.7"));
        assert_eq!(ctx.user().map(|u| u.username.as_str()), Some("alice"));
        assert!(ctx.annotations().is_empty());
    }

    #[test]
    fn test_unauthenticated_user_is_not_returned() {
        let mut user = AuthenticatedUser::new("2", "bob", "admin");
        user.is_authenticated = false;
        let ctx = RequestContext::new(Method::GET, "/").with_user(user);

        assert!(ctx.user().is_some());
        assert!(ctx.authenticated_user().is_none());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let req = Request::builder().body(Body::empty()).unwrap();
        let mut maker = GatewayRequestId;
        let a = maker.make_request_id(&req).unwrap();
        let b = maker.make_request_id(&req).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
