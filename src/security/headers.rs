//! Client identity from forwarding headers.
//!
//! # Design Decisions
//! - The leftmost `X-Forwarded-For` entry is taken as the client
//! - First-hop trust: the header is not verified against a proxy allow-list
//! - Unresolvable callers share the `"unknown"` key instead of erroring

use crate::http::request::RequestContext;

/// Header set by reverse proxies: `client, proxy1, proxy2`.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Shared key for callers with no usable address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the rate-limit key for a request.
///
/// Order: first `X-Forwarded-For` token, then the transport remote address,
/// then [`UNKNOWN_CLIENT`]. Never fails.
pub fn client_key(ctx: &RequestContext) -> String {
    if let Some(forwarded) = ctx.header(X_FORWARDED_FOR) {
        let first = forwarded.split(',').next().map(str::trim).unwrap_or_default();
        if !first.is_empty() {
            return first.to_string();
        }
    }

    match ctx.remote_addr().map(str::trim) {
        Some(addr) if !addr.is_empty() => addr.to_string(),
        _ => UNKNOWN_CLIENT.to_string(),
    }
}
