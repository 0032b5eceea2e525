//! Role-based authorization gate.

use std::collections::HashSet;

use crate::config::RoleConfig;
use crate::http::request::RequestContext;
use crate::http::response::TerminalResponse;
use crate::pipeline::{Flow, Interceptor};

pub const LOGIN_REQUIRED: &str = "You must be logged in with sufficient privileges.";
pub const ROLE_NOT_ALLOWED: &str = "You do not have permission to perform this action.";

/// Lets through authenticated users whose role is in the allow-set.
pub struct RolePermissionGate {
    allowed: HashSet<String>,
    guarded_prefixes: Vec<String>,
}

impl RolePermissionGate {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            guarded_prefixes: Vec::new(),
        }
    }

    pub fn from_config(config: &RoleConfig) -> Self {
        Self {
            allowed: config.allowed.iter().cloned().collect(),
            guarded_prefixes: config.guarded_prefixes.clone(),
        }
    }

    /// Restrict the gate to paths starting with one of `prefixes`.
    pub fn guarding<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guarded_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    fn guards(&self, path: &str) -> bool {
        self.guarded_prefixes.is_empty()
            || self.guarded_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

impl Interceptor for RolePermissionGate {
    fn name(&self) -> &'static str {
        "role_permission"
    }

    fn apply(&self, ctx: &mut RequestContext) -> Flow {
        if !self.guards(ctx.path()) {
            return Flow::Continue;
        }

        let Some(user) = ctx.authenticated_user() else {
            return Flow::Terminate(TerminalResponse::forbidden(LOGIN_REQUIRED));
        };

        if self.allowed.contains(&user.role) {
            Flow::Continue
        } else {
            tracing::debug!(user = %user.username, role = %user.role, "Role not allowed");
            Flow::Terminate(TerminalResponse::forbidden(ROLE_NOT_ALLOWED))
        }
    }
}
