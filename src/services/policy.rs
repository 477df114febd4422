//! Authorization policy
//!
//! Role-based access control evaluated on every /v1 request. The rule
//! table comes from configuration; each rule names a role, a path
//! pattern, and an HTTP method. A request is permitted when any rule
//! matches, so granting a role is additive and order never matters.

use crate::config::{PolicyConfig, PolicyRule};

/// Evaluates (role, path, method) triples against the configured rule table
pub struct PolicyEnforcer {
    rules: Vec<PolicyRule>,
}

impl PolicyEnforcer {
    /// Create an enforcer from policy configuration
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            rules: config.rules.clone(),
        }
    }

    /// Whether `role` may call `method` on `path`
    ///
    /// The empty role denotes an unauthenticated request; it is only
    /// permitted where a rule names the empty role explicitly.
    pub fn enforce(&self, role: &str, path: &str, method: &str) -> bool {
        self.rules.iter().any(|rule| {
            rule.role == role
                && path_matches(&rule.path, path)
                && method_matches(&rule.method, method)
        })
    }
}

/// Match a request path against a rule pattern
///
/// A trailing `*` matches any non-empty suffix, so `/v1/business/*`
/// covers `/v1/business/42` but not `/v1/business` itself. Patterns
/// without a `*` compare exactly.
fn path_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => path.starts_with(prefix),
        None => pattern == path,
    }
}

/// Match an HTTP method against a rule pattern, `*` matching any method
fn method_matches(pattern: &str, method: &str) -> bool {
    pattern == "*" || pattern.eq_ignore_ascii_case(method)
}
