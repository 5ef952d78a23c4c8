//! Route gating.
//!
//! Protected views never check roles themselves. The shell asks the guard for a decision and
//! either renders the view or follows the redirect. Evaluation is pure and synchronous: the only
//! input besides the requirement is an already-taken session snapshot.

use tracing::debug;

use super::principal::Principal;
use super::session::SessionStore;

pub const LOGIN_ROUTE: &str = "/login";
pub const LANDING_ROUTE: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Requirement {
    None,
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Redirect(String),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool { matches!(self, AccessDecision::Allow) }
}

/// Outcome of gating a view: the rendered view, or where to go instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gated<V> {
    View(V),
    Redirect(String),
}

/// Route prefix to requirement, longest prefix wins, matched on whole path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    rules: Vec<(String, Requirement)>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::empty()
            .with_rule("/admin", Requirement::Admin)
            .with_rule("/dashboard", Requirement::Authenticated)
            .with_rule("/applications", Requirement::Authenticated)
            .with_rule("/settings", Requirement::Authenticated)
            .with_rule("/notifications", Requirement::Authenticated)
    }
}

impl RouteTable {
    pub fn empty() -> Self { Self { rules: Vec::new() } }

    pub fn with_rule<S: Into<String>>(mut self, prefix: S, req: Requirement) -> Self {
        let prefix = normalize_path(&prefix.into());
        self.rules.retain(|(p, _)| *p != prefix);
        self.rules.push((prefix, req));
        self
    }

    pub fn requirement_for(&self, path: &str) -> Requirement {
        let path = normalize_path(path);
        self.rules
            .iter()
            .filter(|(prefix, _)| segment_prefix(prefix, &path))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, req)| *req)
            .unwrap_or(Requirement::None)
    }
}

/// Drop query/fragment and trailing slashes; always starts with `/`.
fn normalize_path(path: &str) -> String {
    let end = path.find(&['?', '#'][..]).unwrap_or(path.len());
    let trimmed = path[..end].trim().trim_end_matches('/');
    if trimmed.starts_with('/') { trimmed.to_string() } else { format!("/{}", trimmed) }
}

fn segment_prefix(prefix: &str, path: &str) -> bool {
    if prefix == "/" { return true; }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[derive(Debug, Clone)]
pub struct AccessGuard {
    login_route: String,
    landing_route: String,
    routes: RouteTable,
}

impl Default for AccessGuard {
    fn default() -> Self {
        Self { login_route: LOGIN_ROUTE.to_string(), landing_route: LANDING_ROUTE.to_string(), routes: RouteTable::default() }
    }
}

impl AccessGuard {
    pub fn new<S: Into<String>>(login_route: S, landing_route: S, routes: RouteTable) -> Self {
        Self { login_route: login_route.into(), landing_route: landing_route.into(), routes }
    }

    pub fn routes(&self) -> &RouteTable { &self.routes }

    pub fn evaluate(&self, principal: &Principal, required: Requirement) -> AccessDecision {
        let decision = match required {
            Requirement::None => AccessDecision::Allow,
            // A malformed profile was already dropped by the store, so it lands here too
            _ if !principal.is_authenticated() => AccessDecision::Redirect(self.login_route.clone()),
            Requirement::Authenticated => AccessDecision::Allow,
            Requirement::Admin if principal.has_elevated_privilege() => AccessDecision::Allow,
            Requirement::Admin => AccessDecision::Redirect(self.landing_route.clone()),
        };
        debug!(target: "guard", user = principal.label(), ?required, ?decision, "access decision");
        decision
    }

    pub fn check_route(&self, path: &str, principal: &Principal) -> AccessDecision {
        self.evaluate(principal, self.routes.requirement_for(path))
    }

    /// Take a fresh snapshot and decide for `path`.
    pub fn check_current(&self, store: &SessionStore, path: &str) -> AccessDecision {
        self.check_route(path, &store.current_principal())
    }

    /// Render `view` only when the decision allows it.
    pub fn gate<V, F: FnOnce() -> V>(&self, principal: &Principal, required: Requirement, view: F) -> Gated<V> {
        match self.evaluate(principal, required) {
            AccessDecision::Allow => Gated::View(view()),
            AccessDecision::Redirect(to) => Gated::Redirect(to),
        }
    }
}
