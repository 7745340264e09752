//! The session/route guard: a page-level gate that decides, per request
//! path, whether a session must be present. It is independent of the rule
//! evaluator — "may view this page" and "may read this record" are separate
//! decisions, and this module only makes the first.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use url::form_urlencoded;

use crate::config;

use super::session::CurrentSession;

/// Classification of a request path against the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a resolved session
    Protected,
    /// The login/signup surface; sessions are redirected away
    AuthOnly,
    Public,
}

/// Externally supplied prefix lists marking Protected and AuthOnly paths
#[derive(Debug, Clone)]
pub struct RouteTable {
    pub protected_prefixes: Vec<String>,
    pub auth_only_prefixes: Vec<String>,
}

impl RouteTable {
    pub fn from_config() -> Self {
        let guard = &config::config().guard;
        Self {
            protected_prefixes: guard.protected_prefixes.clone(),
            auth_only_prefixes: guard.auth_only_prefixes.clone(),
        }
    }

    /// Longest matching prefix wins, so a protected area may contain a more
    /// specific auth-only surface and vice versa.
    pub fn classify(&self, path: &str) -> RouteClass {
        let protected = longest_match(&self.protected_prefixes, path);
        let auth_only = longest_match(&self.auth_only_prefixes, path);
        match (protected, auth_only) {
            (Some(p), Some(a)) if a > p => RouteClass::AuthOnly,
            (Some(_), _) => RouteClass::Protected,
            (None, Some(_)) => RouteClass::AuthOnly,
            (None, None) => RouteClass::Public,
        }
    }
}

fn longest_match(prefixes: &[String], path: &str) -> Option<usize> {
    prefixes
        .iter()
        .filter(|prefix| {
            path == prefix.as_str()
                || path.starts_with(&format!("{}/", prefix.trim_end_matches('/')))
        })
        .map(|prefix| prefix.len())
        .max()
}

/// What the guard decided for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    PassThrough,
    /// Send to the auth surface, carrying the original path for resumption
    RedirectToAuth { resume: String },
    /// Already signed in; send to the default authenticated destination
    RedirectToHome,
}

/// Pure decision function over (path, session-presence). No other inputs.
pub fn evaluate(routes: &RouteTable, path: &str, has_session: bool) -> GuardOutcome {
    match routes.classify(path) {
        RouteClass::Protected if !has_session => GuardOutcome::RedirectToAuth {
            resume: path.to_string(),
        },
        RouteClass::AuthOnly if has_session => GuardOutcome::RedirectToHome,
        _ => GuardOutcome::PassThrough,
    }
}

/// Axum wrapper around [`evaluate`]. Runs after session resolution and ahead
/// of every data operation.
pub async fn route_guard_middleware(request: Request, next: Next) -> Response {
    let routes = RouteTable::from_config();
    let has_session = request
        .extensions()
        .get::<CurrentSession>()
        .map_or(false, |s| s.0.is_some());
    let path = request.uri().path().to_string();

    match evaluate(&routes, &path, has_session) {
        GuardOutcome::PassThrough => next.run(request).await,
        GuardOutcome::RedirectToAuth { resume } => {
            let guard = &config::config().guard;
            let query: String = form_urlencoded::Serializer::new(String::new())
                .append_pair("resume", &resume)
                .finish();
            tracing::debug!(path = %resume, "redirecting unauthenticated request to auth surface");
            Redirect::temporary(&format!("{}?{}", guard.auth_path, query)).into_response()
        }
        GuardOutcome::RedirectToHome => {
            let guard = &config::config().guard;
            tracing::debug!(%path, "redirecting authenticated request away from auth surface");
            Redirect::temporary(&guard.home_path).into_response()
        }
    }
}
