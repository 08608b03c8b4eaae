use crate::middleware::auth::AuthUser;
use crate::models::Role;
use crate::utils::text::encode_query_value;
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectLogin,
    RedirectHome,
}

#[derive(Debug, Clone, Copy)]
enum Requirement {
    AnyAuthenticated,
    AtLeast(Role),
}

/// Gated areas. Matching is per whole segment, so no prefix shadows another.
const AREAS: &[(&str, Requirement)] = &[
    ("/admin", Requirement::AtLeast(Role::Admin)),
    ("/moderator", Requirement::AtLeast(Role::Moderator)),
    ("/author", Requirement::AtLeast(Role::Contributor)),
    ("/profile", Requirement::AnyAuthenticated),
];

/// `/admin` matches `/admin` and `/admin/...` but not `/administrator`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub fn evaluate(path: &str, role: Option<Role>) -> GateDecision {
    let Some((_, requirement)) = AREAS
        .iter()
        .find(|(prefix, _)| matches_prefix(path, prefix))
    else {
        return GateDecision::Allow;
    };

    match (requirement, role) {
        (_, None) => GateDecision::RedirectLogin,
        (Requirement::AnyAuthenticated, Some(_)) => GateDecision::Allow,
        (Requirement::AtLeast(min), Some(role)) if role >= *min => GateDecision::Allow,
        (Requirement::AtLeast(_), Some(_)) => GateDecision::RedirectHome,
    }
}

pub fn login_redirect_target(path: &str) -> String {
    format!("/auth/login?redirect={}", encode_query_value(path))
}

/// Applies [`evaluate`] to every request using the session resolved upstream.
pub async fn gate_middleware(request: Request, next: Next) -> Response {
    let role = request.extensions().get::<AuthUser>().map(|user| user.role);
    let path = request.uri().path().to_string();

    match evaluate(&path, role) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::RedirectLogin => {
            tracing::debug!(path = %path, "gate: login required");
            Redirect::temporary(&login_redirect_target(&path)).into_response()
        }
        GateDecision::RedirectHome => {
            tracing::debug!(path = %path, ?role, "gate: role not allowed");
            Redirect::temporary("/").into_response()
        }
    }
}
