use crate::{
    config::jwt::JwtConfig,
    error::{AppError, AppResult},
    models::{Role, User, UserModel},
    utils::{
        cookie::{extract_cookie, ACCESS_TOKEN_COOKIE},
        jwt::{decode_jwt, is_access_token},
    },
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};
use chrono::NaiveDateTime;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait};
use std::convert::Infallible;

/// Session context for one request, read from the users table every time so
/// role and suspension changes apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: Role,
    pub is_suspended: bool,
    pub suspended_until: Option<NaiveDateTime>,
}

impl From<&UserModel> for AuthUser {
    fn from(user: &UserModel) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            is_suspended: user.is_suspended,
            suspended_until: user.suspended_until,
        }
    }
}

impl AuthUser {
    pub async fn load<C: ConnectionTrait>(db: &C, user_id: i32) -> AppResult<Option<Self>> {
        Ok(User::find_by_id(user_id)
            .one(db)
            .await?
            .map(|user| Self::from(&user)))
    }

    pub fn is_active_suspension(&self, now: NaiveDateTime) -> bool {
        self.is_suspended && self.suspended_until.map_or(true, |until| until > now)
    }

    /// Suspended accounts can read but not write.
    pub fn ensure_not_suspended(&self, now: NaiveDateTime) -> AppResult<()> {
        if self.is_active_suspension(now) {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    pub fn require_writer(&self) -> AppResult<()> {
        require(self.role.can_write())
    }

    pub fn require_staff(&self) -> AppResult<()> {
        require(self.role.is_staff())
    }

    pub fn require_admin(&self) -> AppResult<()> {
        require(self.role.is_admin())
    }
}

fn require(allowed: bool) -> AppResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Resolves the optional session. A missing or invalid token leaves the
/// request anonymous; the gate and the `AuthUser` extractor decide what that means.
pub async fn session_middleware(
    Extension(db): Extension<DatabaseConnection>,
    Extension(jwt): Extension<JwtConfig>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Prefer Authorization: Bearer, fallback to HttpOnly cookie.
    let token = extract_bearer_token(&headers)
        .or_else(|| extract_cookie(&headers, ACCESS_TOKEN_COOKIE));

    if let Some(token) = token {
        match decode_jwt(&jwt, &token) {
            Ok(claims) if is_access_token(&claims) => {
                if let Some(user_id) = claims.user_id() {
                    if let Some(user) = AuthUser::load(&db, user_id).await? {
                        request.extensions_mut().insert(user);
                    }
                }
            }
            Ok(_) => tracing::debug!("refresh token presented as access token"),
            Err(e) => tracing::debug!("ignoring invalid session token: {e}"),
        }
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// `Option<AuthUser>` for routes that read anonymously but personalise for a session.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthUser>().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn session(role: Role, is_suspended: bool, until: Option<NaiveDateTime>) -> AuthUser {
        AuthUser {
            user_id: 1,
            role,
            is_suspended,
            suspended_until: until,
        }
    }

    #[test]
    fn bearer_token_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc"),
        );
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer "),
        );
        assert!(extract_bearer_token(&headers).is_none());
    }

    #[test]
    fn suspension_blocks_writes_until_expiry() {
        let now = chrono::Utc::now().naive_utc();
        let user = session(Role::Author, true, Some(now + Duration::days(3)));
        assert!(matches!(user.ensure_not_suspended(now), Err(AppError::Forbidden)));
        assert!(user
            .ensure_not_suspended(now + Duration::days(3) + Duration::seconds(1))
            .is_ok());
    }

    #[test]
    fn role_requirements() {
        assert!(session(Role::Contributor, false, None).require_writer().is_ok());
        assert!(session(Role::User, false, None).require_writer().is_err());
        assert!(session(Role::Moderator, false, None).require_staff().is_ok());
        assert!(session(Role::Moderator, false, None).require_admin().is_err());
    }
}
