use crate::config::{auth::AuthConfig, jwt::JwtConfig};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Role, UserModel};
use crate::response::ApiResponse;
use crate::services::auth::{post_login_redirect, AuthService, NewAccount, TokenPair};
use crate::services::email::EmailService;
use crate::utils::cookie::{extract_cookie, CookieConfig, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use anyhow::anyhow;
use axum::{
    extract::Query,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    /// Username (3-50 characters)
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    /// Email address
    #[validate(email)]
    pub email: String,
    /// Password (min 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
    /// Display name, defaults to the username
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username or email
    pub identifier: String,
    /// User password
    pub password: String,
    /// Local path to return to after login
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    pub token: String,
    /// JWT refresh token
    pub refresh_token: String,
    pub user: UserResponse,
    /// Where the client should navigate next
    pub redirect_to: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub user: UserResponse,
    /// Absent while the email address awaits verification
    pub token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    /// User ID
    pub id: i32,
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    pub full_name: String,
    /// Avatar URL
    pub avatar_url: Option<String>,
    /// User bio/description
    pub bio: Option<String>,
    pub reputation_points: i32,
    pub role: Role,
    pub is_suspended: bool,
    pub suspended_until: Option<String>,
    pub email_verified: bool,
    pub created_at: String,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            bio: user.bio,
            reputation_points: user.reputation_points,
            role: user.role,
            is_suspended: user.is_suspended,
            suspended_until: user.suspended_until.map(|t| t.to_string()),
            email_verified: user.email_verified,
            created_at: user.created_at.to_string(),
        }
    }
}

/// Public view of a user embedded in posts, comments and threads.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

impl From<UserModel> for UserSummary {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = SignupResponse),
        (status = 400, description = "Validation error or duplicate account", body = AppError),
    ),
    tag = "auth"
)]
pub async fn signup(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth_config): Extension<AuthConfig>,
    Extension(jwt): Extension<JwtConfig>,
    Extension(cookies): Extension<CookieConfig>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<Response> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = AuthService::new(db, auth_config, jwt.clone());
    let (user, tokens) = service
        .signup(
            NewAccount {
                username: payload.username.trim(),
                email: payload.email.trim(),
                password: &payload.password,
                full_name: payload.full_name.as_deref().unwrap_or(""),
            },
            &email_service,
        )
        .await?;

    let message = if tokens.is_some() {
        "Registration successful."
    } else {
        "Registration successful. Please check your email to verify your account."
    };

    let response = SignupResponse {
        user: UserResponse::from(user),
        token: tokens.as_ref().map(|t| t.access_token.clone()),
        refresh_token: tokens.as_ref().map(|t| t.refresh_token.clone()),
    };

    let mut http_response = ApiResponse::with_message(response, message).into_response();
    if let Some(tokens) = &tokens {
        set_auth_cookies(&mut http_response, &cookies, &jwt, tokens)?;
    }
    Ok(http_response)
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    params(("redirect" = Option<String>, Query, description = "Local path to return to")),
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Email not verified", body = AppError),
        (status = 401, description = "Invalid credentials", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth_config): Extension<AuthConfig>,
    Extension(jwt): Extension<JwtConfig>,
    Extension(cookies): Extension<CookieConfig>,
    Query(query): Query<RedirectQuery>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Response> {
    let service = AuthService::new(db, auth_config, jwt.clone());
    let (user, tokens) = service
        .login(payload.identifier.trim(), &payload.password)
        .await?;

    let requested = payload.redirect.or(query.redirect);
    let response = AuthResponse {
        token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
        redirect_to: post_login_redirect(user.role, requested.as_deref()),
        user: UserResponse::from(user),
    };

    let mut http_response = ApiResponse::ok(response).into_response();
    set_auth_cookies(&mut http_response, &cookies, &jwt, &tokens)?;
    Ok(http_response)
}

#[utoipa::path(
    get,
    path = "/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current user retrieved successfully", body = UserResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn me(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth_config): Extension<AuthConfig>,
    Extension(jwt): Extension<JwtConfig>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db, auth_config, jwt);
    let user = service.get_user_by_id(auth_user.user_id).await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    /// Email verification token
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified successfully", body = String),
        (status = 400, description = "Invalid token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn verify_email(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth_config): Extension<AuthConfig>,
    Extension(jwt): Extension<JwtConfig>,
    Json(payload): Json<VerifyEmailRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db, auth_config, jwt);
    service.verify_email(&payload.token).await?;
    Ok(ApiResponse::ok("Email verified successfully"))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResendVerificationRequest {
    #[validate(email)]
    pub email: String,
}

#[utoipa::path(
    post,
    path = "/auth/resend-verification",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Verification email sent if the account exists", body = String),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth_config): Extension<AuthConfig>,
    Extension(jwt): Extension<JwtConfig>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<ResendVerificationRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db, auth_config, jwt);
    service
        .resend_verification(payload.email.trim(), &email_service)
        .await?;
    Ok(ApiResponse::ok(
        "If the account exists, a verification link has been sent",
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    /// Refresh token
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// New JWT access token
    pub token: String,
    /// New JWT refresh token
    pub refresh_token: String,
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair issued", body = TokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth_config): Extension<AuthConfig>,
    Extension(jwt): Extension<JwtConfig>,
    Extension(cookies): Extension<CookieConfig>,
    headers: HeaderMap,
    payload: Option<Json<RefreshTokenRequest>>,
) -> AppResult<Response> {
    let presented = presented_refresh_token(&headers, payload).ok_or(AppError::Unauthorized)?;

    let service = AuthService::new(db, auth_config, jwt.clone());
    let tokens = service.refresh(&presented).await?;

    let response = TokenResponse {
        token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
    };

    let mut http_response = ApiResponse::ok(response).into_response();
    set_auth_cookies(&mut http_response, &cookies, &jwt, &tokens)?;
    Ok(http_response)
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Logout successful", body = String),
    ),
    tag = "auth"
)]
pub async fn logout(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth_config): Extension<AuthConfig>,
    Extension(jwt): Extension<JwtConfig>,
    Extension(cookies): Extension<CookieConfig>,
    headers: HeaderMap,
    payload: Option<Json<RefreshTokenRequest>>,
) -> AppResult<Response> {
    if let Some(presented) = presented_refresh_token(&headers, payload) {
        AuthService::new(db, auth_config, jwt)
            .logout(&presented)
            .await?;
    }

    let mut response = ApiResponse::ok("Logout successful").into_response();
    append_set_cookie(&mut response, &cookies.clear(ACCESS_TOKEN_COOKIE))?;
    append_set_cookie(&mut response, &cookies.clear(REFRESH_TOKEN_COOKIE))?;
    Ok(response)
}

/// Body field first, then the HttpOnly cookie.
fn presented_refresh_token(
    headers: &HeaderMap,
    payload: Option<Json<RefreshTokenRequest>>,
) -> Option<String> {
    payload
        .and_then(|Json(body)| body.refresh_token)
        .filter(|t| !t.is_empty())
        .or_else(|| extract_cookie(headers, REFRESH_TOKEN_COOKIE))
}

fn set_auth_cookies(
    response: &mut Response,
    cookies: &CookieConfig,
    jwt: &JwtConfig,
    tokens: &TokenPair,
) -> AppResult<()> {
    append_set_cookie(
        response,
        &cookies.build(ACCESS_TOKEN_COOKIE, &tokens.access_token, jwt.access_token_expiry),
    )?;
    append_set_cookie(
        response,
        &cookies.build(REFRESH_TOKEN_COOKIE, &tokens.refresh_token, jwt.refresh_token_expiry),
    )?;
    Ok(())
}

fn append_set_cookie(response: &mut Response, cookie_value: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie_value).map_err(|e| {
        AppError::Internal(anyhow!("Failed to build Set-Cookie header value: {}", e))
    })?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
