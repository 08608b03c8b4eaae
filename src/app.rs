use crate::config::{auth::AuthConfig, jwt::JwtConfig, rate_limit::RateLimitConfig, upload::UploadConfig};
use crate::middleware::{
    auth::session_middleware,
    gate::gate_middleware,
    security::{security_headers_middleware, SecurityHeadersConfig},
};
use crate::openapi::ApiDoc;
use crate::routes;
use crate::services::email::EmailService;
use crate::services::upload::{LocalObjectStore, ObjectStore};
use crate::utils::cookie::CookieConfig;
use axum::{middleware, Extension, Router};
use sea_orm::DatabaseConnection;
use std::env;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Everything the router needs, built once at startup (or per test).
#[derive(Clone)]
pub struct AppContext {
    pub db: DatabaseConnection,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
    pub cookies: CookieConfig,
    pub email: EmailService,
    pub upload: UploadConfig,
    pub store: Arc<dyn ObjectStore>,
    pub rate_limit: RateLimitConfig,
    pub security: SecurityHeadersConfig,
}

impl AppContext {
    /// Context from environment variables for an already connected database.
    pub fn from_env(db: DatabaseConnection, jwt: JwtConfig) -> Self {
        let upload = UploadConfig::from_env();
        let store: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::from_config(&upload));
        Self {
            db,
            jwt,
            auth: AuthConfig::from_env(),
            cookies: CookieConfig::from_env(),
            email: EmailService::from_env(),
            upload,
            store,
            rate_limit: RateLimitConfig::from_env(),
            security: SecurityHeadersConfig::from_env(),
        }
    }
}

/// Request path: tracing, CORS and security headers, then extensions, session
/// resolution and the access gate, then the handler. `TraceLayer` sits outside
/// `CorsLayer` because CORS needs a `Default` response body.
pub fn create_app(ctx: AppContext) -> Router {
    Router::new()
        .merge(routes::create_routes(&ctx.rate_limit))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/uploads", ServeDir::new(&ctx.upload.upload_dir))
        .layer(middleware::from_fn(gate_middleware))
        .layer(middleware::from_fn(session_middleware))
        .layer(Extension(ctx.db))
        .layer(Extension(ctx.jwt))
        .layer(Extension(ctx.auth))
        .layer(Extension(ctx.cookies))
        .layer(Extension(ctx.email))
        .layer(Extension(ctx.store))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(middleware::from_fn_with_state(
                    ctx.security,
                    security_headers_middleware,
                )),
        )
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}
