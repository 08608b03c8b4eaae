use lekhok::config::{self, jwt::JwtConfig};
use lekhok::migration::Migrator;
use lekhok::services::bootstrap_admin::{ensure_bootstrap_admin, BootstrapAdminConfig};
use lekhok::{create_app, AppContext};
use sea_orm_migration::MigratorTrait;
use std::env;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lekhok=debug,tower_http=debug,axum=debug".into());
    // LOG_FORMAT=json switches to structured output
    let json_logs = env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;

    tracing::info!("Starting Lekhok API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let ctx = AppContext::from_env(db, jwt_config);

    if let Some(admin) = BootstrapAdminConfig::from_env() {
        ensure_bootstrap_admin(&ctx.db, &admin, ctx.auth.bcrypt_cost).await?;
    }

    if ctx.email.is_configured() {
        tracing::info!("SMTP email service configured");
    } else {
        tracing::warn!("SMTP not configured, emails will be skipped");
    }
    if !ctx.rate_limit.enabled {
        tracing::warn!("Rate limiting disabled");
    }

    let app = create_app(ctx);

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<JwtConfig> {
    let jwt_config = JwtConfig::from_env()?;

    // DATABASE_URL is checked here for an early error; the connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
    std::fs::create_dir_all(&upload_dir).map_err(|e| {
        anyhow::anyhow!("Failed to create upload directory '{}': {}", upload_dir, e)
    })?;

    Ok(jwt_config)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
