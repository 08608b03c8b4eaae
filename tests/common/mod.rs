#![allow(dead_code)]

use lekhok::config::{
    auth::AuthConfig, jwt::JwtConfig, rate_limit::RateLimitConfig, upload::UploadConfig,
};
use lekhok::middleware::security::SecurityHeadersConfig;
use lekhok::models::{user, Role};
use lekhok::services::email::EmailService;
use lekhok::services::upload::{LocalObjectStore, ObjectStore};
use lekhok::utils::cookie::CookieConfig;
use lekhok::AppContext;
use reqwest::{redirect::Policy, Client};
use sea_orm::{ActiveModelTrait, ConnectOptions, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const JWT_SECRET: &str = "integration_test_secret_that_is_at_least_32_characters_long";

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn next_id() -> usize {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    pub upload_dir: PathBuf,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("GET failed")
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("POST failed")
    }
}

/// Fresh app on its own in-memory SQLite database.
pub async fn spawn_app() -> TestApp {
    // One connection: every pooled connection would otherwise get its own empty database
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = sea_orm::Database::connect(opts)
        .await
        .expect("Failed to open test database");

    serve(db).await
}

/// App on a file-backed SQLite database with a real connection pool, for
/// requests that must hit the database concurrently.
pub async fn spawn_pooled_app(connections: u32) -> TestApp {
    let path = std::env::temp_dir().join(format!("lekhok-test-{}.db", uuid::Uuid::new_v4()));
    let mut opts = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    opts.max_connections(connections).sqlx_logging(false);
    let db = sea_orm::Database::connect(opts)
        .await
        .expect("Failed to open test database");

    serve(db).await
}

async fn serve(db: DatabaseConnection) -> TestApp {
    lekhok::migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let upload_dir = std::env::temp_dir().join(format!("lekhok-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&upload_dir).expect("Failed to create upload dir");
    let upload = UploadConfig {
        upload_dir: upload_dir.to_string_lossy().into_owned(),
        public_url: "/uploads".to_string(),
    };
    let store: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(&upload_dir, "/uploads"));

    let ctx = AppContext {
        db: db.clone(),
        jwt: JwtConfig::new(JWT_SECRET).expect("valid secret"),
        auth: AuthConfig {
            require_email_verification: false,
            bcrypt_cost: 4,
        },
        cookies: CookieConfig::default(),
        email: EmailService::disabled(),
        upload,
        store,
        rate_limit: RateLimitConfig::disabled(),
        security: SecurityHeadersConfig::default(),
    };
    let app = lekhok::create_app(ctx);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    // Gate redirects are asserted on, not followed
    let client = Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client,
        upload_dir,
    }
}

/// Sign up a user and return (user_id, token).
pub async fn create_user(app: &TestApp, prefix: &str) -> (i32, String) {
    let username = format!("{}_{}", prefix, next_id());

    let resp = app
        .client
        .post(app.url("/auth/signup"))
        .json(&json!({
            "username": username,
            "email": format!("{}@test.com", username),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to sign up");

    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    assert!(
        body["success"].as_bool().unwrap_or(false),
        "signup for '{username}' failed: status={status}, body={body}"
    );

    let user_id = body["data"]["user"]["id"].as_i64().unwrap() as i32;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    (user_id, token)
}

/// Roles are read from the database on every request, so the token stays valid.
pub async fn set_role(db: &DatabaseConnection, user_id: i32, role: Role) {
    let found = user::Entity::find_by_id(user_id)
        .one(db)
        .await
        .unwrap()
        .expect("user exists");
    let mut active: user::ActiveModel = found.into();
    active.role = Set(role);
    active.update(db).await.unwrap();
}

pub async fn create_user_with_role(app: &TestApp, prefix: &str, role: Role) -> (i32, String) {
    let (id, token) = create_user(app, prefix).await;
    set_role(&app.db, id, role).await;
    (id, token)
}

/// Create an article category as admin and return its id.
pub async fn create_category(app: &TestApp, admin_token: &str) -> i32 {
    let n = next_id();
    let resp = app
        .post(
            "/admin/categories",
            admin_token,
            json!({
                "name": format!("Category {n}"),
                "name_bn": format!("বিভাগ {n}"),
                "display_order": 1
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap() as i32
}

/// Create a forum category as admin and return its id.
pub async fn create_forum_category(app: &TestApp, admin_token: &str) -> i32 {
    let n = next_id();
    let resp = app
        .post(
            "/admin/forum/categories",
            admin_token,
            json!({
                "name": format!("Forum {n}"),
                "name_bn": format!("ফোরাম {n}"),
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap() as i32
}

/// Create a draft and return its id.
pub async fn create_draft(app: &TestApp, token: &str, title: &str) -> i32 {
    let resp = app
        .post(
            "/author/posts",
            token,
            json!({
                "title": title,
                "content": "<p>Some words worth reading.</p>"
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap() as i32
}

/// Draft, submit and approve a post; returns (id, slug).
pub async fn publish_post(
    app: &TestApp,
    author_token: &str,
    moderator_token: &str,
    title: &str,
) -> (i32, String) {
    let id = create_draft(app, author_token, title).await;
    let resp = app
        .post(&format!("/author/posts/{id}/submit"), author_token, json!({}))
        .await;
    assert_eq!(resp.status(), 200);
    let resp = app
        .post(
            &format!("/moderator/posts/{id}/approve"),
            moderator_token,
            json!({}),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    (id, body["data"]["slug"].as_str().unwrap().to_string())
}
