mod common;

use lekhok::models::Role;
use serde_json::{json, Value};

#[tokio::test]
async fn test_health_check() {
    let app = common::spawn_app().await;

    let resp = app.get("/", None).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_signup_and_me() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_user(&app, "signup").await;

    let resp = app.get("/auth/me", Some(&token)).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], user_id);
    assert_eq!(body["data"]["role"], "user");
    assert!(body["data"]["password_hash"].is_null());
}

#[tokio::test]
async fn test_signup_duplicate_rejected() {
    let app = common::spawn_app().await;
    let payload = json!({
        "username": "dupe_user",
        "email": "dupe@test.com",
        "password": "test_password_123"
    });

    let first = app
        .client
        .post(app.url("/auth/signup"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    let second = app
        .client
        .post(app.url("/auth/signup"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 400);
}

#[tokio::test]
async fn test_signup_short_password_rejected() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/signup"))
        .json(&json!({
            "username": "shorty",
            "email": "shorty@test.com",
            "password": "short"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

async fn login(app: &common::TestApp, body: Value) -> reqwest::Response {
    app.client
        .post(app.url("/auth/login"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn username_of(app: &common::TestApp, token: &str) -> (String, String) {
    let me: Value = app.get("/auth/me", Some(token)).await.json().await.unwrap();
    (
        me["data"]["username"].as_str().unwrap().to_string(),
        me["data"]["email"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_login_with_username_or_email() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_user(&app, "login").await;
    let (username, email) = username_of(&app, &token).await;

    for identifier in [username, email] {
        let resp = login(
            &app,
            json!({ "identifier": identifier, "password": "test_password_123" }),
        )
        .await;
        assert_eq!(resp.status(), 200, "{identifier}");
        assert!(resp.headers().get("set-cookie").is_some());
        let body: Value = resp.json().await.unwrap();
        assert!(body["data"]["token"].as_str().is_some());
        assert_eq!(body["data"]["redirect_to"], "/");
    }
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_user(&app, "badpw").await;
    let (username, _) = username_of(&app, &token).await;

    let resp = login(
        &app,
        json!({ "identifier": username, "password": "definitely_wrong" }),
    )
    .await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_login_redirects_by_role_and_request() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_user_with_role(&app, "mod", Role::Moderator).await;
    let (username, _) = username_of(&app, &token).await;

    let cases = [
        (None, "/moderator"),
        (Some("/forum/threads"), "/forum/threads"),
        (Some("//evil.example"), "/moderator"),
    ];
    for (requested, expected) in cases {
        let mut payload = json!({ "identifier": username, "password": "test_password_123" });
        if let Some(path) = requested {
            payload["redirect"] = json!(path);
        }
        let body: Value = login(&app, payload).await.json().await.unwrap();
        assert_eq!(body["data"]["redirect_to"], expected, "{requested:?}");
    }
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = common::spawn_app().await;

    let resp = app.get("/auth/me", None).await;
    assert_eq!(resp.status(), 401);

    let resp = app.get("/auth/me", Some("not-a-jwt")).await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_refresh_rotates_token() {
    let app = common::spawn_app().await;
    let resp = app
        .client
        .post(app.url("/auth/signup"))
        .json(&json!({
            "username": "refresher",
            "email": "refresher@test.com",
            "password": "test_password_123"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let resp = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "refresh_token": refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // The old refresh token was consumed by the rotation
    let resp = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&json!({ "refresh_token": refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
