mod common;

use chrono::{Duration, Utc};
use lekhok::middleware::AuthUser;
use lekhok::models::Role;
use lekhok::services::forum::ForumService;
use serde_json::{json, Value};

#[tokio::test]
async fn test_admin_changes_roles() {
    let app = common::spawn_app().await;
    let (admin_id, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (user_id, user) = common::create_user(&app, "member").await;

    let resp = app
        .client
        .put(app.url(&format!("/admin/users/{user_id}/role")))
        .bearer_auth(&admin)
        .json(&json!({ "role": "author" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["role"], "author");

    // The promoted user's existing token now opens the author area
    assert_eq!(app.get("/author/posts", Some(&user)).await.status(), 200);

    let resp = app
        .client
        .put(app.url(&format!("/admin/users/{admin_id}/role")))
        .bearer_auth(&admin)
        .json(&json!({ "role": "user" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_suspended_user_reads_but_cannot_write() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (user_id, user) = common::create_user(&app, "troll").await;
    let category = common::create_forum_category(&app, &admin).await;

    let resp = app
        .post(
            &format!("/admin/users/{user_id}/suspend"),
            &admin,
            json!({ "days": 7 }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["is_suspended"], true);
    assert!(body["data"]["suspended_until"].is_string());

    let resp = app
        .post(
            "/forum/threads",
            &user,
            json!({ "title": "Let me in", "content": "please", "category_id": category }),
        )
        .await;
    assert_eq!(resp.status(), 403);
    assert_eq!(app.get("/forum/threads", Some(&user)).await.status(), 200);
    assert_eq!(app.get("/profile", Some(&user)).await.status(), 200);

    app.post(&format!("/admin/users/{user_id}/unsuspend"), &admin, json!({}))
        .await;
    let resp = app
        .post(
            "/forum/threads",
            &user,
            json!({ "title": "Back again", "content": "thanks", "category_id": category }),
        )
        .await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_suspension_lapses_without_unsuspend() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (user_id, _) = common::create_user(&app, "timed").await;
    let category = common::create_forum_category(&app, &admin).await;

    let resp = app
        .post(
            &format!("/admin/users/{user_id}/suspend"),
            &admin,
            json!({ "days": 1 }),
        )
        .await;
    assert_eq!(resp.status(), 200);

    let actor = AuthUser::load(&app.db, user_id).await.unwrap().unwrap();
    let service = ForumService::new(app.db.clone());
    let today = Utc::now().naive_utc();

    let blocked = service
        .create_thread(&actor, "Too soon", "body", category, today)
        .await;
    assert!(blocked.is_err());

    let later = today + Duration::days(2);
    let thread = service
        .create_thread(&actor, "Served my time", "body", category, later)
        .await
        .unwrap();
    assert_eq!(thread.user_id, user_id);
}

#[tokio::test]
async fn test_suspend_validation() {
    let app = common::spawn_app().await;
    let (admin_id, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (user_id, _) = common::create_user(&app, "member").await;

    let resp = app
        .post(
            &format!("/admin/users/{user_id}/suspend"),
            &admin,
            json!({ "days": 0 }),
        )
        .await;
    assert_eq!(resp.status(), 400);

    let resp = app
        .post(
            &format!("/admin/users/{admin_id}/suspend"),
            &admin,
            json!({ "days": 3 }),
        )
        .await;
    assert_eq!(resp.status(), 400);

    let resp = app
        .post("/admin/users/9999/suspend", &admin, json!({ "days": 3 }))
        .await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_stats_and_user_listing() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (_, author) = common::create_user_with_role(&app, "author", Role::Author).await;
    common::publish_post(&app, &author, &admin, "Counted").await;
    let pending = common::create_draft(&app, &author, "Waiting").await;
    app.post(&format!("/author/posts/{pending}/submit"), &author, json!({}))
        .await;

    let stats: Value = app.get("/admin/stats", Some(&admin)).await.json().await.unwrap();
    assert_eq!(stats["data"]["total_users"], 2);
    assert_eq!(stats["data"]["approved_posts"], 1);
    assert_eq!(stats["data"]["pending_posts"], 1);

    let users: Value = app
        .get("/admin/users?per_page=1", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(users["data"]["total"], 2);
    assert_eq!(users["data"]["total_pages"], 2);
    assert_eq!(users["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_category_request_approval() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (_, author) = common::create_user_with_role(&app, "author", Role::Contributor).await;

    let mut ids = Vec::new();
    for (name, name_bn) in [("Travel", "ভ্রমণ"), ("Gossip", "গুজব")] {
        let resp = app
            .post(
                "/author/category-requests",
                &author,
                json!({ "name": name, "name_bn": name_bn }),
            )
            .await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["status"], "pending");
        ids.push(body["data"]["id"].as_i64().unwrap());
    }

    let pending: Value = app
        .get("/admin/category-requests?status=pending", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(pending["data"].as_array().unwrap().len(), 2);

    let resp = app
        .post(&format!("/admin/category-requests/{}/approve", ids[0]), &admin, json!({}))
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["slug"], "travel");

    let resp = app
        .post(&format!("/admin/category-requests/{}/reject", ids[1]), &admin, json!({}))
        .await;
    assert_eq!(resp.status(), 200);

    // A closed request cannot be decided again
    let resp = app
        .post(&format!("/admin/category-requests/{}/approve", ids[1]), &admin, json!({}))
        .await;
    assert!(resp.status().is_client_error());

    let categories: Value = app.get("/categories", None).await.json().await.unwrap();
    let names: Vec<&str> = categories["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Travel"]);
}

#[tokio::test]
async fn test_deleting_category_keeps_posts() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let category_id = common::create_category(&app, &admin).await;

    let resp = app
        .post(
            "/author/posts",
            &admin,
            json!({ "title": "Orphan", "content": "<p>x</p>", "category_id": category_id }),
        )
        .await;
    let body: Value = resp.json().await.unwrap();
    let post_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .delete(app.url(&format!("/admin/categories/{category_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app.get(&format!("/author/posts/{post_id}"), Some(&admin)).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["category_id"].is_null());
}

#[tokio::test]
async fn test_profile_view_and_update() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_user(&app, "profiled").await;

    let resp = app
        .client
        .put(app.url("/profile"))
        .bearer_auth(&token)
        .json(&json!({ "full_name": "Rabindra", "bio": "  Poet  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let profile: Value = app.get("/profile", Some(&token)).await.json().await.unwrap();
    assert_eq!(profile["data"]["user"]["id"], user_id);
    assert_eq!(profile["data"]["user"]["full_name"], "Rabindra");
    assert_eq!(profile["data"]["user"]["bio"], "Poet");
    assert_eq!(profile["data"]["comment_count"], 0);

    let resp = app
        .client
        .put(app.url("/profile"))
        .bearer_auth(&token)
        .json(&json!({ "full_name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
