mod common;

use lekhok::models::Role;
use serde_json::{json, Value};

#[tokio::test]
async fn test_review_workflow_publishes_post() {
    let app = common::spawn_app().await;
    let (author_id, author) = common::create_user_with_role(&app, "author", Role::Author).await;
    let (_, moderator) = common::create_user_with_role(&app, "mod", Role::Moderator).await;

    let id = common::create_draft(&app, &author, "Monsoon Notes").await;

    // Drafts are invisible to the public
    let listing: Value = app.get("/posts", None).await.json().await.unwrap();
    assert_eq!(listing["data"]["total"], 0);

    let resp = app
        .post(&format!("/author/posts/{id}/submit"), &author, json!({}))
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "pending");

    let queue: Value = app.get("/moderator/posts", Some(&moderator)).await.json().await.unwrap();
    assert_eq!(queue["data"].as_array().unwrap().len(), 1);
    assert_eq!(queue["data"][0]["author"]["id"], author_id);

    let resp = app
        .post(&format!("/moderator/posts/{id}/approve"), &moderator, json!({}))
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "approved");
    assert!(body["data"]["published_at"].is_string());
    let slug = body["data"]["slug"].as_str().unwrap().to_string();
    assert!(slug.starts_with("monsoon-notes-"), "{slug}");

    let listing: Value = app.get("/posts", None).await.json().await.unwrap();
    assert_eq!(listing["data"]["total"], 1);
    assert_eq!(listing["data"]["items"][0]["slug"], slug);

    let resp = app.get(&format!("/posts/{slug}"), None).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Monsoon Notes");
    assert_eq!(body["data"]["view_count"], 1);
}

#[tokio::test]
async fn test_reject_requires_reason_and_allows_resubmission() {
    let app = common::spawn_app().await;
    let (_, author) = common::create_user_with_role(&app, "author", Role::Author).await;
    let (_, moderator) = common::create_user_with_role(&app, "mod", Role::Moderator).await;

    let id = common::create_draft(&app, &author, "Rough Draft").await;
    app.post(&format!("/author/posts/{id}/submit"), &author, json!({}))
        .await;

    let resp = app
        .post(
            &format!("/moderator/posts/{id}/reject"),
            &moderator,
            json!({ "reason": "" }),
        )
        .await;
    assert_eq!(resp.status(), 400);

    let resp = app
        .post(
            &format!("/moderator/posts/{id}/reject"),
            &moderator,
            json!({ "reason": "Needs sources" }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "rejected");
    assert_eq!(body["data"]["rejection_reason"], "Needs sources");

    let listing: Value = app.get("/posts", None).await.json().await.unwrap();
    assert_eq!(listing["data"]["total"], 0);

    let own: Value = app
        .get(&format!("/author/posts/{id}"), Some(&author))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(own["data"]["status"], "rejected");
    assert_eq!(own["data"]["rejection_reason"], "Needs sources");

    // A rejected post goes back to review through an edit
    let resp = app
        .client
        .put(app.url(&format!("/author/posts/{id}")))
        .bearer_auth(&author)
        .json(&json!({
            "title": "Rough Draft, Revised",
            "content": "<p>Now with sources.</p>",
            "status": "pending"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "pending");
    assert!(body["data"]["rejection_reason"].is_null());
}

#[tokio::test]
async fn test_invalid_transitions_conflict() {
    let app = common::spawn_app().await;
    let (_, author) = common::create_user_with_role(&app, "author", Role::Author).await;
    let (_, moderator) = common::create_user_with_role(&app, "mod", Role::Moderator).await;

    let id = common::create_draft(&app, &author, "Not Yet").await;

    // Only pending posts can be reviewed
    let resp = app
        .post(&format!("/moderator/posts/{id}/approve"), &moderator, json!({}))
        .await;
    assert_eq!(resp.status(), 409);

    app.post(&format!("/author/posts/{id}/submit"), &author, json!({}))
        .await;
    let resp = app
        .post(&format!("/author/posts/{id}/submit"), &author, json!({}))
        .await;
    assert_eq!(resp.status(), 409);

    app.post(&format!("/moderator/posts/{id}/approve"), &moderator, json!({}))
        .await;

    // Published posts are frozen
    let resp = app
        .client
        .put(app.url(&format!("/author/posts/{id}")))
        .bearer_auth(&author)
        .json(&json!({ "title": "Changed", "content": "<p>x</p>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn test_only_owner_edits_and_submits() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_user_with_role(&app, "owner", Role::Author).await;
    let (_, other) = common::create_user_with_role(&app, "other", Role::Author).await;

    let id = common::create_draft(&app, &owner, "Mine").await;

    let resp = app
        .post(&format!("/author/posts/{id}/submit"), &other, json!({}))
        .await;
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&format!("/author/posts/{id}")))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&format!("/author/posts/{id}")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_author_cannot_approve() {
    let app = common::spawn_app().await;
    let (_, author) = common::create_user_with_role(&app, "author", Role::Author).await;

    let id = common::create_draft(&app, &author, "Self Review").await;
    app.post(&format!("/author/posts/{id}/submit"), &author, json!({}))
        .await;

    // The gate turns the author away before the handler runs
    let resp = app
        .post(&format!("/moderator/posts/{id}/approve"), &author, json!({}))
        .await;
    assert_eq!(resp.status(), 307);
}

#[tokio::test]
async fn test_content_is_sanitized() {
    let app = common::spawn_app().await;
    let (_, author) = common::create_user_with_role(&app, "author", Role::Contributor).await;

    let resp = app
        .post(
            "/author/posts",
            &author,
            json!({
                "title": "Scripted",
                "content": "<p>Hello</p><script>alert(1)</script>"
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let content = body["data"]["content"].as_str().unwrap();
    assert!(content.contains("<p>Hello</p>"));
    assert!(!content.contains("<script>"));
}

#[tokio::test]
async fn test_create_cannot_start_approved() {
    let app = common::spawn_app().await;
    let (_, author) = common::create_user_with_role(&app, "author", Role::Author).await;

    let resp = app
        .post(
            "/author/posts",
            &author,
            json!({ "title": "Shortcut", "content": "<p>x</p>", "status": "approved" }),
        )
        .await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_category_listing_and_author_stats() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (_, author) = common::create_user_with_role(&app, "author", Role::Author).await;
    let category_id = common::create_category(&app, &admin).await;

    let resp = app
        .post(
            "/author/posts",
            &author,
            json!({
                "title": "Filed",
                "content": "<p>In a category.</p>",
                "category_id": category_id,
                "status": "pending"
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let id = body["data"]["id"].as_i64().unwrap();
    app.post(&format!("/moderator/posts/{id}/approve"), &admin, json!({}))
        .await;
    common::create_draft(&app, &author, "Unfiled").await;

    let categories: Value = app.get("/categories", None).await.json().await.unwrap();
    let slug = categories["data"][0]["slug"].as_str().unwrap().to_string();

    let detail: Value = app
        .get(&format!("/categories/{slug}"), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(detail["data"]["posts"].as_array().unwrap().len(), 1);

    let listing: Value = app
        .get(&format!("/posts?category={slug}"), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listing["data"]["total"], 1);

    let stats: Value = app.get("/author/stats", Some(&author)).await.json().await.unwrap();
    assert_eq!(stats["data"]["total_posts"], 2);
    assert_eq!(stats["data"]["approved_posts"], 1);
    assert_eq!(stats["data"]["draft_posts"], 1);
}

#[tokio::test]
async fn test_unknown_slug_is_not_found() {
    let app = common::spawn_app().await;
    let resp = app.get("/posts/no-such-post", None).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_search_and_related() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (_, author) = common::create_user_with_role(&app, "author", Role::Author).await;
    let category_id = common::create_category(&app, &admin).await;

    let mut slugs = Vec::new();
    for title in ["Rivers of Bengal", "Rivers in Spring", "Mountain Roads"] {
        let body: Value = app
            .post(
                "/author/posts",
                &author,
                json!({
                    "title": title,
                    "content": "<p>Travel writing.</p>",
                    "category_id": category_id,
                    "status": "pending"
                }),
            )
            .await
            .json()
            .await
            .unwrap();
        let id = body["data"]["id"].as_i64().unwrap();
        let approved: Value = app
            .post(&format!("/moderator/posts/{id}/approve"), &admin, json!({}))
            .await
            .json()
            .await
            .unwrap();
        slugs.push(approved["data"]["slug"].as_str().unwrap().to_string());
    }
    common::create_draft(&app, &author, "Rivers, unpublished").await;

    let found: Value = app.get("/posts/search?q=RIVERS", None).await.json().await.unwrap();
    assert_eq!(found["data"].as_array().unwrap().len(), 2);

    let related: Value = app
        .get(&format!("/posts/{}/related", slugs[0]), None)
        .await
        .json()
        .await
        .unwrap();
    let related_slugs: Vec<&str> = related["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert_eq!(related_slugs.len(), 2);
    assert!(!related_slugs.contains(&slugs[0].as_str()));
}
