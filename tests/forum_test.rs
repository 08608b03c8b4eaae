mod common;

use lekhok::models::Role;
use serde_json::{json, Value};

struct Thread {
    id: i64,
    slug: String,
}

async fn create_thread(app: &common::TestApp, token: &str, category_id: i32, title: &str) -> Thread {
    let resp = app
        .post(
            "/forum/threads",
            token,
            json!({
                "title": title,
                "content": "How do I **start**?",
                "category_id": category_id
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    Thread {
        id: body["data"]["id"].as_i64().unwrap(),
        slug: body["data"]["slug"].as_str().unwrap().to_string(),
    }
}

async fn create_reply(app: &common::TestApp, token: &str, thread_id: i64, content: &str) -> i64 {
    let resp = app
        .post(
            &format!("/forum/threads/{thread_id}/replies"),
            token,
            json!({ "content": content }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

async fn vote(app: &common::TestApp, token: &str, reply_id: i64, vote_type: i16) -> Value {
    let resp = app
        .post(
            &format!("/forum/replies/{reply_id}/vote"),
            token,
            json!({ "vote_type": vote_type }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"].clone()
}

#[tokio::test]
async fn test_thread_and_replies_render_markdown() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (_, asker) = common::create_user(&app, "asker").await;
    let (_, helper) = common::create_user(&app, "helper").await;
    let category = common::create_forum_category(&app, &admin).await;

    let thread = create_thread(&app, &asker, category, "Getting Started").await;
    assert!(thread.slug.starts_with("getting-started"), "{}", thread.slug);
    create_reply(&app, &helper, thread.id, "Read the <script>x</script>*guide*").await;

    let resp = app.get(&format!("/forum/threads/{}", thread.slug), None).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["content_html"]
        .as_str()
        .unwrap()
        .contains("<strong>start</strong>"));
    let reply_html = body["data"]["replies"][0]["content_html"].as_str().unwrap();
    assert!(reply_html.contains("<em>guide</em>"));
    assert!(!reply_html.contains("<script>"));
    assert_eq!(body["data"]["view_count"], 1);

    let listing: Value = app.get("/forum/threads", None).await.json().await.unwrap();
    assert_eq!(listing["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_vote_toggle_and_flip() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (_, asker) = common::create_user(&app, "asker").await;
    let (_, voter) = common::create_user(&app, "voter").await;
    let category = common::create_forum_category(&app, &admin).await;
    let thread = create_thread(&app, &asker, category, "Votes").await;
    let reply = create_reply(&app, &asker, thread.id, "An answer").await;

    let first = vote(&app, &voter, reply, 1).await;
    assert_eq!(first["vote"], 1);
    assert_eq!(first["upvotes"], 1);
    assert_eq!(first["score"], 1);

    // Same vote again removes it
    let toggled = vote(&app, &voter, reply, 1).await;
    assert!(toggled["vote"].is_null());
    assert_eq!(toggled["upvotes"], 0);
    assert_eq!(toggled["score"], 0);

    vote(&app, &voter, reply, 1).await;
    let flipped = vote(&app, &voter, reply, -1).await;
    assert_eq!(flipped["vote"], -1);
    assert_eq!(flipped["upvotes"], 0);
    assert_eq!(flipped["downvotes"], 1);
    assert_eq!(flipped["score"], -1);

    let mine: Value = app
        .get(&format!("/forum/replies/{reply}/vote"), Some(&voter))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(mine["data"]["vote"], -1);

    let resp = app
        .post(
            &format!("/forum/replies/{reply}/vote"),
            &voter,
            json!({ "vote_type": 0 }),
        )
        .await;
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_accept_answer_is_exclusive() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (_, asker) = common::create_user(&app, "asker").await;
    let (_, helper) = common::create_user(&app, "helper").await;
    let category = common::create_forum_category(&app, &admin).await;
    let thread = create_thread(&app, &asker, category, "Which one").await;
    let first = create_reply(&app, &helper, thread.id, "Option A").await;
    let second = create_reply(&app, &helper, thread.id, "Option B").await;

    // Only the thread author accepts
    let resp = app
        .post(&format!("/forum/replies/{first}/accept"), &helper, json!({}))
        .await;
    assert_eq!(resp.status(), 403);

    for reply in [first, second] {
        let resp = app
            .post(&format!("/forum/replies/{reply}/accept"), &asker, json!({}))
            .await;
        assert_eq!(resp.status(), 200);
    }

    let body: Value = app
        .get(&format!("/forum/threads/{}", thread.slug), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["has_accepted_answer"], true);
    let replies = body["data"]["replies"].as_array().unwrap();
    let accepted: Vec<i64> = replies
        .iter()
        .filter(|r| r["is_accepted"] == true)
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(accepted, vec![second]);
    // The accepted answer leads the list
    assert_eq!(replies[0]["id"], second);
}

#[tokio::test]
async fn test_locked_thread_rejects_replies() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (_, moderator) = common::create_user_with_role(&app, "mod", Role::Moderator).await;
    let (_, member) = common::create_user(&app, "member").await;
    let category = common::create_forum_category(&app, &admin).await;
    let thread = create_thread(&app, &member, category, "Heated").await;

    let resp = app
        .post(&format!("/moderator/threads/{}/lock", thread.id), &moderator, json!({}))
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["is_locked"], true);

    let resp = app
        .post(
            &format!("/forum/threads/{}/replies", thread.id),
            &member,
            json!({ "content": "one more thing" }),
        )
        .await;
    assert_eq!(resp.status(), 403);

    app.post(&format!("/moderator/threads/{}/unlock", thread.id), &moderator, json!({}))
        .await;
    create_reply(&app, &member, thread.id, "calmer now").await;
}

#[tokio::test]
async fn test_pinned_threads_listed_first() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (_, member) = common::create_user(&app, "member").await;
    let category = common::create_forum_category(&app, &admin).await;

    let older = create_thread(&app, &member, category, "Rules").await;
    create_thread(&app, &member, category, "Newer chatter").await;

    let resp = app
        .post(&format!("/moderator/threads/{}/pin", older.id), &admin, json!({}))
        .await;
    assert_eq!(resp.status(), 200);

    let listing: Value = app.get("/forum/threads", None).await.json().await.unwrap();
    assert_eq!(listing["data"][0]["id"], older.id);
    assert_eq!(listing["data"][0]["is_pinned"], true);
}

#[tokio::test]
async fn test_deleted_reply_hidden_and_clears_accepted_flag() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_user_with_role(&app, "admin", Role::Admin).await;
    let (_, asker) = common::create_user(&app, "asker").await;
    let category = common::create_forum_category(&app, &admin).await;
    let thread = create_thread(&app, &asker, category, "Cleanup").await;
    let reply = create_reply(&app, &asker, thread.id, "spam").await;
    app.post(&format!("/forum/replies/{reply}/accept"), &asker, json!({}))
        .await;

    let resp = app
        .client
        .delete(app.url(&format!("/moderator/replies/{reply}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = app
        .get(&format!("/forum/threads/{}", thread.slug), None)
        .await
        .json()
        .await
        .unwrap();
    assert!(body["data"]["replies"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["has_accepted_answer"], false);
}

#[tokio::test]
async fn test_thread_requires_existing_category() {
    let app = common::spawn_app().await;
    let (_, member) = common::create_user(&app, "member").await;

    let resp = app
        .post(
            "/forum/threads",
            &member,
            json!({ "title": "Lost", "content": "where am I", "category_id": 999 }),
        )
        .await;
    assert!(resp.status().is_client_error());
}
