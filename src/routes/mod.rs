use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::services::upload::MAX_FILE_SIZE;
use axum::{extract::DefaultBodyLimit, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

/// Multipart framing on top of the largest accepted image.
const UPLOAD_BODY_LIMIT: usize = MAX_FILE_SIZE + 1024 * 1024;

pub fn create_routes(rate_limit: &RateLimitConfig) -> Router {
    auth_routes(rate_limit)
        .merge(browse_routes(rate_limit))
        .merge(member_routes(rate_limit))
}

/// Session endpoints: signup, login, refresh, email verification.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/signup", routing::post(handlers::auth::signup))
        .route("/auth/login", routing::post(handlers::auth::login))
        .route("/auth/refresh", routing::post(handlers::auth::refresh_token))
        .route(
            "/auth/verify-email",
            routing::post(handlers::auth::verify_email),
        )
        .route(
            "/auth/resend-verification",
            routing::post(handlers::auth::resend_verification),
        );

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Anonymous reads.
fn browse_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/", routing::get(handlers::health::health_check))
        // Articles
        .route("/posts", routing::get(handlers::post::list_posts))
        .route("/posts/search", routing::get(handlers::post::search_posts))
        .route("/posts/{post}", routing::get(handlers::post::get_post))
        .route(
            "/posts/{post}/related",
            routing::get(handlers::post::related_posts),
        )
        .route(
            "/posts/{post}/comments",
            routing::get(handlers::comment::list_comments),
        )
        .route(
            "/posts/{post}/likes",
            routing::get(handlers::like::like_status),
        )
        // Categories
        .route(
            "/categories",
            routing::get(handlers::category::list_categories),
        )
        .route(
            "/categories/{slug}",
            routing::get(handlers::category::get_category),
        )
        // Forum
        .route(
            "/forum/categories",
            routing::get(handlers::forum::list_forum_categories),
        )
        .route("/forum/threads", routing::get(handlers::forum::list_threads))
        .route(
            "/forum/threads/{thread}",
            routing::get(handlers::forum::get_thread),
        );

    with_optional_rate_limit(router, config.enabled, config.browse)
}

/// Everything that needs a session. Role areas are enforced by the gate
/// and again by the services.
fn member_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::auth::me))
        .route("/auth/logout", routing::post(handlers::auth::logout))
        // Profile
        .route(
            "/profile",
            routing::get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        .route(
            "/profile/bookmarks",
            routing::get(handlers::bookmark::list_bookmarks),
        )
        // Comments, likes, bookmarks
        .route(
            "/posts/{post}/comments",
            routing::post(handlers::comment::create_comment),
        )
        .route(
            "/comments/{id}",
            routing::delete(handlers::comment::delete_comment),
        )
        .route(
            "/posts/{post}/like",
            routing::post(handlers::like::toggle_like),
        )
        .route(
            "/posts/{post}/bookmark",
            routing::get(handlers::bookmark::bookmark_status)
                .post(handlers::bookmark::toggle_bookmark),
        )
        // Forum
        .route(
            "/forum/threads",
            routing::post(handlers::forum::create_thread),
        )
        .route(
            "/forum/threads/{thread}/replies",
            routing::post(handlers::forum::create_reply),
        )
        .route(
            "/forum/replies/{id}/vote",
            routing::get(handlers::forum::my_vote).post(handlers::forum::vote_reply),
        )
        .route(
            "/forum/replies/{id}/accept",
            routing::post(handlers::forum::accept_answer),
        )
        // Reports and uploads
        .route("/reports", routing::post(handlers::report::create_report))
        .route(
            "/api/upload",
            routing::post(handlers::upload::upload_image)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .merge(author_routes())
        .merge(moderator_routes())
        .merge(admin_routes());

    with_optional_rate_limit(router, config.enabled, config.member)
}

fn author_routes() -> Router {
    Router::new()
        .route(
            "/author/posts",
            routing::get(handlers::post::author_posts).post(handlers::post::create_post),
        )
        .route(
            "/author/posts/{id}",
            routing::get(handlers::post::author_post)
                .put(handlers::post::update_post)
                .delete(handlers::post::delete_post),
        )
        .route(
            "/author/posts/{id}/submit",
            routing::post(handlers::post::submit_post),
        )
        .route("/author/stats", routing::get(handlers::post::author_stats))
        .route(
            "/author/category-requests",
            routing::post(handlers::category::request_category),
        )
}

fn moderator_routes() -> Router {
    Router::new()
        .route(
            "/moderator/stats",
            routing::get(handlers::admin::moderator_stats),
        )
        .route(
            "/moderator/posts",
            routing::get(handlers::post::review_queue),
        )
        .route(
            "/moderator/posts/{id}",
            routing::delete(handlers::post::moderator_delete_post),
        )
        .route(
            "/moderator/posts/{id}/approve",
            routing::post(handlers::post::approve_post),
        )
        .route(
            "/moderator/posts/{id}/reject",
            routing::post(handlers::post::reject_post),
        )
        .route(
            "/moderator/comments/{id}",
            routing::delete(handlers::comment::moderate_comment),
        )
        .route(
            "/moderator/reports",
            routing::get(handlers::report::pending_reports),
        )
        .route(
            "/moderator/reports/{id}",
            routing::put(handlers::report::update_report),
        )
        .route(
            "/moderator/reports/{id}/resolve",
            routing::post(handlers::report::resolve_report),
        )
        .route(
            "/moderator/threads/{id}/lock",
            routing::post(handlers::forum::lock_thread),
        )
        .route(
            "/moderator/threads/{id}/unlock",
            routing::post(handlers::forum::unlock_thread),
        )
        .route(
            "/moderator/threads/{id}/pin",
            routing::post(handlers::forum::pin_thread),
        )
        .route(
            "/moderator/threads/{id}/unpin",
            routing::post(handlers::forum::unpin_thread),
        )
        .route(
            "/moderator/replies/{id}",
            routing::delete(handlers::forum::delete_reply),
        )
}

fn admin_routes() -> Router {
    Router::new()
        .route("/admin/stats", routing::get(handlers::admin::get_stats))
        .route("/admin/users", routing::get(handlers::admin::list_users))
        .route(
            "/admin/users/{id}/role",
            routing::put(handlers::admin::update_user_role),
        )
        .route(
            "/admin/users/{id}/suspend",
            routing::post(handlers::admin::suspend_user),
        )
        .route(
            "/admin/users/{id}/unsuspend",
            routing::post(handlers::admin::unsuspend_user),
        )
        .route(
            "/admin/categories",
            routing::post(handlers::category::create_category),
        )
        .route(
            "/admin/categories/{id}",
            routing::delete(handlers::category::delete_category),
        )
        .route(
            "/admin/category-requests",
            routing::get(handlers::category::list_category_requests),
        )
        .route(
            "/admin/category-requests/{id}/approve",
            routing::post(handlers::category::approve_category_request),
        )
        .route(
            "/admin/category-requests/{id}/reject",
            routing::post(handlers::category::reject_category_request),
        )
        .route(
            "/admin/forum/categories",
            routing::post(handlers::forum::create_forum_category),
        )
        .route("/admin/reports", routing::get(handlers::report::list_reports))
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    match GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    {
        Some(governor_conf) => router.layer(GovernorLayer::new(governor_conf)),
        None => {
            tracing::warn!(?rule, "invalid rate limit rule, route group left unlimited");
            router
        }
    }
}
