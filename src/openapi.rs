use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(title = "Lekhok API", description = "Community articles and discussion forum"),
    paths(
        crate::handlers::health::health_check,
        // Auth
        crate::handlers::auth::signup,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::auth::verify_email,
        crate::handlers::auth::resend_verification,
        crate::handlers::auth::refresh_token,
        crate::handlers::auth::logout,
        // Profile
        crate::handlers::user::get_profile,
        crate::handlers::user::update_profile,
        // Posts
        crate::handlers::post::list_posts,
        crate::handlers::post::search_posts,
        crate::handlers::post::get_post,
        crate::handlers::post::related_posts,
        crate::handlers::post::author_posts,
        crate::handlers::post::author_post,
        crate::handlers::post::author_stats,
        crate::handlers::post::create_post,
        crate::handlers::post::update_post,
        crate::handlers::post::submit_post,
        crate::handlers::post::delete_post,
        crate::handlers::post::review_queue,
        crate::handlers::post::approve_post,
        crate::handlers::post::reject_post,
        crate::handlers::post::moderator_delete_post,
        // Comments, likes, bookmarks
        crate::handlers::comment::list_comments,
        crate::handlers::comment::create_comment,
        crate::handlers::comment::delete_comment,
        crate::handlers::comment::moderate_comment,
        crate::handlers::like::like_status,
        crate::handlers::like::toggle_like,
        crate::handlers::bookmark::bookmark_status,
        crate::handlers::bookmark::toggle_bookmark,
        crate::handlers::bookmark::list_bookmarks,
        // Categories
        crate::handlers::category::list_categories,
        crate::handlers::category::get_category,
        crate::handlers::category::request_category,
        crate::handlers::category::create_category,
        crate::handlers::category::delete_category,
        crate::handlers::category::list_category_requests,
        crate::handlers::category::approve_category_request,
        crate::handlers::category::reject_category_request,
        // Forum
        crate::handlers::forum::list_forum_categories,
        crate::handlers::forum::create_forum_category,
        crate::handlers::forum::list_threads,
        crate::handlers::forum::get_thread,
        crate::handlers::forum::create_thread,
        crate::handlers::forum::create_reply,
        crate::handlers::forum::vote_reply,
        crate::handlers::forum::my_vote,
        crate::handlers::forum::accept_answer,
        crate::handlers::forum::lock_thread,
        crate::handlers::forum::unlock_thread,
        crate::handlers::forum::pin_thread,
        crate::handlers::forum::unpin_thread,
        crate::handlers::forum::delete_reply,
        // Reports
        crate::handlers::report::create_report,
        crate::handlers::report::pending_reports,
        crate::handlers::report::update_report,
        crate::handlers::report::resolve_report,
        crate::handlers::report::list_reports,
        // Uploads
        crate::handlers::upload::upload_image,
        // Admin
        crate::handlers::admin::get_stats,
        crate::handlers::admin::moderator_stats,
        crate::handlers::admin::list_users,
        crate::handlers::admin::update_user_role,
        crate::handlers::admin::suspend_user,
        crate::handlers::admin::unsuspend_user,
    ),
    components(
        schemas(
            crate::response::PaginationQuery,
            crate::error::AppError,
            crate::models::Role,
            crate::models::PostStatus,
            crate::models::ContentType,
            crate::models::ReportStatus,
            crate::models::category_request::RequestStatus,
            crate::models::CategoryModel,
            crate::models::CategoryRequestModel,
            crate::models::ForumCategoryModel,
            crate::models::ForumThreadModel,
            crate::models::ReportModel,
            // Auth
            crate::handlers::auth::SignupRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::SignupResponse,
            crate::handlers::auth::UserResponse,
            crate::handlers::auth::UserSummary,
            crate::handlers::auth::VerifyEmailRequest,
            crate::handlers::auth::ResendVerificationRequest,
            crate::handlers::auth::RefreshTokenRequest,
            crate::handlers::auth::TokenResponse,
            // Profile
            crate::handlers::user::ProfileResponse,
            crate::handlers::user::UpdateProfileRequest,
            // Posts
            crate::handlers::post::PostRequest,
            crate::handlers::post::RejectRequest,
            crate::handlers::post::PostResponse,
            crate::handlers::post::PostDetailResponse,
            crate::handlers::post::AuthorStatsResponse,
            crate::handlers::comment::CreateCommentRequest,
            crate::handlers::comment::CommentResponse,
            crate::handlers::like::LikeResponse,
            crate::handlers::bookmark::BookmarkToggleResponse,
            // Categories
            crate::handlers::category::CategoryDetailResponse,
            crate::handlers::category::CreateCategoryRequest,
            crate::handlers::category::CategoryRequestPayload,
            // Forum
            crate::handlers::forum::CreateForumCategoryRequest,
            crate::handlers::forum::CreateThreadRequest,
            crate::handlers::forum::CreateReplyRequest,
            crate::handlers::forum::VoteRequest,
            crate::handlers::forum::ThreadResponse,
            crate::handlers::forum::ReplyResponse,
            crate::handlers::forum::ThreadDetailResponse,
            crate::handlers::forum::VoteResponse,
            crate::handlers::forum::MyVoteResponse,
            // Reports, uploads, admin
            crate::handlers::report::CreateReportRequest,
            crate::handlers::report::UpdateReportRequest,
            crate::handlers::report::ResolveReportRequest,
            crate::handlers::upload::UploadResponse,
            crate::handlers::admin::AdminStatsResponse,
            crate::handlers::admin::ModeratorStatsResponse,
            crate::handlers::admin::UpdateRoleRequest,
            crate::handlers::admin::SuspendRequest,
        )
    ),
    modifiers(&JwtSecurity),
    tags(
        (name = "health", description = "Service status"),
        (name = "auth", description = "Signup, login and sessions"),
        (name = "profile", description = "The signed-in user's profile"),
        (name = "posts", description = "Published articles"),
        (name = "author", description = "Writing and submitting articles"),
        (name = "comments", description = "Article comments"),
        (name = "likes", description = "Article likes"),
        (name = "bookmarks", description = "Saved articles"),
        (name = "categories", description = "Article categories and category requests"),
        (name = "forum", description = "Discussion threads, replies and votes"),
        (name = "reports", description = "Content reports"),
        (name = "moderation", description = "Moderator tools"),
        (name = "uploads", description = "Image uploads"),
        (name = "admin", description = "Administrative operations"),
    )
)]
pub struct ApiDoc;

struct JwtSecurity;

impl Modify for JwtSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_role_areas() {
        let doc = ApiDoc::openapi();
        for path in [
            "/author/posts",
            "/moderator/posts/{id}/approve",
            "/admin/users/{id}/suspend",
            "/forum/replies/{id}/vote",
            "/api/upload",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("jwt_token"));
    }
}
