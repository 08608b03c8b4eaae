use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{
        category, like, post, Category, CategoryModel, Like, Post, PostModel, PostStatus,
        User, UserModel,
    },
    services::workflow::{self, Transition},
    utils::{
        sanitize_html,
        text::{excerpt, reading_time, slugify, EXCERPT_LENGTH},
    },
};
use chrono::NaiveDateTime;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

pub const RELATED_LIMIT: u64 = 3;
pub const SEARCH_LIMIT: u64 = 20;

/// Fields an author supplies when writing a post.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category_id: Option<i32>,
    pub status: PostStatus,
}

/// A post paired with its author row.
pub type PostWithAuthor = (PostModel, Option<UserModel>);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorStats {
    pub total_posts: u64,
    pub approved_posts: u64,
    pub pending_posts: u64,
    pub draft_posts: u64,
    pub total_views: i64,
    pub total_likes: u64,
}

pub struct PostService {
    db: DatabaseConnection,
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<PostModel> {
        Post::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    // ---- write side -------------------------------------------------------

    pub async fn create(
        &self,
        actor: &AuthUser,
        draft: PostDraft,
        now: NaiveDateTime,
    ) -> AppResult<PostModel> {
        actor.require_writer()?;
        actor.ensure_not_suspended(now)?;
        let status = workflow::initial_status(draft.status)?;
        let (title, content) = validate_body(&draft.title, &draft.content)?;
        self.ensure_category(draft.category_id).await?;

        let content = sanitize_html(&content);
        let excerpt = pick_excerpt(draft.excerpt, &content);

        let post = post::ActiveModel {
            slug: Set(slugify(&title, now)),
            reading_time: Set(reading_time(&content)),
            title: Set(title),
            content: Set(content),
            excerpt: Set(excerpt),
            featured_image: Set(non_empty(draft.featured_image)),
            author_id: Set(actor.user_id),
            category_id: Set(draft.category_id),
            status: Set(status),
            view_count: Set(0),
            rejection_reason: Set(None),
            approved_by: Set(None),
            approved_at: Set(None),
            published_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(post_id = post.id, author_id = actor.user_id, status = workflow::status_label(status), "post created");
        Ok(post)
    }

    pub async fn submit(&self, actor: &AuthUser, id: i32, now: NaiveDateTime) -> AppResult<PostModel> {
        actor.ensure_not_suspended(now)?;
        self.transition(actor, id, Transition::Submit, now, |_| {})
            .await
    }

    pub async fn approve(&self, actor: &AuthUser, id: i32, now: NaiveDateTime) -> AppResult<PostModel> {
        let reviewer = actor.user_id;
        self.transition(actor, id, Transition::Approve, now, |active| {
            active.approved_by = Set(Some(reviewer));
            active.approved_at = Set(Some(now));
            active.published_at = Set(Some(now));
            active.rejection_reason = Set(None);
        })
        .await
    }

    pub async fn reject(
        &self,
        actor: &AuthUser,
        id: i32,
        reason: &str,
        now: NaiveDateTime,
    ) -> AppResult<PostModel> {
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err(AppError::validation("A rejection reason is required"));
        }
        self.transition(actor, id, Transition::Reject, now, |active| {
            active.rejection_reason = Set(Some(reason));
        })
        .await
    }

    /// Rewrite a draft or rejected post. The slug never changes.
    pub async fn edit(
        &self,
        actor: &AuthUser,
        id: i32,
        draft: PostDraft,
        now: NaiveDateTime,
    ) -> AppResult<PostModel> {
        actor.ensure_not_suspended(now)?;
        let (title, content) = validate_body(&draft.title, &draft.content)?;
        self.ensure_category(draft.category_id).await?;

        let content = sanitize_html(&content);
        let excerpt = pick_excerpt(draft.excerpt, &content);
        let featured_image = non_empty(draft.featured_image);
        let category_id = draft.category_id;

        self.transition(
            actor,
            id,
            Transition::Edit {
                target: draft.status,
            },
            now,
            |active| {
                active.reading_time = Set(reading_time(&content));
                active.title = Set(title);
                active.content = Set(content);
                active.excerpt = Set(excerpt);
                active.featured_image = Set(featured_image);
                active.category_id = Set(category_id);
                active.rejection_reason = Set(None);
            },
        )
        .await
    }

    pub async fn delete(&self, actor: &AuthUser, id: i32) -> AppResult<()> {
        let post = self.get_by_id(id).await?;
        if !workflow::can_delete(actor.role, post.author_id == actor.user_id) {
            return Err(AppError::Forbidden);
        }
        Post::delete_by_id(id).exec(&self.db).await?;
        tracing::info!(post_id = id, by = actor.user_id, "post deleted");
        Ok(())
    }

    /// Run one workflow transition as a single conditional row update: the
    /// write only lands if the row still has the status it was checked against.
    async fn transition<F>(
        &self,
        actor: &AuthUser,
        id: i32,
        transition: Transition,
        now: NaiveDateTime,
        stamp: F,
    ) -> AppResult<PostModel>
    where
        F: FnOnce(&mut post::ActiveModel),
    {
        let current = self.get_by_id(id).await?;
        workflow::authorize(transition, actor.role, current.author_id == actor.user_id)?;
        let next = workflow::next_status(current.status, transition)?;

        let mut changes = post::ActiveModel {
            id: NotSet,
            status: Set(next),
            updated_at: Set(now),
            ..Default::default()
        };
        stamp(&mut changes);

        let result = Post::update_many()
            .set(changes)
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.eq(current.status))
            .exec(&self.db)
            .await?;

        if result.rows_affected != 1 {
            return Err(AppError::InvalidTransition(
                "post changed status concurrently".to_string(),
            ));
        }

        tracing::info!(
            post_id = id,
            actor_id = actor.user_id,
            from = workflow::status_label(current.status),
            to = workflow::status_label(next),
            "post transition"
        );
        self.get_by_id(id).await
    }

    async fn ensure_category(&self, category_id: Option<i32>) -> AppResult<()> {
        if let Some(category_id) = category_id {
            Category::find_by_id(category_id)
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::validation("Category does not exist"))?;
        }
        Ok(())
    }

    // ---- read side --------------------------------------------------------

    /// Approved posts, newest publication first. An unknown category slug
    /// yields an empty page.
    pub async fn list_published(
        &self,
        category_slug: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<PostWithAuthor>, u64)> {
        let mut query = Post::find().filter(post::Column::Status.eq(PostStatus::Approved));

        if let Some(slug) = category_slug {
            let Some(category) = Category::find()
                .filter(category::Column::Slug.eq(slug))
                .one(&self.db)
                .await?
            else {
                return Ok((Vec::new(), 0));
            };
            query = query.filter(post::Column::CategoryId.eq(category.id));
        }

        let paginator = query
            .order_by_desc(post::Column::PublishedAt)
            .order_by_desc(post::Column::Id)
            .find_also_related(User)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let posts = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((posts, total))
    }

    /// Public detail page. Counts a view.
    pub async fn view_published(
        &self,
        slug: &str,
    ) -> AppResult<(PostModel, Option<UserModel>, Option<CategoryModel>)> {
        let post = Post::find()
            .filter(post::Column::Slug.eq(slug))
            .filter(post::Column::Status.eq(PostStatus::Approved))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        Post::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(post.id))
            .exec(&self.db)
            .await?;

        let author = User::find_by_id(post.author_id).one(&self.db).await?;
        let category = match post.category_id {
            Some(id) => Category::find_by_id(id).one(&self.db).await?,
            None => None,
        };

        let post = PostModel {
            view_count: post.view_count + 1,
            ..post
        };
        Ok((post, author, category))
    }

    /// Other approved posts in the same category.
    pub async fn related(&self, slug: &str) -> AppResult<Vec<PostWithAuthor>> {
        let post = Post::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let Some(category_id) = post.category_id else {
            return Ok(Vec::new());
        };

        let related = Post::find()
            .filter(post::Column::Status.eq(PostStatus::Approved))
            .filter(post::Column::CategoryId.eq(category_id))
            .filter(post::Column::Id.ne(post.id))
            .order_by_desc(post::Column::PublishedAt)
            .limit(RELATED_LIMIT)
            .find_also_related(User)
            .all(&self.db)
            .await?;
        Ok(related)
    }

    /// Case-insensitive substring match on title or body.
    pub async fn search(&self, query: &str) -> AppResult<Vec<PostWithAuthor>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{needle}%");

        let posts = Post::find()
            .filter(post::Column::Status.eq(PostStatus::Approved))
            .filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(post::Column::Title))).like(&pattern))
                    .add(Expr::expr(Func::lower(Expr::col(post::Column::Content))).like(&pattern)),
            )
            .order_by_desc(post::Column::PublishedAt)
            .limit(SEARCH_LIMIT)
            .find_also_related(User)
            .all(&self.db)
            .await?;
        Ok(posts)
    }

    /// Every post the author owns, any status, newest first.
    pub async fn author_posts(&self, actor: &AuthUser) -> AppResult<Vec<PostModel>> {
        actor.require_writer()?;
        let posts = Post::find()
            .filter(post::Column::AuthorId.eq(actor.user_id))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(&self.db)
            .await?;
        Ok(posts)
    }

    pub async fn author_post(&self, actor: &AuthUser, id: i32) -> AppResult<PostModel> {
        actor.require_writer()?;
        let post = self.get_by_id(id).await?;
        if post.author_id != actor.user_id {
            return Err(AppError::NotFound);
        }
        Ok(post)
    }

    pub async fn author_stats(&self, actor: &AuthUser) -> AppResult<AuthorStats> {
        let posts = self.author_posts(actor).await?;
        let count = |status: PostStatus| posts.iter().filter(|p| p.status == status).count() as u64;

        let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
        let total_likes = if post_ids.is_empty() {
            0
        } else {
            Like::find()
                .filter(like::Column::PostId.is_in(post_ids))
                .count(&self.db)
                .await?
        };

        Ok(AuthorStats {
            total_posts: posts.len() as u64,
            approved_posts: count(PostStatus::Approved),
            pending_posts: count(PostStatus::Pending),
            draft_posts: count(PostStatus::Draft),
            total_views: posts.iter().map(|p| p.view_count as i64).sum(),
            total_likes,
        })
    }

    /// Posts waiting for review, newest submission first.
    pub async fn review_queue(&self, actor: &AuthUser) -> AppResult<Vec<PostWithAuthor>> {
        actor.require_staff()?;
        let posts = Post::find()
            .filter(post::Column::Status.eq(PostStatus::Pending))
            .order_by_desc(post::Column::UpdatedAt)
            .order_by_desc(post::Column::Id)
            .find_also_related(User)
            .all(&self.db)
            .await?;
        Ok(posts)
    }
}

fn validate_body(title: &str, content: &str) -> AppResult<(String, String)> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    if content.trim().is_empty() {
        return Err(AppError::validation("Content is required"));
    }
    Ok((title.to_string(), content.to_string()))
}

fn pick_excerpt(supplied: Option<String>, content: &str) -> Option<String> {
    non_empty(supplied).or_else(|| {
        let generated = excerpt(content, EXCERPT_LENGTH);
        (!generated.is_empty()).then_some(generated)
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_requires_title_and_content() {
        assert!(matches!(
            validate_body("   ", "text"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_body("Title", " \n"),
            Err(AppError::Validation(_))
        ));
        assert_eq!(
            validate_body("  Title ", "body").unwrap(),
            ("Title".to_string(), "body".to_string())
        );
    }

    #[test]
    fn excerpt_falls_back_to_content() {
        assert_eq!(
            pick_excerpt(None, "<p>Short body</p>").as_deref(),
            Some("Short body")
        );
        assert_eq!(
            pick_excerpt(Some("  mine ".into()), "<p>Short body</p>").as_deref(),
            Some("mine")
        );
        assert_eq!(pick_excerpt(Some("   ".into()), "<p></p>"), None);
    }
}
