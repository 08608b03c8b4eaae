use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{comment, Comment, CommentModel, Post, PostStatus, User, UserModel},
};
use chrono::NaiveDateTime;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder,
};

pub type CommentWithAuthor = (CommentModel, Option<UserModel>);

pub struct CommentService {
    db: DatabaseConnection,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Live comments on a post, oldest first.
    pub async fn list_by_post(&self, post_id: i32) -> AppResult<Vec<CommentWithAuthor>> {
        let comments = Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::IsDeleted.eq(false))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .find_also_related(User)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    pub async fn create(
        &self,
        actor: &AuthUser,
        post_id: i32,
        parent_id: Option<i32>,
        content: &str,
        now: NaiveDateTime,
    ) -> AppResult<CommentModel> {
        actor.ensure_not_suspended(now)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Comment content is required"));
        }

        let post = Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        if post.status != PostStatus::Approved {
            return Err(AppError::validation("Comments are only open on published posts"));
        }

        if let Some(pid) = parent_id {
            self.validate_parent(pid, post_id).await?;
        }

        let comment = comment::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(actor.user_id),
            parent_id: Set(parent_id),
            content: Set(content.to_string()),
            is_deleted: Set(false),
            deleted_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(comment)
    }

    /// The author removes their own comment outright.
    pub async fn delete_own(&self, actor: &AuthUser, id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != actor.user_id {
            return Err(AppError::Forbidden);
        }
        Comment::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    /// Staff hide a comment, keeping the row for the record.
    pub async fn moderate_delete(
        &self,
        actor: &AuthUser,
        id: i32,
        now: NaiveDateTime,
    ) -> AppResult<()> {
        actor.require_staff()?;
        let result = Comment::update_many()
            .col_expr(comment::Column::IsDeleted, Expr::value(true))
            .col_expr(comment::Column::DeletedBy, Expr::value(actor.user_id))
            .col_expr(comment::Column::UpdatedAt, Expr::value(now))
            .filter(comment::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!(comment_id = id, by = actor.user_id, "comment removed by moderator");
        Ok(())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CommentModel> {
        Comment::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn validate_parent(&self, parent_id: i32, post_id: i32) -> AppResult<()> {
        let parent = Comment::find_by_id(parent_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::validation("Parent comment not found"))?;

        if parent.post_id != post_id {
            return Err(AppError::validation(
                "Parent comment belongs to a different post",
            ));
        }
        Ok(())
    }
}
