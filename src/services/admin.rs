use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{
        post, report, user, Comment, ContentType, ForumThread, Post, PostStatus, Report,
        ReportStatus, Role, User, UserModel,
    },
};
use chrono::{Duration, NaiveDateTime};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminStats {
    pub total_users: u64,
    pub approved_posts: u64,
    pub pending_posts: u64,
    pub total_threads: u64,
    pub total_comments: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeratorStats {
    pub pending_posts: u64,
    pub pending_comment_reports: u64,
    pub pending_thread_reports: u64,
    pub pending_reports: u64,
}

pub struct AdminService {
    db: DatabaseConnection,
}

impl AdminService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_stats(&self, actor: &AuthUser) -> AppResult<AdminStats> {
        actor.require_admin()?;
        Ok(AdminStats {
            total_users: User::find().count(&self.db).await?,
            approved_posts: self.posts_with_status(PostStatus::Approved).await?,
            pending_posts: self.posts_with_status(PostStatus::Pending).await?,
            total_threads: ForumThread::find().count(&self.db).await?,
            total_comments: Comment::find().count(&self.db).await?,
        })
    }

    pub async fn moderator_stats(&self, actor: &AuthUser) -> AppResult<ModeratorStats> {
        actor.require_staff()?;
        Ok(ModeratorStats {
            pending_posts: self.posts_with_status(PostStatus::Pending).await?,
            pending_comment_reports: self.pending_reports(Some(ContentType::Comment)).await?,
            pending_thread_reports: self.pending_reports(Some(ContentType::Thread)).await?,
            pending_reports: self.pending_reports(None).await?,
        })
    }

    async fn posts_with_status(&self, status: PostStatus) -> AppResult<u64> {
        Ok(Post::find()
            .filter(post::Column::Status.eq(status))
            .count(&self.db)
            .await?)
    }

    async fn pending_reports(&self, content_type: Option<ContentType>) -> AppResult<u64> {
        let mut query = Report::find().filter(report::Column::Status.eq(ReportStatus::Pending));
        if let Some(content_type) = content_type {
            query = query.filter(report::Column::ContentType.eq(content_type));
        }
        Ok(query.count(&self.db).await?)
    }

    pub async fn list_users(
        &self,
        actor: &AuthUser,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<UserModel>, u64)> {
        actor.require_admin()?;
        let paginator = User::find()
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((users, total))
    }

    pub async fn update_user_role(
        &self,
        actor: &AuthUser,
        user_id: i32,
        role: Role,
        now: NaiveDateTime,
    ) -> AppResult<UserModel> {
        actor.require_admin()?;
        if user_id == actor.user_id && role != Role::Admin {
            return Err(AppError::validation("Admins cannot demote themselves"));
        }

        let existing = self.get_user(user_id).await?;
        let previous = existing.role;

        let mut active: user::ActiveModel = existing.into();
        active.role = Set(role);
        active.updated_at = Set(now);
        let updated = active.update(&self.db).await?;

        tracing::info!(user_id, from = ?previous, to = ?role, by = actor.user_id, "role changed");
        Ok(updated)
    }

    /// Suspend for `days` days counted from `now`.
    pub async fn suspend_user(
        &self,
        actor: &AuthUser,
        user_id: i32,
        days: i64,
        now: NaiveDateTime,
    ) -> AppResult<UserModel> {
        actor.require_admin()?;
        if days < 1 {
            return Err(AppError::validation("Suspension must last at least one day"));
        }
        if user_id == actor.user_id {
            return Err(AppError::validation("Admins cannot suspend themselves"));
        }

        let until = now + Duration::days(days);
        let mut active: user::ActiveModel = self.get_user(user_id).await?.into();
        active.is_suspended = Set(true);
        active.suspended_until = Set(Some(until));
        active.updated_at = Set(now);
        let updated = active.update(&self.db).await?;

        tracing::info!(user_id, days, %until, by = actor.user_id, "user suspended");
        Ok(updated)
    }

    pub async fn unsuspend_user(
        &self,
        actor: &AuthUser,
        user_id: i32,
        now: NaiveDateTime,
    ) -> AppResult<UserModel> {
        actor.require_admin()?;
        let mut active: user::ActiveModel = self.get_user(user_id).await?.into();
        active.is_suspended = Set(false);
        active.suspended_until = Set(None);
        active.updated_at = Set(now);
        let updated = active.update(&self.db).await?;

        tracing::info!(user_id, by = actor.user_id, "user unsuspended");
        Ok(updated)
    }

    async fn get_user(&self, user_id: i32) -> AppResult<UserModel> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}
