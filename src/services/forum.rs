use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{
        forum_category, forum_reply, forum_reply_vote, forum_thread, ForumCategory,
        ForumCategoryModel, ForumReply, ForumReplyModel, ForumReplyVote, ForumThread,
        ForumThreadModel, User, UserModel, VoteType,
    },
    utils::text::{slug_base, slugify},
};
use chrono::NaiveDateTime;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use std::cmp::Ordering;

pub const DEFAULT_THREAD_LIMIT: u64 = 50;
pub const MAX_THREAD_LIMIT: u64 = 100;

pub type ThreadWithAuthor = (ForumThreadModel, Option<UserModel>);
pub type ReplyWithAuthor = (ForumReplyModel, Option<UserModel>);

/// Thread page: the thread, its author and category, and live replies in display order.
pub struct ThreadView {
    pub thread: ForumThreadModel,
    pub author: Option<UserModel>,
    pub category: Option<ForumCategoryModel>,
    pub replies: Vec<ReplyWithAuthor>,
}

/// What a vote request does to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    Insert(VoteType),
    Remove,
    Change(VoteType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub vote: Option<VoteType>,
    pub upvotes: i32,
    pub downvotes: i32,
}

/// Same vote again toggles it off; the opposite vote replaces it.
pub fn decide_vote(existing: Option<VoteType>, requested: VoteType) -> VoteAction {
    match existing {
        None => VoteAction::Insert(requested),
        Some(current) if current == requested => VoteAction::Remove,
        Some(_) => VoteAction::Change(requested),
    }
}

/// Counter deltas `(upvotes, downvotes)` for moving from `before` to `after`.
pub fn tally_delta(before: Option<VoteType>, after: Option<VoteType>) -> (i32, i32) {
    let weight = |vote: Option<VoteType>| match vote {
        Some(VoteType::Up) => (1, 0),
        Some(VoteType::Down) => (0, 1),
        None => (0, 0),
    };
    let (up_before, down_before) = weight(before);
    let (up_after, down_after) = weight(after);
    (up_after - up_before, down_after - down_before)
}

/// Accepted first, then score descending, then oldest first, then id.
pub fn reply_order(a: &ForumReplyModel, b: &ForumReplyModel) -> Ordering {
    b.is_accepted
        .cmp(&a.is_accepted)
        .then_with(|| b.score().cmp(&a.score()))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_replies(replies: &mut [ForumReplyModel]) {
    replies.sort_by(reply_order);
}

pub struct ForumService {
    db: DatabaseConnection,
}

impl ForumService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ---- categories -------------------------------------------------------

    pub async fn list_categories(&self) -> AppResult<Vec<ForumCategoryModel>> {
        let categories = ForumCategory::find()
            .order_by_asc(forum_category::Column::DisplayOrder)
            .order_by_asc(forum_category::Column::Id)
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    pub async fn create_category(
        &self,
        actor: &AuthUser,
        name: &str,
        name_bn: &str,
        description: Option<String>,
        display_order: i32,
        now: NaiveDateTime,
    ) -> AppResult<ForumCategoryModel> {
        actor.require_admin()?;
        let (name, name_bn) = (name.trim(), name_bn.trim());
        if name.is_empty() || name_bn.is_empty() {
            return Err(AppError::validation("Both name and name_bn are required"));
        }
        let slug = slug_base(name);
        if slug.is_empty() {
            return Err(AppError::validation("Category slug must contain letters or digits"));
        }
        let taken = ForumCategory::find()
            .filter(forum_category::Column::Slug.eq(slug.as_str()))
            .count(&self.db)
            .await?
            > 0;
        if taken {
            return Err(AppError::validation("A forum category with this slug already exists"));
        }

        let category = forum_category::ActiveModel {
            name: Set(name.to_string()),
            name_bn: Set(name_bn.to_string()),
            slug: Set(slug),
            description: Set(description.filter(|d| !d.trim().is_empty())),
            display_order: Set(display_order),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(category)
    }

    // ---- threads ----------------------------------------------------------

    pub async fn create_thread(
        &self,
        actor: &AuthUser,
        title: &str,
        content: &str,
        category_id: i32,
        now: NaiveDateTime,
    ) -> AppResult<ForumThreadModel> {
        actor.ensure_not_suspended(now)?;
        let title = title.trim();
        if title.is_empty() || content.trim().is_empty() {
            return Err(AppError::validation("Title and content are required"));
        }
        ForumCategory::find_by_id(category_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::validation("Forum category does not exist"))?;

        let thread = forum_thread::ActiveModel {
            title: Set(title.to_string()),
            slug: Set(slugify(title, now)),
            content: Set(content.to_string()),
            user_id: Set(actor.user_id),
            category_id: Set(category_id),
            is_pinned: Set(false),
            is_locked: Set(false),
            has_accepted_answer: Set(false),
            view_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(thread_id = thread.id, user_id = actor.user_id, "thread created");
        Ok(thread)
    }

    /// Pinned threads first, then most recent activity. An unknown category
    /// slug yields an empty list.
    pub async fn list_threads(
        &self,
        category_slug: Option<&str>,
        limit: Option<u64>,
    ) -> AppResult<Vec<ThreadWithAuthor>> {
        let mut query = ForumThread::find();

        if let Some(slug) = category_slug {
            let Some(category) = ForumCategory::find()
                .filter(forum_category::Column::Slug.eq(slug))
                .one(&self.db)
                .await?
            else {
                return Ok(Vec::new());
            };
            query = query.filter(forum_thread::Column::CategoryId.eq(category.id));
        }

        let limit = limit
            .unwrap_or(DEFAULT_THREAD_LIMIT)
            .clamp(1, MAX_THREAD_LIMIT);

        let threads = query
            .order_by_desc(forum_thread::Column::IsPinned)
            .order_by_desc(forum_thread::Column::UpdatedAt)
            .order_by_desc(forum_thread::Column::Id)
            .limit(limit)
            .find_also_related(User)
            .all(&self.db)
            .await?;
        Ok(threads)
    }

    /// Thread page by slug. Counts a view.
    pub async fn get_thread(&self, slug: &str) -> AppResult<ThreadView> {
        let thread = ForumThread::find()
            .filter(forum_thread::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        ForumThread::update_many()
            .col_expr(
                forum_thread::Column::ViewCount,
                Expr::col(forum_thread::Column::ViewCount).add(1),
            )
            .filter(forum_thread::Column::Id.eq(thread.id))
            .exec(&self.db)
            .await?;

        let author = User::find_by_id(thread.user_id).one(&self.db).await?;
        let category = ForumCategory::find_by_id(thread.category_id)
            .one(&self.db)
            .await?;

        let mut replies = ForumReply::find()
            .filter(forum_reply::Column::ThreadId.eq(thread.id))
            .filter(forum_reply::Column::IsDeleted.eq(false))
            .find_also_related(User)
            .all(&self.db)
            .await?;
        replies.sort_by(|a, b| reply_order(&a.0, &b.0));

        let thread = ForumThreadModel {
            view_count: thread.view_count + 1,
            ..thread
        };
        Ok(ThreadView {
            thread,
            author,
            category,
            replies,
        })
    }

    async fn get_thread_by_id(&self, id: i32) -> AppResult<ForumThreadModel> {
        ForumThread::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn get_live_reply(&self, id: i32) -> AppResult<ForumReplyModel> {
        ForumReply::find_by_id(id)
            .one(&self.db)
            .await?
            .filter(|reply| !reply.is_deleted)
            .ok_or(AppError::NotFound)
    }

    // ---- replies ----------------------------------------------------------

    pub async fn create_reply(
        &self,
        actor: &AuthUser,
        thread_id: i32,
        content: &str,
        parent_id: Option<i32>,
        now: NaiveDateTime,
    ) -> AppResult<ForumReplyModel> {
        actor.ensure_not_suspended(now)?;
        if content.trim().is_empty() {
            return Err(AppError::validation("Reply content is required"));
        }

        let thread = self.get_thread_by_id(thread_id).await?;
        if thread.is_locked {
            return Err(AppError::Forbidden);
        }

        if let Some(parent_id) = parent_id {
            let parent = ForumReply::find_by_id(parent_id)
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::validation("Parent reply not found"))?;
            if parent.thread_id != thread_id {
                return Err(AppError::validation(
                    "Parent reply belongs to a different thread",
                ));
            }
        }

        let txn = self.db.begin().await?;
        let reply = forum_reply::ActiveModel {
            thread_id: Set(thread_id),
            user_id: Set(actor.user_id),
            parent_id: Set(parent_id),
            content: Set(content.to_string()),
            upvotes: Set(0),
            downvotes: Set(0),
            is_accepted: Set(false),
            is_deleted: Set(false),
            deleted_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        ForumThread::update_many()
            .col_expr(forum_thread::Column::UpdatedAt, Expr::value(now))
            .filter(forum_thread::Column::Id.eq(thread_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(reply)
    }

    // ---- voting -----------------------------------------------------------

    pub async fn vote(
        &self,
        actor: &AuthUser,
        reply_id: i32,
        requested: VoteType,
        now: NaiveDateTime,
    ) -> AppResult<VoteOutcome> {
        actor.ensure_not_suspended(now)?;
        self.get_live_reply(reply_id).await?;

        // Losing the insert race to the same voter rolls back; the retry sees their row.
        match self.apply_vote(actor.user_id, reply_id, requested, now).await {
            Err(err) if err.is_unique_violation() => {
                self.apply_vote(actor.user_id, reply_id, requested, now).await
            }
            result => result,
        }
    }

    async fn apply_vote(
        &self,
        user_id: i32,
        reply_id: i32,
        requested: VoteType,
        now: NaiveDateTime,
    ) -> AppResult<VoteOutcome> {
        let txn = self.db.begin().await?;

        let existing = ForumReplyVote::find()
            .filter(forum_reply_vote::Column::ReplyId.eq(reply_id))
            .filter(forum_reply_vote::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;
        let before = existing.as_ref().and_then(|row| row.vote());

        let after = match (decide_vote(before, requested), existing) {
            (VoteAction::Insert(vote), _) => {
                forum_reply_vote::ActiveModel {
                    reply_id: Set(reply_id),
                    user_id: Set(user_id),
                    vote_type: Set(vote.into()),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                Some(vote)
            }
            (VoteAction::Remove, Some(row)) => {
                ForumReplyVote::delete_by_id(row.id).exec(&txn).await?;
                None
            }
            (VoteAction::Change(vote), Some(row)) => {
                let mut active: forum_reply_vote::ActiveModel = row.into();
                active.vote_type = Set(vote.into());
                active.update(&txn).await?;
                Some(vote)
            }
            (_, None) => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "vote row missing for reply {reply_id}"
                )))
            }
        };

        apply_tally(&txn, reply_id, tally_delta(before, after)).await?;

        let reply = ForumReply::find_by_id(reply_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        txn.commit().await?;

        Ok(VoteOutcome {
            vote: after,
            upvotes: reply.upvotes,
            downvotes: reply.downvotes,
        })
    }

    pub async fn my_vote(&self, actor: &AuthUser, reply_id: i32) -> AppResult<Option<VoteType>> {
        let vote = ForumReplyVote::find()
            .filter(forum_reply_vote::Column::ReplyId.eq(reply_id))
            .filter(forum_reply_vote::Column::UserId.eq(actor.user_id))
            .one(&self.db)
            .await?;
        Ok(vote.and_then(|row| row.vote()))
    }

    // ---- accepted answer --------------------------------------------------

    pub async fn accept_answer(
        &self,
        actor: &AuthUser,
        reply_id: i32,
        now: NaiveDateTime,
    ) -> AppResult<ForumReplyModel> {
        let reply = self.get_live_reply(reply_id).await?;
        let thread = self.get_thread_by_id(reply.thread_id).await?;
        if thread.user_id != actor.user_id {
            return Err(AppError::Forbidden);
        }

        let txn = self.db.begin().await?;

        ForumReply::update_many()
            .col_expr(forum_reply::Column::IsAccepted, Expr::value(false))
            .filter(forum_reply::Column::ThreadId.eq(thread.id))
            .filter(forum_reply::Column::IsAccepted.eq(true))
            .exec(&txn)
            .await?;

        ForumReply::update_many()
            .col_expr(forum_reply::Column::IsAccepted, Expr::value(true))
            .col_expr(forum_reply::Column::UpdatedAt, Expr::value(now))
            .filter(forum_reply::Column::Id.eq(reply.id))
            .exec(&txn)
            .await?;

        ForumThread::update_many()
            .col_expr(forum_thread::Column::HasAcceptedAnswer, Expr::value(true))
            .filter(forum_thread::Column::Id.eq(thread.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        tracing::info!(thread_id = thread.id, reply_id, "answer accepted");

        Ok(ForumReplyModel {
            is_accepted: true,
            updated_at: now,
            ..reply
        })
    }

    // ---- moderation -------------------------------------------------------

    pub async fn set_locked(
        &self,
        actor: &AuthUser,
        thread_id: i32,
        locked: bool,
    ) -> AppResult<ForumThreadModel> {
        actor.require_staff()?;
        self.set_flag(thread_id, forum_thread::Column::IsLocked, locked)
            .await?;
        tracing::info!(thread_id, locked, by = actor.user_id, "thread lock changed");
        self.get_thread_by_id(thread_id).await
    }

    pub async fn set_pinned(
        &self,
        actor: &AuthUser,
        thread_id: i32,
        pinned: bool,
    ) -> AppResult<ForumThreadModel> {
        actor.require_staff()?;
        self.set_flag(thread_id, forum_thread::Column::IsPinned, pinned)
            .await?;
        tracing::info!(thread_id, pinned, by = actor.user_id, "thread pin changed");
        self.get_thread_by_id(thread_id).await
    }

    async fn set_flag(
        &self,
        thread_id: i32,
        column: forum_thread::Column,
        value: bool,
    ) -> AppResult<()> {
        let result = ForumThread::update_many()
            .col_expr(column, Expr::value(value))
            .filter(forum_thread::Column::Id.eq(thread_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Soft delete. Removing the accepted reply also clears the thread's
    /// accepted-answer flag.
    pub async fn delete_reply(
        &self,
        actor: &AuthUser,
        reply_id: i32,
        now: NaiveDateTime,
    ) -> AppResult<()> {
        actor.require_staff()?;
        let reply = self.get_live_reply(reply_id).await?;

        let txn = self.db.begin().await?;
        ForumReply::update_many()
            .col_expr(forum_reply::Column::IsDeleted, Expr::value(true))
            .col_expr(forum_reply::Column::IsAccepted, Expr::value(false))
            .col_expr(forum_reply::Column::DeletedBy, Expr::value(actor.user_id))
            .col_expr(forum_reply::Column::UpdatedAt, Expr::value(now))
            .filter(forum_reply::Column::Id.eq(reply_id))
            .exec(&txn)
            .await?;

        if reply.is_accepted {
            ForumThread::update_many()
                .col_expr(forum_thread::Column::HasAcceptedAnswer, Expr::value(false))
                .filter(forum_thread::Column::Id.eq(reply.thread_id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        tracing::info!(reply_id, by = actor.user_id, "reply deleted");
        Ok(())
    }
}

async fn apply_tally<C: ConnectionTrait>(
    conn: &C,
    reply_id: i32,
    (up, down): (i32, i32),
) -> AppResult<()> {
    if up == 0 && down == 0 {
        return Ok(());
    }
    ForumReply::update_many()
        .col_expr(
            forum_reply::Column::Upvotes,
            Expr::col(forum_reply::Column::Upvotes).add(up),
        )
        .col_expr(
            forum_reply::Column::Downvotes,
            Expr::col(forum_reply::Column::Downvotes).add(down),
        )
        .filter(forum_reply::Column::Id.eq(reply_id))
        .exec(conn)
        .await?;
    Ok(())
}
