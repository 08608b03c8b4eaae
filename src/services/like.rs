use crate::{
    error::{AppError, AppResult},
    models::{like, post, Like, Post, PostStatus},
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub count: u64,
}

pub struct LikeService {
    db: DatabaseConnection,
}

impl LikeService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Like the post, or take the like back if already given.
    /// Only published posts can be liked.
    pub async fn toggle(&self, user_id: i32, post_id: i32, now: NaiveDateTime) -> AppResult<LikeState> {
        Post::find_by_id(post_id)
            .filter(post::Column::Status.eq(PostStatus::Approved))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        // A lost insert race means the row now exists; the second pass removes it.
        let liked = match self.flip(user_id, post_id, now).await {
            Err(err) if err.is_unique_violation() => self.flip(user_id, post_id, now).await?,
            result => result?,
        };

        Ok(LikeState {
            liked,
            count: self.count(post_id).await?,
        })
    }

    async fn flip(&self, user_id: i32, post_id: i32, now: NaiveDateTime) -> AppResult<bool> {
        let existing = Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::PostId.eq(post_id))
            .one(&self.db)
            .await?;

        match existing {
            Some(row) => {
                Like::delete_by_id(row.id).exec(&self.db).await?;
                Ok(false)
            }
            None => {
                like::ActiveModel {
                    post_id: Set(post_id),
                    user_id: Set(user_id),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.db)
                .await?;
                Ok(true)
            }
        }
    }

    pub async fn count(&self, post_id: i32) -> AppResult<u64> {
        Ok(Like::find()
            .filter(like::Column::PostId.eq(post_id))
            .count(&self.db)
            .await?)
    }

    /// Like count plus whether `user_id` (when signed in) has liked the post.
    pub async fn state(&self, post_id: i32, user_id: Option<i32>) -> AppResult<LikeState> {
        let liked = match user_id {
            Some(user_id) => {
                Like::find()
                    .filter(like::Column::UserId.eq(user_id))
                    .filter(like::Column::PostId.eq(post_id))
                    .count(&self.db)
                    .await?
                    > 0
            }
            None => false,
        };
        Ok(LikeState {
            liked,
            count: self.count(post_id).await?,
        })
    }
}
