use crate::{
    error::{AppError, AppResult},
    models::{
        comment, forum_thread, post, user, Comment, ForumThread, ForumThreadModel, Post,
        PostModel, User, UserModel,
    },
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

/// Everything the profile page shows about the signed-in user.
pub struct Profile {
    pub user: UserModel,
    pub posts: Vec<PostModel>,
    pub comment_count: u64,
    pub threads: Vec<ForumThreadModel>,
}

/// Editable profile fields. `None` leaves a field unchanged; an empty string clears
/// the optional ones.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, user_id: i32) -> AppResult<UserModel> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn profile(&self, user_id: i32) -> AppResult<Profile> {
        let user = self.get_by_id(user_id).await?;

        let posts = Post::find()
            .filter(post::Column::AuthorId.eq(user_id))
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let comment_count = Comment::find()
            .filter(comment::Column::UserId.eq(user_id))
            .filter(comment::Column::IsDeleted.eq(false))
            .count(&self.db)
            .await?;

        let threads = ForumThread::find()
            .filter(forum_thread::Column::UserId.eq(user_id))
            .order_by_desc(forum_thread::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(Profile {
            user,
            posts,
            comment_count,
            threads,
        })
    }

    pub async fn update_profile(
        &self,
        user_id: i32,
        update: ProfileUpdate,
        now: NaiveDateTime,
    ) -> AppResult<UserModel> {
        let existing = self.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = existing.into();

        if let Some(full_name) = update.full_name {
            let full_name = full_name.trim();
            if full_name.is_empty() {
                return Err(AppError::validation("Full name cannot be empty"));
            }
            active.full_name = Set(full_name.to_string());
        }
        if let Some(bio) = update.bio {
            active.bio = Set(blank_to_none(bio));
        }
        if let Some(avatar_url) = update.avatar_url {
            active.avatar_url = Set(blank_to_none(avatar_url));
        }
        active.updated_at = Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }
}

fn blank_to_none(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_clear_the_field() {
        assert_eq!(blank_to_none("   ".into()), None);
        assert_eq!(blank_to_none(" hi ".into()).as_deref(), Some("hi"));
    }
}
