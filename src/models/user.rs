use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role. Declaration order is privilege order, so `>=` compares roles.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Role {
    #[sea_orm(string_value = "user")]
    #[default]
    User,
    #[sea_orm(string_value = "contributor")]
    Contributor,
    #[sea_orm(string_value = "author")]
    Author,
    #[sea_orm(string_value = "moderator")]
    Moderator,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    /// May use the author area: write and submit posts.
    pub fn can_write(self) -> bool {
        self >= Role::Contributor
    }

    /// May review posts, moderate replies and handle reports.
    pub fn is_staff(self) -> bool {
        self >= Role::Moderator
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Landing page after login.
    pub fn home_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Moderator => "/moderator",
            Role::Author | Role::Contributor => "/author",
            Role::User => "/",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub reputation_points: i32,
    pub role: Role,
    pub is_suspended: bool,
    pub suspended_until: Option<DateTime>,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub email_verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub email_verification_expires: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A suspension without an end date lasts until lifted.
    pub fn is_active_suspension(&self, now: DateTime) -> bool {
        self.is_suspended && self.suspended_until.map_or(true, |until| until > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(is_suspended: bool, suspended_until: Option<DateTime>) -> Model {
        let now = chrono::Utc::now().naive_utc();
        Model {
            id: 1,
            username: "rahim".into(),
            email: "rahim@example.com".into(),
            password_hash: String::new(),
            full_name: "Rahim".into(),
            avatar_url: None,
            bio: None,
            reputation_points: 0,
            role: Role::User,
            is_suspended,
            suspended_until,
            email_verified: true,
            email_verification_token: None,
            email_verification_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn role_order_matches_privilege() {
        assert!(Role::User < Role::Contributor);
        assert!(Role::Contributor < Role::Author);
        assert!(Role::Author < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
        assert!(Role::Contributor.can_write());
        assert!(!Role::User.can_write());
        assert!(Role::Moderator.is_staff());
        assert!(!Role::Author.is_staff());
    }

    #[test]
    fn home_paths() {
        assert_eq!(Role::Admin.home_path(), "/admin");
        assert_eq!(Role::Moderator.home_path(), "/moderator");
        assert_eq!(Role::Contributor.home_path(), "/author");
        assert_eq!(Role::User.home_path(), "/");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Moderator).unwrap(), "\"moderator\"");
        let parsed: Role = serde_json::from_str("\"contributor\"").unwrap();
        assert_eq!(parsed, Role::Contributor);
    }

    #[test]
    fn suspension_window() {
        let now = chrono::Utc::now().naive_utc();
        assert!(!user(false, None).is_active_suspension(now));
        assert!(user(true, None).is_active_suspension(now));
        assert!(user(true, Some(now + Duration::days(1))).is_active_suspension(now));
        assert!(!user(true, Some(now - Duration::seconds(1))).is_active_suspension(now));
        assert!(!user(true, Some(now)).is_active_suspension(now));
    }
}
