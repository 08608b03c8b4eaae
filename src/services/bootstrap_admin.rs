use crate::config::env_flag;
use crate::error::AppResult;
use crate::models::{user, Role, User};
use crate::utils::hash_password;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter,
};
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl BootstrapAdminConfig {
    pub fn from_env() -> Option<Self> {
        if !env_flag("BOOTSTRAP_ADMIN_ENABLED", false) {
            return None;
        }

        Some(Self {
            username: env::var("BOOTSTRAP_ADMIN_USERNAME").ok()?,
            email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?,
            password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?,
        })
    }
}

/// Make sure an admin exists at startup:
/// - any admin already present: nothing to do
/// - configured username/email exists: promote it
/// - otherwise create a verified admin account
pub async fn ensure_bootstrap_admin(
    db: &DatabaseConnection,
    cfg: &BootstrapAdminConfig,
    bcrypt_cost: u32,
) -> AppResult<()> {
    let admin_exists = User::find()
        .filter(user::Column::Role.eq(Role::Admin))
        .one(db)
        .await?
        .is_some();
    if admin_exists {
        return Ok(());
    }

    let existing = User::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(cfg.email.as_str()))
                .add(user::Column::Username.eq(cfg.username.as_str())),
        )
        .one(db)
        .await?;

    let now = chrono::Utc::now().naive_utc();

    if let Some(existing) = existing {
        let user_id = existing.id;
        let mut active: user::ActiveModel = existing.into();
        active.role = Set(Role::Admin);
        active.updated_at = Set(now);
        active.update(db).await?;
        tracing::info!(user_id, "bootstrap: promoted existing account to admin");
        return Ok(());
    }

    let admin = user::ActiveModel {
        username: Set(cfg.username.clone()),
        email: Set(cfg.email.clone()),
        password_hash: Set(hash_password(&cfg.password, bcrypt_cost)?),
        full_name: Set(cfg.username.clone()),
        reputation_points: Set(0),
        role: Set(Role::Admin),
        is_suspended: Set(false),
        suspended_until: Set(None),
        email_verified: Set(true),
        email_verification_token: Set(None),
        email_verification_expires: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(user_id = admin.id, "bootstrap: created admin account");
    Ok(())
}
