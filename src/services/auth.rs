use crate::{
    config::{auth::AuthConfig, jwt::JwtConfig},
    error::{AppError, AppResult},
    models::{refresh_token, user, RefreshToken, Role, User, UserModel},
    services::email::EmailService,
    utils::{
        encode_access_token, encode_refresh_token, hash_password,
        jwt::{decode_jwt, hash_refresh_token, is_refresh_token},
        verify_password,
    },
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait,
};

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
}

pub struct AuthService {
    db: DatabaseConnection,
    config: AuthConfig,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(db: DatabaseConnection, config: AuthConfig, jwt: JwtConfig) -> Self {
        Self { db, config, jwt }
    }

    /// Register a new account. Tokens are issued straight away unless the
    /// address still has to be verified.
    pub async fn signup(
        &self,
        account: NewAccount<'_>,
        email_service: &EmailService,
    ) -> AppResult<(UserModel, Option<TokenPair>)> {
        if self.user_exists(account.username, account.email).await? {
            return Err(AppError::validation("Username or email already exists"));
        }

        let password_hash = hash_password(account.password, self.config.bcrypt_cost)?;
        let now = chrono::Utc::now().naive_utc();
        let (email_verified, verification_token, verification_expires) =
            if self.config.require_email_verification {
                let token = uuid::Uuid::new_v4().to_string();
                (false, Some(token), Some(now + chrono::Duration::hours(24)))
            } else {
                (true, None, None)
            };

        let full_name = match account.full_name.trim() {
            "" => account.username.to_string(),
            name => name.to_string(),
        };

        let new_user = user::ActiveModel {
            username: Set(account.username.to_string()),
            email: Set(account.email.to_string()),
            password_hash: Set(password_hash),
            full_name: Set(full_name),
            reputation_points: Set(0),
            role: Set(Role::User),
            is_suspended: Set(false),
            suspended_until: Set(None),
            email_verified: Set(email_verified),
            email_verification_token: Set(verification_token.clone()),
            email_verification_expires: Set(verification_expires),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;
        tracing::info!(user_id = user.id, "account created");

        if let Some(token) = verification_token {
            if let Err(e) = email_service
                .send_verification_email(&user.email, &token)
                .await
            {
                tracing::warn!("Failed to send verification email: {e}");
            }
            return Ok((user, None));
        }

        let tokens = self.issue_tokens(&self.db, user.id).await?;
        Ok((user, Some(tokens)))
    }

    /// `identifier` is a username or an email address.
    pub async fn login(&self, identifier: &str, password: &str) -> AppResult<(UserModel, TokenPair)> {
        let user = User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(identifier))
                    .add(user::Column::Email.eq(identifier)),
            )
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        if self.config.require_email_verification && !user.email_verified {
            return Err(AppError::validation("Email address has not been verified"));
        }

        let tokens = self.issue_tokens(&self.db, user.id).await?;
        Ok((user, tokens))
    }

    /// Exchange a refresh token for a new pair; the presented token is revoked.
    pub async fn refresh(&self, presented: &str) -> AppResult<TokenPair> {
        let claims = decode_jwt(&self.jwt, presented).map_err(|_| AppError::Unauthorized)?;
        if !is_refresh_token(&claims) {
            return Err(AppError::Unauthorized);
        }
        let user_id = claims.user_id().ok_or(AppError::Unauthorized)?;
        let now = chrono::Utc::now().naive_utc();

        let existing = RefreshToken::find()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .filter(refresh_token::Column::TokenHash.eq(hash_refresh_token(presented)))
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if existing.expires_at <= now {
            RefreshToken::delete_by_id(existing.id).exec(&self.db).await?;
            return Err(AppError::Unauthorized);
        }

        let txn = self.db.begin().await?;
        RefreshToken::delete_by_id(existing.id).exec(&txn).await?;
        let tokens = self.issue_tokens(&txn, user_id).await?;
        txn.commit().await?;
        Ok(tokens)
    }

    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        RefreshToken::delete_many()
            .filter(refresh_token::Column::TokenHash.eq(hash_refresh_token(refresh_token)))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn verify_email(&self, token: &str) -> AppResult<()> {
        let user = User::find()
            .filter(user::Column::EmailVerificationToken.eq(token))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::validation("Invalid verification token"))?;

        if let Some(expires) = user.email_verification_expires {
            if chrono::Utc::now().naive_utc() > expires {
                return Err(AppError::validation("Verification token has expired"));
            }
        }

        let mut active: user::ActiveModel = user.into();
        active.email_verified = Set(true);
        active.email_verification_token = Set(None);
        active.email_verification_expires = Set(None);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(&self.db).await?;
        Ok(())
    }

    /// Issue a fresh verification token for an unverified address.
    pub async fn resend_verification(
        &self,
        email: &str,
        email_service: &EmailService,
    ) -> AppResult<()> {
        let Some(user) = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
        else {
            // Same answer whether or not the address is registered.
            return Ok(());
        };

        if user.email_verified {
            return Err(AppError::validation("Email is already verified"));
        }

        let token = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().naive_utc();
        let address = user.email.clone();

        let mut active: user::ActiveModel = user.into();
        active.email_verification_token = Set(Some(token.clone()));
        active.email_verification_expires = Set(Some(now + chrono::Duration::hours(24)));
        active.updated_at = Set(now);
        active.update(&self.db).await?;

        if let Err(e) = email_service.send_verification_email(&address, &token).await {
            tracing::warn!("Failed to send verification email: {e}");
        }
        Ok(())
    }

    async fn user_exists(&self, username: &str, email: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn issue_tokens<C: ConnectionTrait>(&self, conn: &C, user_id: i32) -> AppResult<TokenPair> {
        let access_token = encode_access_token(&self.jwt, user_id)?;
        let refresh_token = encode_refresh_token(&self.jwt, user_id)?;

        let now = chrono::Utc::now().naive_utc();
        let expires_at = now + chrono::Duration::seconds(self.jwt.refresh_token_expiry as i64);
        refresh_token::ActiveModel {
            user_id: Set(user_id),
            token_hash: Set(hash_refresh_token(&refresh_token)),
            expires_at: Set(expires_at),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

/// Where to send the user after login: a caller-supplied local path if it is
/// safe, otherwise the landing page for their role.
pub fn post_login_redirect(role: Role, requested: Option<&str>) -> String {
    match requested {
        Some(path) if is_safe_redirect(path) => path.to_string(),
        _ => role.home_path().to_string(),
    }
}

/// Local absolute paths only; `//host` and `/\host` would leave the site.
fn is_safe_redirect(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}
