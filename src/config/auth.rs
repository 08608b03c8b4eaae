use super::{env_flag, env_parse};

/// Account policy knobs read once at startup and shared with handlers.
#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    pub require_email_verification: bool,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_email_verification: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        // bcrypt rejects costs outside 4..=31
        let bcrypt_cost = env_parse("BCRYPT_COST", defaults.bcrypt_cost).clamp(4, 31);

        Self {
            require_email_verification: env_flag(
                "REQUIRE_EMAIL_VERIFICATION",
                defaults.require_email_verification,
            ),
            bcrypt_cost,
        }
    }
}
