use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Seconds, default 15 minutes
    pub access_token_expiry: u64,
    /// Seconds, default 7 days
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.len() < 32 {
            return Err(anyhow::anyhow!("JWT_SECRET must be at least 32 characters"));
        }

        Ok(Self {
            secret,
            access_token_expiry: 900,
            refresh_token_expiry: 604_800,
        })
    }

    pub fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable must be set"))?;

        let mut config = Self::new(secret)?;
        config.access_token_expiry =
            super::env_parse("JWT_ACCESS_EXPIRATION", config.access_token_expiry);
        config.refresh_token_expiry =
            super::env_parse("JWT_REFRESH_EXPIRATION", config.refresh_token_expiry);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secret_rejected() {
        assert!(JwtConfig::new("too-short").is_err());
    }

    #[test]
    fn defaults_applied() {
        let config = JwtConfig::new("x".repeat(32)).unwrap();
        assert_eq!(config.access_token_expiry, 900);
        assert_eq!(config.refresh_token_expiry, 604_800);
    }
}
