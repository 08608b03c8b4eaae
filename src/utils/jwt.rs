use crate::config::jwt::JwtConfig;
use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: usize,
    pub iat: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>, // "access" or "refresh"
    /// Random per-token id so two refresh tokens issued in the same second differ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

fn encode_token(config: &JwtConfig, user_id: i32, token_type: &str, ttl: u64) -> Result<String> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + ttl as usize,
        iat: now,
        token_type: Some(token_type.to_string()),
        jti: Some(uuid::Uuid::new_v4().simple().to_string()),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to encode {} token: {}", token_type, e))
}

pub fn encode_access_token(config: &JwtConfig, user_id: i32) -> Result<String> {
    encode_token(config, user_id, "access", config.access_token_expiry)
}

pub fn encode_refresh_token(config: &JwtConfig, user_id: i32) -> Result<String> {
    encode_token(config, user_id, "refresh", config.refresh_token_expiry)
}

pub fn decode_jwt(config: &JwtConfig, token: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| anyhow::anyhow!("Failed to decode JWT: {}", e))
}

pub fn is_refresh_token(claims: &Claims) -> bool {
    matches!(claims.token_type.as_deref(), Some("refresh"))
}

pub fn is_access_token(claims: &Claims) -> bool {
    matches!(claims.token_type.as_deref(), Some("access"))
}

impl Claims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

/// Digest stored in `refresh_tokens.token_hash`; the raw token never hits the database.
pub fn hash_refresh_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new("a_very_long_secret_key_that_is_at_least_32_chars").unwrap()
    }

    #[test]
    fn access_token_carries_user_and_type() {
        let config = config();
        let token = encode_access_token(&config, 42).unwrap();
        let claims = decode_jwt(&config, &token).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert!(claims.exp > claims.iat);
        assert!(is_access_token(&claims));
        assert!(!is_refresh_token(&claims));
    }

    #[test]
    fn refresh_tokens_are_unique() {
        let config = config();
        let a = encode_refresh_token(&config, 7).unwrap();
        let b = encode_refresh_token(&config, 7).unwrap();
        assert_ne!(a, b);
        assert!(is_refresh_token(&decode_jwt(&config, &a).unwrap()));
    }

    #[test]
    fn tampered_token_fails() {
        let config = config();
        let token = encode_access_token(&config, 42).unwrap();
        let mut chars: Vec<char> = token.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert!(decode_jwt(&config, &tampered).is_err());
    }

    #[test]
    fn token_from_other_secret_fails() {
        let other = JwtConfig::new("another_secret_key_that_is_also_32_chars_long").unwrap();
        let token = encode_access_token(&other, 1).unwrap();
        assert!(decode_jwt(&config(), &token).is_err());
    }

    #[test]
    fn expired_token_fails() {
        let config = config();
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "42".to_string(),
            exp: now - 3600,
            iat: now - 7200,
            token_type: Some("access".to_string()),
            jti: None,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();
        assert!(decode_jwt(&config, &token).is_err());
    }

    #[test]
    fn refresh_hash_is_stable() {
        assert_eq!(hash_refresh_token("abc"), hash_refresh_token("abc"));
        assert_ne!(hash_refresh_token("abc"), hash_refresh_token("abd"));
    }
}
