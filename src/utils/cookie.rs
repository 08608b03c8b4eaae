use crate::config::env_flag;
use axum::http::{header, HeaderMap};
use std::env;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone)]
pub struct CookieConfig {
    secure: bool,
    same_site: &'static str,
    domain: Option<String>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: false,
            same_site: "Lax",
            domain: None,
        }
    }
}

impl CookieConfig {
    pub fn from_env() -> Self {
        let same_site = parse_same_site(
            &env::var("AUTH_COOKIE_SAMESITE").unwrap_or_else(|_| "Lax".to_string()),
        );
        let mut secure = env_flag("AUTH_COOKIE_SECURE", false);
        let domain = env::var("AUTH_COOKIE_DOMAIN")
            .ok()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        // Browsers require SameSite=None cookies to also be Secure.
        if same_site == "None" {
            secure = true;
        }

        Self {
            secure,
            same_site,
            domain,
        }
    }

    fn attributes(&self) -> String {
        let mut attrs = format!("; HttpOnly; SameSite={}", self.same_site);
        if self.secure {
            attrs.push_str("; Secure");
        }
        if let Some(domain) = &self.domain {
            attrs.push_str("; Domain=");
            attrs.push_str(domain);
        }
        attrs
    }

    pub fn build(&self, name: &str, value: &str, max_age_seconds: u64) -> String {
        format!(
            "{name}={value}; Path=/; Max-Age={max_age_seconds}{}",
            self.attributes()
        )
    }

    pub fn clear(&self, name: &str) -> String {
        format!(
            "{name}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT{}",
            self.attributes()
        )
    }
}

fn parse_same_site(value: &str) -> &'static str {
    match value.trim().to_ascii_lowercase().as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie_header| {
            cookie_header.split(';').find_map(|cookie| {
                let mut parts = cookie.trim().splitn(2, '=');
                let key = parts.next()?.trim();
                let value = parts.next()?.trim();
                if key == name {
                    Some(value.to_string())
                } else {
                    None
                }
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc.def; lang=bn"),
        );
        assert_eq!(
            extract_cookie(&headers, ACCESS_TOKEN_COOKIE).as_deref(),
            Some("abc.def")
        );
        assert!(extract_cookie(&headers, REFRESH_TOKEN_COOKIE).is_none());
    }

    #[test]
    fn built_cookie_is_http_only() {
        let cookie = CookieConfig::default().build(ACCESS_TOKEN_COOKIE, "tok", 900);
        assert!(cookie.starts_with("access_token=tok; Path=/; Max-Age=900"));
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let cookie = CookieConfig::default().clear(REFRESH_TOKEN_COOKIE);
        assert!(cookie.contains("Max-Age=0"));
    }
}
