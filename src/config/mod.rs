pub mod auth;
pub mod database;
pub mod email;
pub mod jwt;
pub mod rate_limit;
pub mod upload;

use std::env;

/// Parse a boolean environment flag, falling back to `default` when the
/// variable is missing or not recognised.
pub fn env_flag(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .and_then(|value| parse_flag(&value))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a numeric environment variable with a fallback.
pub fn env_parse<T: std::str::FromStr>(var_name: &str, default: T) -> T {
    env::var(var_name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" on "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("No"), Some(false));
    }

    #[test]
    fn flag_rejects_garbage() {
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_flag(""), None);
    }

    #[test]
    fn missing_numeric_var_uses_default() {
        assert_eq!(env_parse::<u32>("LEKHOK_TEST_SURELY_UNSET_VAR", 7), 7);
    }
}
