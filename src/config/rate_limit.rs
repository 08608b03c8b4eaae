use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

/// Per route-group request budgets. `browse` covers anonymous reads, `member`
/// every route that needs a session.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub browse: RateLimitRule,
    pub member: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            browse: RateLimitRule::new(30, 60),
            member: RateLimitRule::new(10, 20),
        }
    }
}

impl RateLimitConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = super::env_flag("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            match parse_rate_limit_config(&raw) {
                Ok(overrides) => cfg = cfg.apply(overrides),
                Err(err) => {
                    tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
                }
            }
        }

        cfg
    }

    fn apply(mut self, overrides: Vec<(RouteGroup, RateLimitRule)>) -> Self {
        for (group, rule) in overrides {
            match group {
                RouteGroup::All => {
                    self.auth = rule;
                    self.browse = rule;
                    self.member = rule;
                }
                RouteGroup::Auth => self.auth = rule,
                RouteGroup::Browse => self.browse = rule,
                RouteGroup::Member => self.member = rule,
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteGroup {
    All,
    Auth,
    Browse,
    Member,
}

impl RouteGroup {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auth" => Some(Self::Auth),
            "browse" | "public" => Some(Self::Browse),
            "member" | "protected" => Some(Self::Member),
            _ => None,
        }
    }
}

/// Accepts either a single `per:burst` pair applied to every group, or a
/// comma separated list such as `auth=5:10,browse=30:60,member=10:20`.
fn parse_rate_limit_config(raw: &str) -> Result<Vec<(RouteGroup, RateLimitRule)>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty value".to_string());
    }

    if !trimmed.contains('=') {
        return Ok(vec![(RouteGroup::All, parse_rule(trimmed)?)]);
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (name, raw_rule) = item
                .split_once('=')
                .ok_or_else(|| format!("invalid item '{}', expected name=per:burst", item))?;
            let group = RouteGroup::parse(name).ok_or_else(|| {
                format!(
                    "unknown group '{}', expected auth/browse/member",
                    name.trim()
                )
            })?;
            Ok((group, parse_rule(raw_rule.trim())?))
        })
        .collect()
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second_raw, burst_raw) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw))?;

    let per_second: u64 = per_second_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second_raw.trim()))?;
    let burst_size: u32 = burst_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst_raw.trim()))?;

    if per_second == 0 || burst_size == 0 {
        return Err("per_second and burst_size must be > 0".to_string());
    }

    Ok(RateLimitRule::new(per_second, burst_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rule_applies_everywhere() {
        let cfg = RateLimitConfig::default().apply(parse_rate_limit_config("12:24").unwrap());
        assert_eq!(cfg.auth, RateLimitRule::new(12, 24));
        assert_eq!(cfg.browse, RateLimitRule::new(12, 24));
        assert_eq!(cfg.member, RateLimitRule::new(12, 24));
    }

    #[test]
    fn grouped_rules_override_individually() {
        let cfg = RateLimitConfig::default()
            .apply(parse_rate_limit_config("auth=1:2, member=5:6").unwrap());
        assert_eq!(cfg.auth, RateLimitRule::new(1, 2));
        assert_eq!(cfg.browse, RateLimitConfig::default().browse);
        assert_eq!(cfg.member, RateLimitRule::new(5, 6));
    }

    #[test]
    fn legacy_group_names_accepted() {
        let parsed = parse_rate_limit_config("public=8:16,protected=3:4").unwrap();
        assert_eq!(parsed[0], (RouteGroup::Browse, RateLimitRule::new(8, 16)));
        assert_eq!(parsed[1], (RouteGroup::Member, RateLimitRule::new(3, 4)));
    }

    #[test]
    fn zero_budget_rejected() {
        assert!(parse_rate_limit_config("0:10").is_err());
    }

    #[test]
    fn unknown_group_rejected() {
        let err = parse_rate_limit_config("admin=1:1").unwrap_err();
        assert!(err.contains("unknown group"));
    }
}
