use super::parse_bool_env;
use std::{env, str::FromStr};

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

impl FromStr for RateLimitRule {
    type Err = String;

    /// Parses `per_second:burst`, e.g. `"10:20"`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (per_second_raw, burst_raw) = raw
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw.trim()))?;

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

        Ok(Self::new(per_second, burst_size))
    }
}

/// Route groups that get their own limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    Auth,
    PublicRead,
    Protected,
}

impl FromStr for RouteGroup {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auth" => Ok(Self::Auth),
            "public" | "public_read" | "public-read" => Ok(Self::PublicRead),
            "protected" => Ok(Self::Protected),
            other => Err(format!(
                "unknown group '{}', expected auth/public/protected",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub public_read: RateLimitRule,
    pub protected: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            public_read: RateLimitRule::new(30, 60),
            protected: RateLimitRule::new(10, 20),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            if let Err(err) = cfg.apply_overrides(&raw) {
                tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
                let enabled = cfg.enabled;
                cfg = Self {
                    enabled,
                    ..Self::default()
                };
            }
        }

        cfg
    }

    pub fn rule(&self, group: RouteGroup) -> RateLimitRule {
        match group {
            RouteGroup::Auth => self.auth,
            RouteGroup::PublicRead => self.public_read,
            RouteGroup::Protected => self.protected,
        }
    }

    fn set_rule(&mut self, group: RouteGroup, rule: RateLimitRule) {
        match group {
            RouteGroup::Auth => self.auth = rule,
            RouteGroup::PublicRead => self.public_read = rule,
            RouteGroup::Protected => self.protected = rule,
        }
    }

    /// Accepts either a single rule applied to every group (`"10:20"`) or a
    /// comma list of `group=per:burst` items.
    fn apply_overrides(&mut self, raw: &str) -> Result<(), String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("empty value".to_string());
        }

        if !trimmed.contains('=') {
            let rule: RateLimitRule = trimmed.parse()?;
            for group in [RouteGroup::Auth, RouteGroup::PublicRead, RouteGroup::Protected] {
                self.set_rule(group, rule);
            }
            return Ok(());
        }

        for item in trimmed.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (name, raw_rule) = item
                .split_once('=')
                .ok_or_else(|| format!("invalid item '{}', expected name=per:burst", item))?;
            let group: RouteGroup = name.parse()?;
            let rule: RateLimitRule = raw_rule.parse()?;
            self.set_rule(group, rule);
        }

        Ok(())
    }
}
