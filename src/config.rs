use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,
    pub max_body_bytes: usize,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,

    // Redis
    pub redis_url: String,
    pub redis_cache_ttl_seconds: u64,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Auth
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_leeway_seconds: u64,

    // Marketplace
    pub commission_rate_bps: u32,
    pub match_candidate_limit: i64,
    pub match_default_limit: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let env = Environment::parse(&or_default("ENV", "dev"));
        let server_addr = or_default("SERVER_ADDR", "0.0.0.0:8080");
        let max_body_bytes = parse_or(&lookup, "MAX_BODY_BYTES", 1024 * 1024);

        // Database
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10);
        let run_migrations = parse_or(&lookup, "RUN_MIGRATIONS", true);

        // Redis
        let redis_url = or_default("REDIS_URL", "redis://localhost:6379/0");
        let redis_cache_ttl_seconds = parse_or(&lookup, "REDIS_CACHE_TTL_SECONDS", 300);

        // CORS
        let cors_allow_origins = or_default("CORS_ALLOW_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Auth
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.len() < 32 && env.is_prod() {
            anyhow::bail!("JWT_SECRET must be at least 32 bytes in production");
        }
        let jwt_issuer = or_default("JWT_ISSUER", "bell24h");
        let jwt_leeway_seconds = parse_or(&lookup, "JWT_LEEWAY_SECONDS", 30);

        // Marketplace
        let commission_rate_bps: u32 = parse_or(&lookup, "COMMISSION_RATE_BPS", 250);
        if commission_rate_bps > 10_000 {
            anyhow::bail!("COMMISSION_RATE_BPS must be between 0 and 10000");
        }
        let match_candidate_limit = parse_or(&lookup, "MATCH_CANDIDATE_LIMIT", 500_i64).max(1);
        let match_default_limit = parse_or(&lookup, "MATCH_DEFAULT_LIMIT", 10_usize).clamp(1, 50);

        Ok(Settings {
            env,
            server_addr,
            max_body_bytes,
            database_url,
            database_max_connections,
            run_migrations,
            redis_url,
            redis_cache_ttl_seconds,
            cors_allow_origins,
            jwt_secret,
            jwt_issuer,
            jwt_leeway_seconds,
            commission_rate_bps,
            match_candidate_limit,
            match_default_limit,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/bell24h"),
            ("JWT_SECRET", "dev-secret"),
        ]))
        .unwrap();

        assert_eq!(settings.env, Environment::Dev);
        assert_eq!(settings.server_addr, "0.0.0.0:8080");
        assert_eq!(settings.commission_rate_bps, 250);
        assert_eq!(settings.match_default_limit, 10);
        assert_eq!(settings.cors_allow_origins, vec!["http://localhost:3000"]);
        assert!(settings.run_migrations);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = Settings::from_lookup(lookup_from(&[("JWT_SECRET", "x")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn short_secret_rejected_in_prod() {
        let result = Settings::from_lookup(lookup_from(&[
            ("ENV", "production"),
            ("DATABASE_URL", "postgres://localhost/bell24h"),
            ("JWT_SECRET", "short"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn commission_rate_out_of_range_rejected() {
        let result = Settings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/bell24h"),
            ("JWT_SECRET", "dev-secret"),
            ("COMMISSION_RATE_BPS", "12000"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/bell24h"),
            ("JWT_SECRET", "dev-secret"),
            ("CORS_ALLOW_ORIGINS", "https://bell24h.com, https://admin.bell24h.com,,"),
            ("MATCH_DEFAULT_LIMIT", "500"),
        ]))
        .unwrap();

        assert_eq!(
            settings.cors_allow_origins,
            vec!["https://bell24h.com", "https://admin.bell24h.com"]
        );
        assert_eq!(settings.match_default_limit, 50);
    }
}
