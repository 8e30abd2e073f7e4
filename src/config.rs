use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

/// Upper bound for any token lifetime (one year).
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Older secrets still accepted when decoding, newest first.
    pub previous_secrets: Vec<String>,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} must be set"))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            previous_secrets: lookup("JWT_PREVIOUS_SECRETS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            access_ttl_minutes: ttl_minutes(&lookup, "JWT_ACCESS_TTL_MINUTES", 60 * 24)?,
            refresh_ttl_minutes: ttl_minutes(&lookup, "JWT_REFRESH_TTL_MINUTES", 60 * 72)?,
        };

        Ok(Self {
            database_url,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 8080)?,
            jwt,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn ttl_minutes<F>(lookup: &F, key: &str, default: i64) -> anyhow::Result<i64>
where
    F: Fn(&str) -> Option<String>,
{
    let minutes: i64 = parse_or(lookup, key, default)?;
    anyhow::ensure!(
        (1..=MAX_TTL_MINUTES).contains(&minutes),
        "{key} must be between 1 and {MAX_TTL_MINUTES} minutes, got {minutes}"
    );
    Ok(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_values_missing() {
        let cfg = load(&[("DATABASE_URL", "postgres://db"), ("JWT_SECRET", "s3cret")])
            .expect("config loads");
        assert_eq!(cfg.jwt.access_ttl_minutes, 24 * 60);
        assert_eq!(cfg.jwt.refresh_ttl_minutes, 72 * 60);
        assert!(cfg.jwt.previous_secrets.is_empty());
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.max_connections, 10);
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = load(&[("DATABASE_URL", "postgres://db")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn missing_database_url_is_fatal() {
        let err = load(&[("JWT_SECRET", "s3cret")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn unparsable_number_is_fatal() {
        let err = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "s3cret"),
            ("APP_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }

    #[test]
    fn token_lifetimes_out_of_range_are_fatal() {
        for (key, value) in [
            ("JWT_ACCESS_TTL_MINUTES", "0"),
            ("JWT_ACCESS_TTL_MINUTES", "-5"),
            ("JWT_ACCESS_TTL_MINUTES", "100000000000000"),
            ("JWT_REFRESH_TTL_MINUTES", "9223372036854775807"),
        ] {
            let err = load(&[
                ("DATABASE_URL", "postgres://db"),
                ("JWT_SECRET", "s3cret"),
                (key, value),
            ])
            .unwrap_err();
            assert!(err.to_string().contains(key), "{key}={value}: {err}");
        }
    }

    #[test]
    fn token_lifetime_at_upper_bound_is_accepted() {
        let max = MAX_TTL_MINUTES.to_string();
        let cfg = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_REFRESH_TTL_MINUTES", max.as_str()),
        ])
        .expect("config loads");
        assert_eq!(cfg.jwt.refresh_ttl_minutes, MAX_TTL_MINUTES);
    }

    #[test]
    fn previous_secrets_are_split_and_trimmed() {
        let cfg = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "current"),
            ("JWT_PREVIOUS_SECRETS", " old-1 , ,old-2"),
        ])
        .expect("config loads");
        assert_eq!(cfg.jwt.previous_secrets, vec!["old-1", "old-2"]);
    }
}
