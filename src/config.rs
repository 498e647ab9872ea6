use anyhow::{bail, Context};
use serde::Deserialize;

const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 7;
const DEFAULT_BCRYPT_COST: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

/// Which adaptive hash is used for newly stored passwords.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    Bcrypt,
    Argon2,
}

impl std::str::FromStr for PasswordScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bcrypt" => Ok(Self::Bcrypt),
            "argon2" => Ok(Self::Argon2),
            other => bail!("unknown PASSWORD_SCHEME {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub scheme: PasswordScheme,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (process env in production).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .or_else(|| lookup("PG_CONNECTION_STRING"))
            .context("DATABASE_URL is not set")?;

        let secret = lookup("JWT_SECRET").context("JWT_SECRET is not set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let jwt = JwtConfig {
            secret,
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", DEFAULT_TOKEN_TTL_MINUTES)?,
        };
        if jwt.ttl_minutes <= 0 {
            bail!("JWT_TTL_MINUTES must be positive");
        }

        let scheme = match lookup("PASSWORD_SCHEME") {
            Some(v) => v.parse()?,
            None => PasswordScheme::Bcrypt,
        };
        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31, got {bcrypt_cost}");
        }

        let database = DatabaseConfig {
            url: database_url,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            idle_timeout_secs: parse_or(&lookup, "DB_IDLE_TIMEOUT_SECS", 30)?,
        };

        let port = match lookup("APP_PORT").or_else(|| lookup("PORT")) {
            Some(v) => v.parse().with_context(|| format!("invalid APP_PORT {v:?}"))?,
            None => 3000,
        };

        Ok(Self {
            database,
            jwt,
            password: PasswordConfig {
                scheme,
                bcrypt_cost,
            },
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key} {raw:?}: {e}")),
        None => Ok(default),
    }
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
    fn defaults_follow_the_auth_contract() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/evently"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.jwt.ttl_minutes, 7 * 24 * 60);
        assert_eq!(cfg.password.scheme, PasswordScheme::Bcrypt);
        assert_eq!(cfg.password.bcrypt_cost, 10);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.database.acquire_timeout_secs, 5);
        assert_eq!(cfg.port, 3000);
    }

    #[test]
    fn falls_back_to_legacy_keys() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("PG_CONNECTION_STRING", "postgres://legacy/db"),
            ("JWT_SECRET", "s3cret"),
            ("PORT", "4000"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.database.url, "postgres://legacy/db");
        assert_eq!(cfg.port, 4000);
    }

    #[test]
    fn missing_or_empty_secret_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]))
            .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "   "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn rejects_out_of_range_bcrypt_cost() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("BCRYPT_COST", "2"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("BCRYPT_COST"));
    }

    #[test]
    fn parses_argon2_scheme() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("PASSWORD_SCHEME", "Argon2"),
        ]))
        .expect("config should load");
        assert_eq!(cfg.password.scheme, PasswordScheme::Argon2);
    }
}
