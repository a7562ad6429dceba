use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    key: &'static str,
    value: String,
    reason: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
    pub session_ttl_hours: i64,
    pub admin: AdminSeed,
    pub seed_demo: bool,
}

#[derive(Clone, Debug)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let admin = AdminSeed {
            email: string_or("ADMIN_EMAIL", "admin@allin.com"),
            password: string_or("ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD),
            name: string_or("ADMIN_NAME", "AllIn Admin"),
        };
        if admin.password == DEFAULT_ADMIN_PASSWORD {
            log::warn!(
                "ADMIN_PASSWORD not set. Using default password '{DEFAULT_ADMIN_PASSWORD}'. Set ADMIN_PASSWORD in production."
            );
        }

        Ok(Self {
            database_url: string_or("DATABASE_URL", "sqlite://./data/allin.db"),
            port: parse_or("PORT", 8080)?,
            max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 24)?,
            admin,
            seed_demo: parse_or("SEED_DEMO", false)?,
        })
    }
}

fn string_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|err: T::Err| ConfigError {
                key,
                value,
                reason: err.to_string(),
            })
        }
        _ => Ok(default),
    }
}
