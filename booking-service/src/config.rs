use anyhow::{anyhow, Context, Result};
use common_auth::{Environment, DEFAULT_BCRYPT_COST};
use std::env;
use std::net::{IpAddr, SocketAddr};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub environment: Environment,
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub access_token_expire_minutes: i64,
    pub token_leeway_seconds: u64,
    pub bcrypt_cost: u32,
    pub run_migrations: bool,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    config_from(|key| env::var(key).ok())
}

/// Builds the config from any key lookup; `load_service_config` passes the process environment.
pub fn config_from<F>(lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let environment = lookup("ENV")
        .and_then(|value| normalize_optional(&value))
        .ok_or_else(|| anyhow!("ENV must be set to one of dev, prod, test"))?
        .parse::<Environment>()
        .context("Failed to parse ENV")?;

    let database_url = database_url(&lookup, environment)?;

    let host = lookup("HOST")
        .and_then(|value| normalize_optional(&value))
        .unwrap_or_else(|| "0.0.0.0".to_string())
        .parse::<IpAddr>()
        .context("Failed to parse HOST")?;

    let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
    let access_token_expire_minutes = parse_or(
        &lookup,
        "ACCESS_TOKEN_EXPIRE_MINUTES",
        DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
    )?;
    if access_token_expire_minutes <= 0 {
        return Err(anyhow!("ACCESS_TOKEN_EXPIRE_MINUTES must be positive"));
    }
    let token_leeway_seconds = parse_or(&lookup, "AUTH_TOKEN_LEEWAY_SECONDS", 0u64)?;
    let bcrypt_cost = parse_or(&lookup, "AUTH_BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
    if !(4..=31).contains(&bcrypt_cost) {
        return Err(anyhow!("AUTH_BCRYPT_COST must be between 4 and 31"));
    }
    let run_migrations = lookup("RUN_MIGRATIONS")
        .map(|value| bool_from_str(&value))
        .unwrap_or(false);

    Ok(ServiceConfig {
        environment,
        database_url,
        host,
        port,
        access_token_expire_minutes,
        token_leeway_seconds,
        bcrypt_cost,
        run_migrations,
    })
}

fn database_url<F>(lookup: &F, environment: Environment) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL").and_then(|value| normalize_optional(&value)) {
        return Ok(url);
    }

    let key = match environment {
        Environment::Test => "DATABASE_URL_TEST".to_string(),
        other => format!("DB_CONNECTION_STRING_{}", other.as_str().to_ascii_uppercase()),
    };
    lookup(&key)
        .and_then(|value| normalize_optional(&value))
        .ok_or_else(|| anyhow!("{key} (or DATABASE_URL) must be set"))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).and_then(|value| normalize_optional(&value)) {
        Some(value) => value
            .parse::<T>()
            .with_context(|| format!("Failed to parse {key}")),
        None => Ok(default),
    }
}

fn bool_from_str(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
