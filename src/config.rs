use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Noop,
    Log,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_minutes: i64,
    pub password_reset_ttl_minutes: i64,
    pub uploads_dir: PathBuf,
    pub status_notifier: NotifierKind,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 20)?,
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_ttl_minutes: get_env_parse_or("JWT_TTL_MINUTES", 60)?,
            password_reset_ttl_minutes: get_env_parse_or("PASSWORD_RESET_TTL_MINUTES", 60)?,
            uploads_dir: env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./uploads")),
            status_notifier: parse_notifier(
                &env::var("STATUS_NOTIFIER").unwrap_or_else(|_| "noop".to_string()),
            )?,
        })
    }
}

fn parse_notifier(raw: &str) -> Result<NotifierKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "noop" | "" => Ok(NotifierKind::Noop),
        "log" => Ok(NotifierKind::Log),
        other => Err(Error::Config(format!(
            "Invalid value for STATUS_NOTIFIER: {} (expected noop or log)",
            other
        ))),
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifier_kind_parses_known_values() {
        assert_eq!(parse_notifier("noop").unwrap(), NotifierKind::Noop);
        assert_eq!(parse_notifier(" LOG ").unwrap(), NotifierKind::Log);
        assert!(parse_notifier("kafka").is_err());
    }
}
