use std::net::IpAddr;
use std::time::Duration;

use crate::queue::QueueConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub store: StoreBackend,
    pub queue: QueueConfig,
    pub janitor_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env_required("JWT_SECRET")?;

        let store = match env_or("WORKREPORT_STORE", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => return Err(format!("Invalid WORKREPORT_STORE: {other}")),
        };

        let database_url = match store {
            StoreBackend::Postgres => Some(env_required("DATABASE_URL")?),
            StoreBackend::Memory => std::env::var("DATABASE_URL").ok(),
        };

        let host: IpAddr = env_or("WORKREPORT_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid WORKREPORT_HOST: {e}"))?;

        let port: u16 = env_parse("WORKREPORT_PORT", 3000)?;

        let log_level = env_or("WORKREPORT_LOG_LEVEL", "info");

        let defaults = QueueConfig::default();
        let queue = QueueConfig {
            max_retries: env_parse("WORKREPORT_MAX_RETRIES", defaults.max_retries)?,
            backoff_base: Duration::from_millis(env_parse(
                "WORKREPORT_BACKOFF_BASE_MS",
                defaults.backoff_base.as_millis() as u64,
            )?),
            history_max_age: Duration::from_secs(env_parse(
                "WORKREPORT_HISTORY_MAX_AGE_SECS",
                defaults.history_max_age.as_secs(),
            )?),
            history_max_items: env_parse(
                "WORKREPORT_HISTORY_MAX_ITEMS",
                defaults.history_max_items,
            )?,
            store_timeout: Duration::from_secs(env_parse(
                "WORKREPORT_STORE_TIMEOUT_SECS",
                defaults.store_timeout.as_secs(),
            )?),
            ..defaults
        };

        if queue.max_retries == 0 {
            return Err("Invalid WORKREPORT_MAX_RETRIES: must be at least 1".to_string());
        }

        let janitor_interval =
            Duration::from_secs(env_parse("WORKREPORT_JANITOR_INTERVAL_SECS", 60u64)?.max(1));

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            log_level,
            store,
            queue,
            janitor_interval,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|e| format!("Invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}
