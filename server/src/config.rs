use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub api_base_url: String,
    /// Lifetime of session-scoped keys (suppression flags, unread totals).
    pub session_ttl_seconds: u64,
    /// Show an insert after every like, hint or not.
    pub enforce_like_ads: bool,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "8080"),
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379"),
            api_base_url: try_load("MATCH_API_URL", "http://127.0.0.1:8000/api/"),
            session_ttl_seconds: try_load("SESSION_TTL_SECONDS", "1800"),
            enforce_like_ads: try_load("ENFORCE_LIKE_ADS", "false"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
