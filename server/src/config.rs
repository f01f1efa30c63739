use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub store_url: String,
    pub store_key: String,
    pub redis_url: String,
    pub cors_origin: String,
    pub session_ttl_secs: u64,
    pub storage_bucket: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "5000"),
            store_url: try_load("STORE_URL", "http://127.0.0.1:54321"),
            store_key: read_secret("STORE_SERVICE_KEY"),
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379"),
            cors_origin: try_load("CORS_ORIGIN", "http://localhost:5173"),
            session_ttl_secs: try_load("SESSION_TTL_SECS", "86400"),
            storage_bucket: try_load("STORAGE_BUCKET", "complaints"),
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

fn read_secret(secret_name: &str) -> String {
    if let Ok(value) = env::var(secret_name) {
        return value;
    }

    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .expect("Secrets misconfigured!")
}
