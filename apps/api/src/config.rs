use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables once at startup.
/// Connection strings are never reloaded while the process runs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres URL for the resume collection. In-memory store when unset.
    pub database_url: Option<String>,
    /// Redis URL for session state. In-memory sessions when unset.
    pub redis_url: Option<String>,
    /// Enables LLM-backed extraction when set.
    pub anthropic_api_key: Option<String>,
    /// Scratch directory for uploaded documents while they are parsed.
    pub upload_dir: PathBuf,
    pub session_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            redis_url: optional_env("REDIS_URL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            upload_dir: optional_env("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("resume_uploads")),
            session_ttl_secs: parse_env("SESSION_TTL_SECS", 86_400)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
