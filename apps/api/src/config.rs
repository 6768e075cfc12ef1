use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::auth::password::Argon2Params;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub upload_dir: PathBuf,
    pub session_cookie: String,
    pub session_ttl_secs: u64,
    /// Adds `Secure` to the session cookie. Enable behind HTTPS.
    pub session_cookie_secure: bool,
    /// When false, `POST /register` refuses a self-assigned admin role.
    pub allow_admin_signup: bool,
    pub max_upload_bytes: usize,
    pub password_hashing: Argon2Params,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            upload_dir: PathBuf::from(
                std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            ),
            session_cookie: std::env::var("SESSION_COOKIE")
                .unwrap_or_else(|_| "placement_session".to_string()),
            session_ttl_secs: parse_env("SESSION_TTL_SECS", 86_400)?,
            session_cookie_secure: parse_env("SESSION_COOKIE_SECURE", false)?,
            allow_admin_signup: parse_env("ALLOW_ADMIN_SIGNUP", true)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            password_hashing: Argon2Params::default(),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration for in-process tests: cheap hashing, throwaway upload dir.
    pub fn for_tests(upload_dir: PathBuf) -> Self {
        Config {
            database_url: "postgres://unused".to_string(),
            redis_url: "redis://unused".to_string(),
            upload_dir,
            session_cookie: "placement_session".to_string(),
            session_ttl_secs: 3600,
            session_cookie_secure: false,
            allow_admin_signup: true,
            max_upload_bytes: 1024 * 1024,
            password_hashing: Argon2Params {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: u64 = parse_env("PLACEMENT_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("PLACEMENT_TEST_BAD_PORT", "not-a-port");
        let result: Result<u16> = parse_env("PLACEMENT_TEST_BAD_PORT", 8080);
        assert!(result.is_err());
        std::env::remove_var("PLACEMENT_TEST_BAD_PORT");
    }

    #[test]
    fn test_parse_env_reads_bool() {
        std::env::set_var("PLACEMENT_TEST_FLAG", "false");
        let flag: bool = parse_env("PLACEMENT_TEST_FLAG", true).unwrap();
        assert!(!flag);
        std::env::remove_var("PLACEMENT_TEST_FLAG");
    }
}
