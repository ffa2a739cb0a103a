use std::time::Duration;

use anyhow::{Context, Result};

use crate::facades::readiness::{DEFAULT_POLL_INTERVAL, DEFAULT_READY_TIMEOUT};
use crate::facades::ReadinessConfig;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    /// Account the platform auth backend signs in as.
    pub account_username: String,
    pub account_email: Option<String>,
    pub kv_namespace: String,
    pub readiness: ReadinessConfig,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            account_username: require_env("ACCOUNT_USERNAME")?,
            account_email: std::env::var("ACCOUNT_EMAIL").ok(),
            kv_namespace: std::env::var("KV_NAMESPACE")
                .unwrap_or_else(|_| "resume-review".to_string()),
            readiness: ReadinessConfig {
                poll_interval: positive_millis(
                    "READY_POLL_INTERVAL_MS",
                    millis_env("READY_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL)?,
                )?,
                timeout: millis_env("READY_TIMEOUT_MS", DEFAULT_READY_TIMEOUT)?,
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn millis_env(key: &str, default: Duration) -> Result<Duration> {
    match std::env::var(key) {
        Ok(raw) => parse_millis(&raw).with_context(|| format!("{key} must be a whole number of milliseconds")),
        Err(_) => Ok(default),
    }
}

fn positive_millis(key: &str, value: Duration) -> Result<Duration> {
    if value.is_zero() {
        anyhow::bail!("{key} must be greater than zero");
    }
    Ok(value)
}

fn parse_millis(raw: &str) -> Result<Duration> {
    Ok(Duration::from_millis(raw.trim().parse::<u64>()?))
}
