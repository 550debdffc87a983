use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use quill_client::ClientConfig;
use quill_client::http::DEFAULT_BASE_URL;

const SESSION_FILE: &str = "quill.db";

/// Runtime settings, read from the environment (after `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
    pub idle_timeout: Duration,
    pub demo_fallback: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let request_timeout = parse_or(var("QUILL_REQUEST_TIMEOUT_SECS"), "QUILL_REQUEST_TIMEOUT_SECS", 30)?;
        let idle_timeout = parse_or(var("QUILL_IDLE_TIMEOUT_SECS"), "QUILL_IDLE_TIMEOUT_SECS", 600)?;
        let demo_fallback = match var("QUILL_DEMO_FALLBACK") {
            Some(raw) => parse_flag(&raw).context("QUILL_DEMO_FALLBACK")?,
            None => true,
        };

        Ok(Self {
            api_url: var("QUILL_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            data_dir: var("QUILL_DATA_DIR").map_or_else(|| PathBuf::from(".quill"), PathBuf::from),
            request_timeout: Duration::from_secs(request_timeout),
            idle_timeout: Duration::from_secs(idle_timeout),
            demo_fallback,
        })
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            timeout: self.request_timeout,
            ..ClientConfig::default()
        }
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {} '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("expected true or false, got '{}'", other)),
    }
}
