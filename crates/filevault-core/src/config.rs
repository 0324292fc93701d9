//! Configuration module
//!
//! Client-side settings: backend address, credential location, request timeout,
//! retry budget and the display windows used by the application layer.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_NOTIFICATION_TTL_MS, DEFAULT_PAGE_LIMIT, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_TRANSPORT_RETRIES, DEFAULT_UPLOAD_SUCCESS_MS, MAX_PAGE_LIMIT,
};

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub credentials_path: PathBuf,
    pub request_timeout_secs: u64,
    /// Extra attempts after a transport failure on idempotent requests.
    pub transport_retries: u32,
    pub notification_ttl_ms: u64,
    pub upload_success_ms: u64,
    pub page_limit: u32,
    /// Keep error notifications until acknowledged instead of auto-dismissing them.
    pub errors_require_ack: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            credentials_path: default_credentials_path(None),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            transport_retries: DEFAULT_TRANSPORT_RETRIES,
            notification_ttl_ms: DEFAULT_NOTIFICATION_TTL_MS,
            upload_success_ms: DEFAULT_UPLOAD_SUCCESS_MS,
            page_limit: DEFAULT_PAGE_LIMIT,
            errors_require_ack: false,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = var("FILEVAULT_API_URL")
            .or_else(|| var("API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_base_url = api_base_url.trim().trim_end_matches('/').to_string();
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "FILEVAULT_API_URL must be an http(s) URL, got '{}'",
                api_base_url
            ));
        }

        let credentials_path = var("FILEVAULT_CREDENTIALS_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_credentials_path(var("HOME")));

        let page_limit = var("FILEVAULT_PAGE_LIMIT")
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|l| (1..=MAX_PAGE_LIMIT).contains(l))
            .unwrap_or(DEFAULT_PAGE_LIMIT);

        Ok(Self {
            api_base_url,
            credentials_path,
            request_timeout_secs: var("FILEVAULT_REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            transport_retries: var("FILEVAULT_TRANSPORT_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TRANSPORT_RETRIES),
            notification_ttl_ms: var("FILEVAULT_NOTIFICATION_TTL_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_NOTIFICATION_TTL_MS),
            upload_success_ms: var("FILEVAULT_UPLOAD_SUCCESS_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_UPLOAD_SUCCESS_MS),
            page_limit,
            errors_require_ack: var("FILEVAULT_ERRORS_REQUIRE_ACK")
                .map(|s| s.trim().to_lowercase())
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    pub fn upload_success_window(&self) -> Duration {
        Duration::from_millis(self.upload_success_ms)
    }
}

fn default_credentials_path(home: Option<String>) -> PathBuf {
    let base = home
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(".filevault").join("credentials.json")
}
