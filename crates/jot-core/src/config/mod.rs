//! Client configuration for the RPC transport.
//!
//! Provides `ClientConfig`, the tunables shared by every client surface
//! (backend URL, timeouts, retry policy), and `SharedBaseUrl`, the runtime
//! handle that lets login repoint every component at a new backend.

use std::env;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transport::RetryPolicy;
use crate::util::{is_http_url, normalize_base_url, normalize_text_option};
use crate::{Error, Result};

pub const ENV_BASE_URL: &str = "JOT_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "JOT_REQUEST_TIMEOUT_MS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "JOT_CONNECT_TIMEOUT_MS";
pub const ENV_MAX_RETRIES: &str = "JOT_MAX_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "JOT_RETRY_DELAY_MS";

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Transport tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Backend base URL; procedure paths are appended to it.
    pub base_url: String,
    /// Whole-request timeout.
    pub request_timeout_ms: u64,
    /// TCP/TLS connect timeout.
    pub connect_timeout_ms: u64,
    /// Total attempts per call, including the first.
    pub max_retries: u32,
    /// Delay before the second attempt; doubles afterwards.
    pub retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by any `JOT_*` environment variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from a key lookup (environment, tests).
    ///
    /// Blank values are ignored; unparsable numbers are an error.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = normalize_text_option(lookup(ENV_BASE_URL)) {
            self.base_url = url;
        }
        if let Some(value) = parse_number(&lookup, ENV_REQUEST_TIMEOUT_MS)? {
            self.request_timeout_ms = value;
        }
        if let Some(value) = parse_number(&lookup, ENV_CONNECT_TIMEOUT_MS)? {
            self.connect_timeout_ms = value;
        }
        if let Some(value) = parse_number(&lookup, ENV_MAX_RETRIES)? {
            self.max_retries = value;
        }
        if let Some(value) = parse_number(&lookup, ENV_RETRY_DELAY_MS)? {
            self.retry_delay_ms = value;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_http_url(self.base_url.trim()) {
            return Err(Error::Config(
                "base_url must include http:// or https://".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(Error::Config("max_retries must be at least 1".to_string()));
        }
        if self.request_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(Error::Config("timeouts must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = normalize_text_option(lookup(key)) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}

/// Backend base URL shared by the transport and the login flow.
///
/// Cloning shares the same underlying value.
#[derive(Debug, Clone)]
pub struct SharedBaseUrl(Arc<RwLock<String>>);

impl SharedBaseUrl {
    pub fn new(url: &str) -> Result<Self> {
        let url = validated_base_url(url)?;
        Ok(Self(Arc::new(RwLock::new(url))))
    }

    /// Current base URL without a trailing slash.
    pub fn get(&self) -> String {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, url: &str) -> Result<()> {
        let url = validated_base_url(url)?;
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = url;
        Ok(())
    }
}

pub(crate) fn validated_base_url(url: &str) -> Result<String> {
    let url = normalize_base_url(url);
    if is_http_url(&url) {
        Ok(url)
    } else {
        Err(Error::Config(format!(
            "backend URL must include http:// or https://, got '{url}'"
        )))
    }
}
