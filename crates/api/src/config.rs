//! Environment-driven service configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use aurora_triage::DEFAULT_TOP_K;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_CLASSIFIER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub classifier_url: String,
    pub classifier_timeout: Duration,
    /// Catalog CSV loaded at startup; `None` starts with an empty catalog.
    pub catalog_csv: Option<PathBuf>,
    /// Directory for uploaded image bytes; `None` keeps them in memory.
    pub upload_dir: Option<PathBuf>,
    pub default_top_k: usize,
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            classifier_url: DEFAULT_CLASSIFIER_URL.to_string(),
            classifier_timeout: Duration::from_secs(DEFAULT_CLASSIFIER_TIMEOUT_SECS),
            catalog_csv: None,
            upload_dir: None,
            default_top_k: DEFAULT_TOP_K,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank variables take
    /// their defaults; malformed ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let bind_addr = match get("AURORA_BIND_ADDR") {
            Some(raw) => parse("AURORA_BIND_ADDR", &raw)?,
            None => defaults.bind_addr,
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            defaults.jwt_secret
        });

        let classifier_url = get("AURORA_CLASSIFIER_URL").unwrap_or(defaults.classifier_url);
        if !(classifier_url.starts_with("http://") || classifier_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "AURORA_CLASSIFIER_URL",
                reason: format!("expected an http(s) URL, got {classifier_url:?}"),
            });
        }

        let classifier_timeout = match get("AURORA_CLASSIFIER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = parse("AURORA_CLASSIFIER_TIMEOUT_SECS", &raw)?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        var: "AURORA_CLASSIFIER_TIMEOUT_SECS",
                        reason: "must be at least 1".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => defaults.classifier_timeout,
        };

        let default_top_k = match get("AURORA_DEFAULT_TOP_K") {
            Some(raw) => parse("AURORA_DEFAULT_TOP_K", &raw)?,
            None => defaults.default_top_k,
        };

        let max_upload_bytes = match get("AURORA_MAX_UPLOAD_BYTES") {
            Some(raw) => parse("AURORA_MAX_UPLOAD_BYTES", &raw)?,
            None => defaults.max_upload_bytes,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            classifier_url,
            classifier_timeout,
            catalog_csv: get("AURORA_CATALOG_CSV").map(PathBuf::from),
            upload_dir: get("AURORA_UPLOAD_DIR").map(PathBuf::from),
            default_top_k,
            max_upload_bytes,
        })
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: format!("{e} (got {raw:?})"),
    })
}
