//! Service configuration loaded from `APP_*` environment variables

use serde::Deserialize;

use crate::rate_limiter::RateLimiterConfig;

/// Origins allowed in production when none are configured
const PRODUCTION_ORIGINS: &[&str] = &["https://yourdomain.com"];
/// Origins allowed outside production when none are configured
const DEVELOPMENT_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:3001"];

/// HTTP service settings
///
/// # Environment Variables
/// - `APP_HOST`: bind address (default: "0.0.0.0")
/// - `APP_PORT`: listen port (default: 3000)
/// - `APP_ENVIRONMENT`: deployment environment (default: "development")
/// - `APP_CORS_ORIGINS`: comma separated origin allow-list
/// - `APP_RATE_LIMIT_MAX_REQUESTS`: requests per window and IP (default: 100)
/// - `APP_RATE_LIMIT_WINDOW_SECS`: window length (default: 900)
/// - `APP_BODY_LIMIT_BYTES`: maximum JSON body size (default: 10 MiB)
/// - `APP_TRUST_PROXY`: key the rate limiter on proxy headers (default: false)
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub cors_origins: Option<String>,
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
    /// Only enable behind a reverse proxy that overwrites `X-Forwarded-For`
    #[serde(default)]
    pub trust_proxy: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_rate_limit_max_requests() -> u32 {
    100
}

fn default_rate_limit_window_secs() -> u64 {
    15 * 60
}

fn default_body_limit_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            cors_origins: None,
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            body_limit_bytes: default_body_limit_bytes(),
            trust_proxy: false,
        }
    }
}

impl Settings {
    /// Load settings from `APP_*` environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("APP").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Whether the service runs in production
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Socket address to bind, e.g. `0.0.0.0:3000`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// CORS allow-list: configured origins, or the environment defaults
    pub fn allowed_origins(&self) -> Vec<String> {
        let configured: Vec<String> = self
            .cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        if !configured.is_empty() {
            return configured;
        }

        let defaults = if self.is_production() {
            PRODUCTION_ORIGINS
        } else {
            DEVELOPMENT_ORIGINS
        };
        defaults.iter().map(|origin| origin.to_string()).collect()
    }

    /// Rate limiter configuration derived from these settings
    pub fn rate_limiter(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_requests: self.rate_limit_max_requests,
            window_seconds: self.rate_limit_window_secs,
        }
    }
}
