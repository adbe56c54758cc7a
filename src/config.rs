use std::{env, time::Duration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_API_URL: &str = "http://localhost:8081";
const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    /// Base URL of the platform API, without trailing slash.
    pub api_url: String,
    pub api_token: Option<String>,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ServiceConfig {
    /// Reads `PORT`, `LQASIM_API_URL`, `LQASIM_API_TOKEN`,
    /// `LQASIM_CACHE_TTL_SECS` and `LQASIM_REQUEST_TIMEOUT_SECS`.
    /// Unset or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secs = |key: &str| non_empty(key).and_then(|v| v.parse::<u64>().ok()).map(Duration::from_secs);

        Self {
            port: non_empty("PORT")
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            api_url: non_empty("LQASIM_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            api_token: non_empty("LQASIM_API_TOKEN"),
            cache_ttl: secs("LQASIM_CACHE_TTL_SECS").unwrap_or(defaults.cache_ttl),
            request_timeout: secs("LQASIM_REQUEST_TIMEOUT_SECS").unwrap_or(defaults.request_timeout),
        }
    }
}
