//! Runtime configuration from the environment (and `.env`).

use crate::error::SyncError;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// First retry pause, doubled on every further attempt.
pub const SLEEP_MSEC: u64 = 1000;
/// Page size asked for on paginated listings.
pub const PER_PAGE: u32 = 1000;
pub const EXPORT_DIR: &str = "output/exports";

pub const OAUTH_AUTHORIZE_URL: &str = "https://as.meraki.com/oauth/authorize";
pub const OAUTH_TOKEN_URL: &str = "https://as.meraki.com/oauth/token";
pub const OAUTH_SCOPE: &str = "sdwan:config:read sdwan:config:write";
pub const DEFAULT_REDIRECT_URI: &str = "https://127.0.0.1:8443/oauth_callback";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_retries: u32,
    pub timeout: Duration,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
}

impl Config {
    /// Read `MERAKI_*` variables from the process environment.
    pub fn from_env() -> Result<Config, SyncError> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, SyncError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let max_retries = match get("MERAKI_MAX_RETRIES") {
            Some(v) => v
                .parse::<u32>()
                .map_err(|_| SyncError::Config(format!("MERAKI_MAX_RETRIES='{v}' is not a number")))?,
            None => DEFAULT_MAX_RETRIES,
        };
        let timeout_secs = match get("MERAKI_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|_| SyncError::Config(format!("MERAKI_TIMEOUT_SECS='{v}' is not a number")))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Config {
            api_key: get("MERAKI_API_KEY"),
            base_url: get("MERAKI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            max_retries,
            timeout: Duration::from_secs(timeout_secs),
            client_id: get("MERAKI_CLIENT_ID"),
            client_secret: get("MERAKI_CLIENT_SECRET"),
            redirect_uri: get("MERAKI_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.redirect_uri, DEFAULT_REDIRECT_URI);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("MERAKI_API_KEY", " abc123 "),
            ("MERAKI_BASE_URL", "https://api.meraki.ca/api/v1/"),
            ("MERAKI_MAX_RETRIES", "0"),
            ("MERAKI_CLIENT_ID", ""),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.base_url, "https://api.meraki.ca/api/v1");
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.client_id, None);
    }

    #[test]
    fn test_bad_number() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("MERAKI_MAX_RETRIES", "lots")])),
            Err(SyncError::Config(_))
        ));
    }
}
