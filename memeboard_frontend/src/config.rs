use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::api::DEFAULT_TIMEOUT;

pub const GATEWAY_URL_VAR: &str = "MEMEBOARD_GATEWAY_URL";
pub const TIMEOUT_VAR: &str = "MEMEBOARD_REQUEST_TIMEOUT_SECS";
pub const USER_NAME_VAR: &str = "MEMEBOARD_USER_NAME";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("There's no gateway URL defined. Set MEMEBOARD_GATEWAY_URL or pass --gateway-url.")]
    MissingGatewayUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub gateway_url: String,
    pub request_timeout: Duration,
    /// Name to identify as on startup, if already known.
    pub user_name: Option<String>,
}

impl BoardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let gateway_url = non_blank(lookup(GATEWAY_URL_VAR)).ok_or(ConfigError::MissingGatewayUrl)?;
        let request_timeout = lookup(TIMEOUT_VAR)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let user_name = non_blank(lookup(USER_NAME_VAR));
        Ok(Self {
            gateway_url,
            request_timeout,
            user_name,
        })
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_gateway_url_is_an_error() {
        assert_eq!(
            BoardConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingGatewayUrl)
        );
        assert_eq!(
            BoardConfig::from_lookup(lookup(&[(GATEWAY_URL_VAR, "   ")])),
            Err(ConfigError::MissingGatewayUrl)
        );
    }

    #[test]
    fn reads_all_values() {
        let config = BoardConfig::from_lookup(lookup(&[
            (GATEWAY_URL_VAR, "https://gw.example.com"),
            (TIMEOUT_VAR, "30"),
            (USER_NAME_VAR, " Ann "),
        ]))
        .unwrap();
        assert_eq!(config.gateway_url, "https://gw.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.user_name.as_deref(), Some("Ann"));
    }

    #[test]
    fn bad_timeout_falls_back_to_default() {
        let config = BoardConfig::from_lookup(lookup(&[
            (GATEWAY_URL_VAR, "gw.local"),
            (TIMEOUT_VAR, "soon"),
        ]))
        .unwrap();
        assert_eq!(config.request_timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.user_name, None);
    }
}
