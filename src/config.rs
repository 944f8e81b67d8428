//! Client configuration read from `MEDLENS_*` environment variables.

use std::time::Duration;

use crate::application::DEFAULT_SETTLE_DELAY;
use crate::{MedlensError, Result};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin of the imaging service.
    pub api_base: String,
    pub request_timeout: Duration,
    /// Zero issues a search on every keystroke past the length gate.
    pub search_debounce: Duration,
    /// How long a successful result stays hidden behind a full progress bar.
    pub settle_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl ClientConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    /// Returns `MedlensError::Config` for unparsable values.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `MedlensError::Config` for unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let api_base = match get("MEDLENS_API_BASE") {
            Some(raw) => {
                let url = reqwest::Url::parse(&raw).map_err(|e| {
                    MedlensError::Config(format!("MEDLENS_API_BASE is not a valid URL: {e}"))
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(MedlensError::Config(format!(
                        "MEDLENS_API_BASE must use http or https, got {}",
                        url.scheme()
                    )));
                }
                raw
            }
            None => defaults.api_base,
        };

        let request_timeout = match get("MEDLENS_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match parse_u64("MEDLENS_REQUEST_TIMEOUT_SECS", &raw)? {
                0 => {
                    return Err(MedlensError::Config(
                        "MEDLENS_REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
                    ))
                }
                secs => Duration::from_secs(secs),
            },
            None => defaults.request_timeout,
        };

        let search_debounce = get("MEDLENS_SEARCH_DEBOUNCE_MS")
            .map(|raw| parse_u64("MEDLENS_SEARCH_DEBOUNCE_MS", &raw).map(Duration::from_millis))
            .transpose()?
            .unwrap_or(defaults.search_debounce);

        let settle_delay = get("MEDLENS_SETTLE_DELAY_MS")
            .map(|raw| parse_u64("MEDLENS_SETTLE_DELAY_MS", &raw).map(Duration::from_millis))
            .transpose()?
            .unwrap_or(defaults.settle_delay);

        Ok(Self {
            api_base,
            request_timeout,
            search_debounce,
            settle_delay,
        })
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|e| MedlensError::Config(format!("{key}={raw:?} is not a non-negative integer: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.search_debounce, Duration::from_millis(250));
        assert_eq!(config.settle_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("MEDLENS_API_BASE", "https://imaging.example.org/api"),
            ("MEDLENS_REQUEST_TIMEOUT_SECS", "5"),
            ("MEDLENS_SEARCH_DEBOUNCE_MS", "0"),
            ("MEDLENS_SETTLE_DELAY_MS", " 750 "),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "https://imaging.example.org/api");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.search_debounce.is_zero());
        assert_eq!(config.settle_delay, Duration::from_millis(750));
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[("MEDLENS_API_BASE", "  ")])).unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for pairs in [
            [("MEDLENS_API_BASE", "not a url")],
            [("MEDLENS_API_BASE", "ftp://example.org")],
            [("MEDLENS_REQUEST_TIMEOUT_SECS", "0")],
            [("MEDLENS_REQUEST_TIMEOUT_SECS", "-1")],
            [("MEDLENS_SEARCH_DEBOUNCE_MS", "fast")],
        ] {
            let err = ClientConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, MedlensError::Config(_)), "{pairs:?}");
        }
    }
}
