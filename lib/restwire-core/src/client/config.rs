use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::RestClientError;
use super::retry::{Backoff, RetryPolicy};

/// Externalized client settings.
///
/// Keys are kebab-case, every section is optional:
///
/// ```yaml
/// base-urls:
///   users-api: http://users.internal:8080
/// retry:
///   max-attempts: 3
///   delay-ms: 200
///   backoff: exponential
/// timeout-ms: 5000
/// ```
///
/// ```rust
/// use restwire_core::ClientConfig;
///
/// let config = ClientConfig::from_json_str(
///     r#"{ "base-urls": { "users-api": "http://users.internal" }, "retry": { "max-attempts": 2 } }"#,
/// )?;
/// assert_eq!(config.base_url("users-api"), Some("http://users.internal"));
/// assert_eq!(config.retry_policy().map(|policy| policy.max_attempts()), Some(2));
/// # Ok::<(), restwire_core::RestClientError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientConfig {
    /// Base URLs by interface property key.
    pub base_urls: IndexMap<String, String>,
    /// Default retry of methods declaring none.
    pub retry: Option<RetryConfig>,
    /// Per-request timeout, in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// The `retry` section of a [`ClientConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryConfig {
    /// Total attempts, first one included.
    pub max_attempts: usize,
    /// Initial delay between attempts, in milliseconds.
    pub delay_ms: u64,
    /// Delay growth.
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay_ms: 0,
            backoff: Backoff::Fixed,
        }
    }
}

impl ClientConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns a [`RestClientError::Config`] if the document is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self, RestClientError> {
        let deserializer = &mut serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(deserializer).map_err(|err| RestClientError::Config {
            message: format!("at '{}': {}", err.path(), err.inner()),
        })
    }

    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns a [`RestClientError::Config`] if the document is not a valid configuration.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RestClientError> {
        serde_saphyr::from_str(yaml).map_err(|err| RestClientError::Config {
            message: err.to_string(),
        })
    }

    /// The base URL configured for `key`.
    pub fn base_url(&self, key: &str) -> Option<&str> {
        self.base_urls.get(key).map(String::as_str)
    }

    /// The configured default retry policy.
    pub fn retry_policy(&self) -> Option<RetryPolicy> {
        self.retry.map(|retry| {
            RetryPolicy::new(
                retry.max_attempts,
                Duration::from_millis(retry.delay_ms),
                retry.backoff,
            )
        })
    }

    /// The configured request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_full_json() {
        let config = ClientConfig::from_json_str(
            r#"{
                "base-urls": { "users": "http://users.test", "orders": "http://orders.test" },
                "retry": { "max-attempts": 3, "delay-ms": 250, "backoff": "exponential" },
                "timeout-ms": 1500
            }"#,
        )
        .expect("valid configuration");

        assert_eq!(config.base_url("orders"), Some("http://orders.test"));
        assert_eq!(config.base_url("missing"), None);
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
        let policy = config.retry_policy().expect("retry section");
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.initial_delay(), Duration::from_millis(250));
        assert_eq!(policy.backoff(), Backoff::Exponential);
    }

    #[test]
    fn should_default_missing_sections() {
        let config = ClientConfig::from_json_str("{}").expect("empty is valid");

        assert_eq!(config, ClientConfig::default());
        assert!(config.retry_policy().is_none());
    }

    #[test]
    fn should_report_error_path() {
        let error = ClientConfig::from_json_str(r#"{ "retry": { "backoff": "linear" } }"#)
            .expect_err("unknown backoff");

        let message = error.to_string();
        assert!(message.starts_with("Invalid configuration: at 'retry.backoff': unknown variant `linear`"));
        assert!(matches!(error, RestClientError::Config { .. }));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn should_parse_yaml() {
        let config = ClientConfig::from_yaml_str(
            "base-urls:\n  users: http://users.test\nretry:\n  max-attempts: 2\n  delay-ms: 10\n",
        )
        .expect("valid yaml");

        assert_eq!(config.base_url("users"), Some("http://users.test"));
        assert_eq!(
            config.retry_policy().map(|policy| policy.max_attempts()),
            Some(2)
        );
    }
}
