use std::future::Future;
use std::net::TcpListener;
use std::time::Duration;

use crate::RestClientBuilder;

/// Health of a server under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthStatus {
    /// The server answers.
    Healthy,
    /// The server is up but not ready yet.
    Unhealthy,
    /// The server has no health check, readiness is a successful TCP connection.
    #[default]
    Uncheckable,
}

/// A server that [`TestClient`](super::TestClient) can start and wait for.
///
/// # Example
///
/// ```rust
/// use restwire_core::test_client::{HealthStatus, TestServer};
/// use std::net::TcpListener;
///
/// #[derive(Debug)]
/// struct AppServer;
///
/// impl TestServer for AppServer {
///     async fn launch(&self, listener: TcpListener) {
///         listener.set_nonblocking(true).expect("non-blocking listener");
///         let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
///         let app = axum::Router::new().route("/health", axum::routing::get(|| async { "ok" }));
///         axum::serve(listener, app).await.expect("server runs");
///     }
///
///     async fn is_healthy(&self, _base_url: &str) -> HealthStatus {
///         HealthStatus::Uncheckable
///     }
/// }
/// ```
pub trait TestServer {
    /// Runs the server on `listener` until the task is aborted.
    fn launch(&self, listener: TcpListener) -> impl Future<Output = ()> + Send;

    /// Reports readiness, called with backoff until healthy.
    ///
    /// Defaults to [`HealthStatus::Uncheckable`].
    fn is_healthy(&self, _base_url: &str) -> impl Future<Output = HealthStatus> + Send {
        std::future::ready(HealthStatus::Uncheckable)
    }

    /// Harness settings.
    fn config(&self) -> TestServerConfig {
        TestServerConfig::default()
    }
}

/// Settings of the [`TestClient`](super::TestClient) harness.
#[derive(Debug, Clone)]
pub struct TestServerConfig {
    /// Template for the clients created by the harness. Its port is replaced by the server port.
    pub client_builder: Option<RestClientBuilder>,
    /// Delay before the first health retry.
    pub min_backoff_delay: Duration,
    /// Upper bound of health retry delays.
    pub max_backoff_delay: Duration,
    /// Randomizes health retry delays.
    pub backoff_jitter: bool,
    /// Health retries before giving up.
    pub max_retry_attempts: usize,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            client_builder: None,
            min_backoff_delay: Duration::from_millis(10),
            max_backoff_delay: Duration::from_secs(1),
            backoff_jitter: true,
            max_retry_attempts: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RestClient;

    #[derive(Debug)]
    struct Idle;

    impl TestServer for Idle {
        async fn launch(&self, _listener: TcpListener) {}
    }

    #[test]
    fn test_server_config_default() {
        let config = TestServerConfig::default();

        assert!(config.client_builder.is_none());
        assert_eq!(config.min_backoff_delay, Duration::from_millis(10));
        assert_eq!(config.max_retry_attempts, 10);
    }

    #[test]
    fn test_server_config_custom() {
        let config = TestServerConfig {
            client_builder: Some(RestClient::builder().with_host("localhost")),
            backoff_jitter: false,
            ..TestServerConfig::default()
        };

        assert!(config.client_builder.is_some());
        assert!(!config.backoff_jitter);
    }

    #[tokio::test]
    async fn test_default_health_is_uncheckable() {
        assert_eq!(Idle.is_healthy("http://127.0.0.1:1").await, HealthStatus::Uncheckable);
    }

    #[test]
    fn test_server_trait_bounds() {
        fn assert_test_server<T: TestServer + Send + Sync + 'static>(_: T) {}

        assert_test_server(Idle);
    }
}
