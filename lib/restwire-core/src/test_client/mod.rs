//! Test harness running a server in-process and handing out clients pointed at it.
//!
//! - [`TestServer`]: what the harness needs from a server (launch, optional health check)
//! - [`TestClient<T>`]: owns the running server, builds [`RestClient`]s targeting it
//! - [`TestServerConfig`]: client template and health-check backoff
//! - [`TestAppError`]: failures while starting
//!
//! The server is stopped when the [`TestClient`] is dropped.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use restwire_core::test_client::{TestClient, TestServer};
//! use restwire_core::{ClientInterface, MethodDescriptor};
//! use std::net::TcpListener;
//!
//! #[derive(Debug)]
//! struct AppServer;
//!
//! impl TestServer for AppServer {
//!     async fn launch(&self, listener: TcpListener) {
//!         listener.set_nonblocking(true).expect("non-blocking listener");
//!         let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
//!         let app = axum::Router::new().route("/ping", axum::routing::get(|| async { "pong" }));
//!         axum::serve(listener, app).await.expect("server runs");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let test_client = TestClient::start(AppServer).await?;
//!     let client = test_client.client(
//!         ClientInterface::new("PingApi").method(MethodDescriptor::get("ping", "/ping")),
//!     )?;
//!
//!     // blocking calls belong on a blocking thread
//!     let pong = tokio::task::spawn_blocking(move || client.method("ping")?.call::<String>())
//!         .await??;
//!     assert_eq!(pong, "pong");
//!     Ok(())
//! }
//! ```

use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tokio::runtime::Handle;
use tracing::{debug, error};

use crate::{ClientInterface, RestClient, RestClientBuilder};

mod error;
pub use self::error::*;

mod test_server;
pub use self::test_server::*;

/// A running server under test.
///
/// Clients created with [`client`](Self::client) target the server port, and run their
/// asynchronous calls on the runtime that started the server.
#[derive(Debug)]
pub struct TestClient<T> {
    local_addr: SocketAddr,
    base_url: String,
    builder: RestClientBuilder,
    handle: Option<tokio::task::JoinHandle<()>>,
    #[allow(dead_code)]
    test_server: Arc<T>,
}

impl<T> TestClient<T>
where
    T: TestServer + Send + Sync + 'static,
{
    /// Starts the server on a random local port and waits until it is healthy.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound, or if the server does not become
    /// healthy within the configured backoff.
    pub async fn start(test_server: T) -> Result<Self, TestAppError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;

        let test_server = Arc::new(test_server);
        let handle = tokio::spawn({
            let server = Arc::clone(&test_server);
            async move {
                server.launch(listener).await;
            }
        });

        let TestServerConfig {
            client_builder,
            min_backoff_delay,
            max_backoff_delay,
            backoff_jitter,
            max_retry_attempts,
        } = test_server.config();

        let builder = client_builder
            .unwrap_or_else(RestClient::builder)
            .with_port(local_addr.port())
            .with_runtime(Handle::current());
        let base_url = format!("http://{local_addr}");

        let healthy = Self::wait_for_health(
            &test_server,
            &base_url,
            local_addr,
            min_backoff_delay,
            max_backoff_delay,
            backoff_jitter,
            max_retry_attempts,
        )
        .await;

        if !healthy {
            handle.abort();
            return Err(TestAppError::UnhealthyServer {
                timeout: max_backoff_delay,
            });
        }

        Ok(Self {
            local_addr,
            base_url,
            builder,
            handle: Some(handle),
            test_server,
        })
    }

    async fn wait_for_health(
        test_server: &Arc<T>,
        base_url: &str,
        local_addr: SocketAddr,
        min_backoff_delay: Duration,
        max_backoff_delay: Duration,
        backoff_jitter: bool,
        max_retry_attempts: usize,
    ) -> bool {
        let mut backoff = ExponentialBuilder::default()
            .with_min_delay(min_backoff_delay)
            .with_max_delay(max_backoff_delay)
            .with_max_times(max_retry_attempts);
        if backoff_jitter {
            backoff = backoff.with_jitter();
        }

        let health_check = || {
            let server = Arc::clone(test_server);
            async move {
                match server.is_healthy(base_url).await {
                    HealthStatus::Healthy => {
                        debug!("server healthy");
                        Ok(())
                    }
                    HealthStatus::Unhealthy => {
                        debug!("server not yet healthy, retrying");
                        Err(std::io::Error::new(
                            std::io::ErrorKind::ConnectionRefused,
                            "server not healthy yet",
                        ))
                    }
                    HealthStatus::Uncheckable => {
                        let connection = tokio::net::TcpStream::connect(local_addr).await;
                        if let Err(err) = &connection {
                            debug!(?err, %local_addr, "server not accepting connections yet");
                        }
                        connection.map(drop)
                    }
                }
            }
        };

        match health_check.retry(backoff).await {
            Ok(()) => true,
            Err(err) => {
                error!(?err, %local_addr, "server never became healthy");
                false
            }
        }
    }

    /// Builds a client for `interface`, pointed at the server.
    ///
    /// The harness template sets host, port and base path; an interface declaring its own
    /// base URL keeps it.
    ///
    /// # Errors
    ///
    /// Returns an error if the interface declaration is invalid.
    pub fn client(&self, interface: ClientInterface) -> Result<RestClient, TestAppError> {
        let client = self.builder.clone().build(interface)?;
        Ok(client)
    }

    /// `http://127.0.0.1:<port>`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The address the server listens on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl<T> Drop for TestClient<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
