//! Error types for the test client harness.

use std::time::Duration;

use crate::RestClientError;

/// Errors raised while starting a server under test or creating clients for it.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum TestAppError {
    /// Binding or inspecting the listener failed.
    #[display("I/O error: {_0}")]
    IoError(std::io::Error),

    /// A client could not be built.
    #[display("REST client error: {_0}")]
    ClientError(RestClientError),

    /// The server never reported healthy.
    #[from(ignore)]
    #[display("Server failed to become healthy within {timeout:?}")]
    UnhealthyServer {
        /// The maximum backoff delay that was configured.
        timeout: Duration,
    },
}
