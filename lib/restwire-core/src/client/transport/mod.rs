//! The wire-level capability sending [`BuiltRequest`]s.
//!
//! [`ReqwestTransport`] is the default. Custom transports (mocks, other HTTP stacks)
//! implement [`Transport`] and are handed to
//! [`RestClientBuilder::with_transport`](crate::RestClientBuilder::with_transport).

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use super::error::TransportError;
use super::request::BuiltRequest;
use super::response::RawResponse;

mod reqwest_transport;
pub use self::reqwest_transport::ReqwestTransport;

mod status;
pub use self::status::ExpectedStatusCodes;

/// Future returned by [`Transport::send_async`].
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send>>;

/// Sends requests over the wire.
///
/// Implementations must report network failures and unexpected statuses as [`TransportError`]s
/// so retry policies can classify them. Timeouts, if any, are the transport's business.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends a request, blocking the calling thread until the response is received.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the exchange fails or the status is not expected.
    fn send(&self, request: &BuiltRequest) -> Result<RawResponse, TransportError>;

    /// Sends a request without blocking.
    fn send_async(&self, request: BuiltRequest) -> TransportFuture;
}

const BODY_MAX_LENGTH: usize = 1024;

/// Shortens an error body for messages.
pub(crate) fn truncate_body(text: String) -> String {
    if text.len() <= BODY_MAX_LENGTH {
        return text;
    }
    let end = (0..=BODY_MAX_LENGTH)
        .rev()
        .find(|index| text.is_char_boundary(*index))
        .unwrap_or_default();
    format!("{}... (truncated)", text.get(..end).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_bodies() {
        assert_eq!(truncate_body("oops".to_string()), "oops");
    }

    #[test]
    fn test_truncate_long_bodies_on_char_boundary() {
        let text = "é".repeat(BODY_MAX_LENGTH);

        let result = truncate_body(text);

        assert!(result.ends_with("... (truncated)"));
        assert_eq!(result.len(), BODY_MAX_LENGTH + "... (truncated)".len());
    }
}
