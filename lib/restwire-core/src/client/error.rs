use std::fmt::Debug;

use super::auth::AuthenticationError;

/// Errors that can occur when building or calling a [`RestClient`](super::RestClient).
///
/// Variants fall into four groups:
/// - construction problems ([`Binding`](Self::Binding), [`Config`](Self::Config)), raised once by
///   [`RestClientBuilder::build`](super::RestClientBuilder::build),
/// - call contract problems ([`AsyncContract`](Self::AsyncContract), [`UnknownMethod`](Self::UnknownMethod)),
///   raised before any network I/O,
/// - [`Transport`](Self::Transport) failures, the only ones the default retry predicate retries,
/// - encode/decode problems, which are fatal for the call.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum RestClientError {
    /// The transport failed to deliver the request or returned an unexpected status.
    #[display("Transport error: {_0}")]
    Transport(TransportError),

    /// Query pairs could not be encoded.
    QuerySerializationError(serde_urlencoded::ser::Error),

    /// The authentication capability could not produce its header.
    #[display("Authentication error: {_0}")]
    Authentication(AuthenticationError),

    /// An interface or method declaration is incomplete or malformed.
    #[display("Invalid declaration for '{interface}::{method}': {message}")]
    #[from(skip)]
    Binding {
        /// The interface name.
        interface: String,
        /// The method name, empty for interface-level problems.
        method: String,
        /// What is wrong with the declaration.
        message: String,
    },

    /// An async method was called in a way that breaks its contract.
    #[display("Async contract violated by '{method}': {message}")]
    #[from(skip)]
    AsyncContract {
        /// The method name.
        method: String,
        /// What is wrong with the call.
        message: String,
    },

    /// The method is not declared on the interface.
    #[display("Unknown method '{method}' on interface '{interface}'")]
    #[from(skip)]
    UnknownMethod {
        /// The interface name.
        interface: String,
        /// The requested method name.
        method: String,
    },

    /// Client configuration is invalid.
    #[display("Invalid configuration: {message}")]
    #[from(skip)]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// Response deserialization failure.
    ///
    /// Occurs when the response body cannot be decoded into the expected type.
    #[display("Failed to deserialize response at '{path}': {error}\n{body}")]
    #[from(skip)]
    Deserialization {
        /// The path inside the payload where decoding failed.
        path: String,
        /// The underlying parsing error.
        error: serde_json::Error,
        /// The response body that failed to decode.
        body: String,
    },

    /// Data serialization failed.
    ///
    /// Occurs when request data cannot be converted to the required format.
    #[display("Serialization error: {message}")]
    #[from(skip)]
    SerializationError {
        /// Description of the serialization failure.
        message: String,
    },

    /// Parameter value cannot be converted to the required format.
    #[display("Unsupported parameter value: {message}. Got: {value}")]
    #[from(skip)]
    UnsupportedParameterValue {
        /// Specific error message describing the conversion failure.
        message: String,
        /// The value that failed to convert.
        value: serde_json::Value,
    },

    /// A validator failure hook rejected the response.
    #[display("Validation failed: {message}")]
    #[from(skip)]
    Validation {
        /// The validator message.
        message: String,
    },
}

impl RestClientError {
    /// Returns `true` for transport failures that may succeed on another attempt.
    pub fn is_retryable_transport(&self) -> bool {
        matches!(self, Self::Transport(error) if error.is_retryable())
    }

    pub(crate) fn binding(
        interface: impl Into<String>,
        method: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Binding {
            interface: interface.into(),
            method: method.into(),
            message: message.into(),
        }
    }

    pub(crate) fn async_contract(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AsyncContract {
            method: method.into(),
            message: message.into(),
        }
    }
}

/// Failures surfaced by a [`Transport`](super::Transport).
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum TransportError {
    /// HTTP client error from the underlying reqwest library.
    ///
    /// Occurs when network requests fail, timeouts occur, or connection issues arise.
    #[display("HTTP request failed: {_0}")]
    Request(reqwest::Error),

    /// Server returned an unexpected HTTP status code.
    #[display("Unexpected status code {status_code}: {body}")]
    #[from(skip)]
    UnexpectedStatusCode {
        /// The unexpected HTTP status code received.
        status_code: u16,
        /// The response body for debugging.
        body: String,
    },

    /// The built request cannot be expressed on the wire.
    ///
    /// Never retried: the same request would fail the same way.
    #[display("Invalid request: {message}")]
    #[from(skip)]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },

    /// Any other failure reported by a custom transport.
    #[display("Transport failure: {message}")]
    #[from(skip)]
    Other {
        /// Description of the failure.
        message: String,
    },
}

impl TransportError {
    /// Returns `true` when another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidRequest { .. })
    }

    /// Creates an [`Other`](Self::Other) error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }
}
