use std::fmt;

use super::error::RestClientError;
use super::request::BuiltRequest;
use super::response::RawResponse;

/// Outcome of a [`ResponseValidator::validate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    valid: bool,
    message: String,
}

impl ValidationResult {
    /// The response is acceptable.
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    /// The response is not acceptable.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }

    /// Returns `true` if the response is acceptable.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Why the response is not acceptable.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Post-receive hook inspecting successful responses.
///
/// A failed validation does not fail the call by default: [`on_failure`](Self::on_failure)
/// is invoked and the decoded value is still returned, unless `on_failure` returns an error.
pub trait ResponseValidator: Send + Sync + fmt::Debug {
    /// Inspects a response.
    fn validate(&self, response: &RawResponse) -> ValidationResult;

    /// Called when [`validate`](Self::validate) reports an invalid response.
    ///
    /// # Errors
    ///
    /// Returning an error fails the call with it.
    fn on_failure(
        &self,
        _request: &BuiltRequest,
        _response: &RawResponse,
        _result: &ValidationResult,
    ) -> Result<(), RestClientError> {
        Ok(())
    }
}

/// Accepts every response.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ResponseValidator for AcceptAll {
    fn validate(&self, _response: &RawResponse) -> ValidationResult {
        ValidationResult::valid()
    }
}
