use std::ops::RangeInclusive;

use http::StatusCode;

/// Status codes a transport reports as success.
///
/// Anything else becomes a [`TransportError::UnexpectedStatusCode`](crate::TransportError::UnexpectedStatusCode),
/// which the default retry predicate retries.
///
/// ```rust
/// use restwire_core::ExpectedStatusCodes;
/// use http::StatusCode;
///
/// let codes = ExpectedStatusCodes::default().add_status(StatusCode::NOT_MODIFIED);
/// assert!(codes.contains(204));
/// assert!(codes.contains(304));
/// assert!(!codes.contains(404));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedStatusCodes {
    ranges: Vec<RangeInclusive<u16>>,
}

impl ExpectedStatusCodes {
    /// Only the given status.
    pub fn from_status(status: StatusCode) -> Self {
        let code = status.as_u16();
        Self {
            ranges: vec![code..=code],
        }
    }

    /// Only the given range of statuses.
    pub fn from_range(range: RangeInclusive<StatusCode>) -> Self {
        Self {
            ranges: vec![range.start().as_u16()..=range.end().as_u16()],
        }
    }

    /// Also accepts `status`.
    #[must_use]
    pub fn add_status(mut self, status: StatusCode) -> Self {
        let code = status.as_u16();
        self.ranges.push(code..=code);
        self
    }

    /// Also accepts the statuses of `range`.
    #[must_use]
    pub fn add_range(mut self, range: RangeInclusive<StatusCode>) -> Self {
        self.ranges
            .push(range.start().as_u16()..=range.end().as_u16());
        self
    }

    /// Checks if a status code is expected.
    pub fn contains(&self, status: u16) -> bool {
        self.ranges.iter().any(|range| range.contains(&status))
    }
}

impl Default for ExpectedStatusCodes {
    /// Every `2xx` status.
    fn default() -> Self {
        Self {
            ranges: vec![200..=299],
        }
    }
}
