use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::RestClientError;

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backoff {
    /// Every retry waits the initial delay.
    #[default]
    Fixed,
    /// The k-th retry waits `initial_delay * 2^(k-1)`.
    Exponential,
}

type RetryPredicate = Arc<dyn Fn(&RestClientError) -> bool + Send + Sync>;

/// How many times a call is attempted and how long to wait in between.
///
/// The same policy drives sync calls (the caller thread sleeps) and async calls
/// (the next attempt is scheduled on the runtime).
///
/// ```rust
/// use std::time::Duration;
/// use restwire_core::RetryPolicy;
///
/// let policy = RetryPolicy::exponential(4, Duration::from_millis(100));
/// let delays = policy.delays().collect::<Vec<_>>();
/// assert_eq!(
///     delays,
///     [
///         Duration::from_millis(100),
///         Duration::from_millis(200),
///         Duration::from_millis(400),
///     ]
/// );
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    initial_delay: Duration,
    backoff: Backoff,
    retryable: RetryPredicate,
}

impl RetryPolicy {
    /// A single attempt, no retry.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Backoff::Fixed)
    }

    /// Creates a policy retrying retryable transport errors.
    ///
    /// `max_attempts` counts the first attempt, a value of 0 is treated as 1.
    pub fn new(max_attempts: usize, initial_delay: Duration, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff,
            retryable: Arc::new(RestClientError::is_retryable_transport),
        }
    }

    /// Same delay before every retry.
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self::new(max_attempts, delay, Backoff::Fixed)
    }

    /// Doubling delay before every retry.
    pub fn exponential(max_attempts: usize, initial_delay: Duration) -> Self {
        Self::new(max_attempts, initial_delay, Backoff::Exponential)
    }

    /// Replaces the predicate deciding which errors are retried.
    #[must_use]
    pub fn with_retryable<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RestClientError) -> bool + Send + Sync + 'static,
    {
        self.retryable = Arc::new(predicate);
        self
    }

    /// Total number of attempts, at least 1.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay before the first retry.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Delay growth.
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Returns `true` if `error` may be retried.
    pub fn is_retryable(&self, error: &RestClientError) -> bool {
        (self.retryable)(error)
    }

    /// The delays to wait before each retry, `max_attempts - 1` of them.
    pub fn delays(&self) -> RetryDelays {
        RetryDelays {
            next: self.initial_delay,
            remaining: self.max_attempts - 1,
            backoff: self.backoff,
        }
    }

    pub(crate) fn predicate(&self) -> RetryPredicate {
        Arc::clone(&self.retryable)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

/// The delay schedule of a [`RetryPolicy`].
///
/// Usable directly as a `backon` backoff.
#[derive(Debug, Clone)]
pub struct RetryDelays {
    next: Duration,
    remaining: usize,
    backoff: Backoff,
}

impl Iterator for RetryDelays {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next;
        if self.backoff == Backoff::Exponential {
            self.next = self.next.saturating_mul(2);
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for RetryDelays {}

#[cfg(test)]
mod tests {
    use insta::assert_debug_snapshot;

    use super::*;
    use crate::client::error::TransportError;

    #[test]
    fn should_not_retry_by_default() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delays().count(), 0);
    }

    #[test]
    fn should_clamp_zero_attempts() {
        assert_eq!(RetryPolicy::fixed(0, Duration::from_secs(1)).max_attempts(), 1);
    }

    #[test]
    fn should_keep_fixed_delay() {
        let delays = RetryPolicy::fixed(4, Duration::from_millis(100))
            .delays()
            .collect::<Vec<_>>();

        assert_eq!(delays, [Duration::from_millis(100); 3]);
    }

    #[test]
    fn should_double_exponential_delay() {
        let initial = Duration::from_millis(50);
        let delays = RetryPolicy::exponential(6, initial).delays().collect::<Vec<_>>();

        for (index, delay) in delays.iter().enumerate() {
            let k = u32::try_from(index).expect("small") + 1;
            assert_eq!(*delay, initial * 2_u32.pow(k - 1));
        }
        assert_eq!(delays.len(), 5);
    }

    #[test]
    fn should_retry_transport_errors_only_by_default() {
        let policy = RetryPolicy::fixed(3, Duration::ZERO);

        assert!(policy.is_retryable(&TransportError::other("boom").into()));
        assert!(!policy.is_retryable(&RestClientError::SerializationError {
            message: "bad".to_string()
        }));
    }

    #[test]
    fn should_use_custom_predicate() {
        let policy = RetryPolicy::fixed(3, Duration::ZERO).with_retryable(|error| {
            matches!(
                error,
                RestClientError::Transport(TransportError::UnexpectedStatusCode { status_code: 503, .. })
            )
        });

        let unavailable = TransportError::UnexpectedStatusCode {
            status_code: 503,
            body: String::new(),
        };
        let not_found = TransportError::UnexpectedStatusCode {
            status_code: 404,
            body: String::new(),
        };
        assert!(policy.is_retryable(&unavailable.into()));
        assert!(!policy.is_retryable(&not_found.into()));
    }

    #[test]
    fn should_debug_without_predicate() {
        let policy = RetryPolicy::exponential(3, Duration::from_millis(10));

        assert_debug_snapshot!(policy, @r"
        RetryPolicy {
            max_attempts: 3,
            initial_delay: 10ms,
            backoff: Exponential,
            ..
        }
        ");
    }
}
