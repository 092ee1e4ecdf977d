use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;

use super::raw::RawResponse;

/// A shared map receiving response headers of a call.
///
/// Pass a clone to [`Invocation::response_headers`](crate::Invocation::response_headers)
/// and read it once the call completed. It is filled before the response is validated.
///
/// ```rust
/// use restwire_core::ResponseHeaders;
///
/// let sink = ResponseHeaders::new();
/// let for_call = sink.clone();
/// # drop(for_call);
/// assert!(sink.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseHeaders {
    inner: Arc<Mutex<IndexMap<String, String>>>,
}

impl ResponseHeaders {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A header value, looked up case-insensitively.
    pub fn get(&self, name: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.get(&name.to_ascii_lowercase()).cloned()
    }

    /// A copy of every captured header.
    pub fn snapshot(&self) -> IndexMap<String, String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of captured headers.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies response headers into the sink: all of them when `name` is empty,
    /// otherwise only the named one (if present).
    pub(crate) fn capture(&self, name: &str, response: &RawResponse) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if name.is_empty() {
            inner.extend(
                response
                    .headers()
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            );
        } else if let Some(value) = response.header(name) {
            inner.insert(name.to_ascii_lowercase(), value.to_string());
        }
    }
}
