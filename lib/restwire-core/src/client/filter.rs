use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, error};

use super::error::TransportError;
use super::request::BuiltRequest;
use super::response::RawResponse;

/// Per-call information shared by every attempt of the call.
#[derive(Debug)]
pub struct RequestContext {
    request_id: String,
    interface: String,
    method: String,
    attempt: AtomicUsize,
}

impl RequestContext {
    pub(crate) fn new(interface: &str, method: &str) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
        Self {
            request_id: format!("REQ-{id}"),
            interface: interface.to_string(),
            method: method.to_string(),
            attempt: AtomicUsize::new(0),
        }
    }

    /// Unique id of the call, `REQ-` followed by 32 hex digits.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The interface name.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// The method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The current attempt, starting at 1.
    pub fn attempt(&self) -> usize {
        self.attempt.load(Ordering::Relaxed)
    }

    pub(crate) fn next_attempt(&self) -> usize {
        self.attempt.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Observes every transport exchange.
///
/// Filters cannot fail a call, they only observe it.
pub trait RequestFilter: Send + Sync + fmt::Debug {
    /// Rank in the chain, lower runs first.
    fn order(&self) -> i32 {
        0
    }

    /// Before each send.
    fn pre_handle(&self, _request: &BuiltRequest, _context: &RequestContext) {}

    /// After each successful send.
    fn after_completion(
        &self,
        _request: &BuiltRequest,
        _response: &RawResponse,
        _context: &RequestContext,
    ) {
    }

    /// After each failed send.
    fn on_error(&self, _request: &BuiltRequest, _error: &TransportError, _context: &RequestContext) {}
}

/// An ordered list of [`RequestFilter`]s.
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn RequestFilter>>,
}

impl FilterChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter, keeping the chain sorted by [`RequestFilter::order`].
    pub fn push(&mut self, filter: Arc<dyn RequestFilter>) {
        let index = self
            .filters
            .partition_point(|existing| existing.order() <= filter.order());
        self.filters.insert(index, filter);
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if there are no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub(crate) fn pre_handle(&self, request: &BuiltRequest, context: &RequestContext) {
        for filter in &self.filters {
            filter.pre_handle(request, context);
        }
    }

    pub(crate) fn after_completion(
        &self,
        request: &BuiltRequest,
        response: &RawResponse,
        context: &RequestContext,
    ) {
        for filter in &self.filters {
            filter.after_completion(request, response, context);
        }
    }

    pub(crate) fn on_error(
        &self,
        request: &BuiltRequest,
        error: &TransportError,
        context: &RequestContext,
    ) {
        for filter in &self.filters {
            filter.on_error(request, error, context);
        }
    }
}

/// Logs every exchange with `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingFilter;

impl RequestFilter for LoggingFilter {
    fn order(&self) -> i32 {
        i32::MIN
    }

    fn pre_handle(&self, request: &BuiltRequest, context: &RequestContext) {
        debug!(
            request_id = context.request_id(),
            attempt = context.attempt(),
            method = %request.method,
            url = %request.url,
            "request"
        );
    }

    fn after_completion(
        &self,
        _request: &BuiltRequest,
        response: &RawResponse,
        context: &RequestContext,
    ) {
        debug!(
            request_id = context.request_id(),
            status = response.status(),
            size = response.bytes().len(),
            "response"
        );
    }

    fn on_error(&self, request: &BuiltRequest, error: &TransportError, context: &RequestContext) {
        error!(
            request_id = context.request_id(),
            attempt = context.attempt(),
            url = %request.url,
            %error,
            "request failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::client::request::tests::request_for;

    #[derive(Debug)]
    struct Recorder {
        name: &'static str,
        order: i32,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl RequestFilter for Recorder {
        fn order(&self) -> i32 {
            self.order
        }

        fn pre_handle(&self, _request: &BuiltRequest, context: &RequestContext) {
            self.events
                .lock()
                .expect("not poisoned")
                .push(format!("{}:pre:{}", self.name, context.attempt()));
        }

        fn on_error(&self, _request: &BuiltRequest, _error: &TransportError, _context: &RequestContext) {
            self.events
                .lock()
                .expect("not poisoned")
                .push(format!("{}:error", self.name));
        }
    }

    #[test]
    fn test_request_id_format() {
        let context = RequestContext::new("UserApi", "get_user");

        assert!(context.request_id().starts_with("REQ-"));
        assert_eq!(context.request_id().len(), 4 + 32);
        assert_eq!(context.attempt(), 0);
        assert_eq!(context.next_attempt(), 1);
        assert_eq!(context.attempt(), 1);
    }

    #[test]
    fn test_chain_runs_in_order() {
        let events = Arc::new(Mutex::new(vec![]));
        let mut chain = FilterChain::new();
        for (name, order) in [("late", 10), ("early", -1), ("middle", 0), ("middle2", 0)] {
            chain.push(Arc::new(Recorder {
                name,
                order,
                events: Arc::clone(&events),
            }));
        }
        let request = request_for("http://api.test");
        let context = RequestContext::new("Api", "m");
        context.next_attempt();

        chain.pre_handle(&request, &context);
        chain.on_error(&request, &TransportError::other("boom"), &context);

        assert_eq!(
            *events.lock().expect("not poisoned"),
            [
                "early:pre:1",
                "middle:pre:1",
                "middle2:pre:1",
                "late:pre:1",
                "early:error",
                "middle:error",
                "middle2:error",
                "late:error",
            ]
        );
    }
}
