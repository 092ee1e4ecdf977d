use std::sync::Arc;
use std::time::Duration;

use backon::{BlockingRetryable, Retryable};
use tracing::warn;

use super::error::RestClientError;
use super::filter::{FilterChain, RequestContext};
use super::request::BuiltRequest;
use super::response::RawResponse;
use super::retry::RetryPolicy;
use super::transport::Transport;

/// Sends built requests through the transport, one filter-wrapped exchange per attempt,
/// retrying according to a [`RetryPolicy`].
///
/// Each attempt covers the exchange and the `complete` step turning the raw response into
/// the call result, so decoding failures go through the retry predicate too.
#[derive(Debug, Clone)]
pub(crate) struct Dispatcher {
    transport: Arc<dyn Transport>,
    filters: FilterChain,
}

impl Dispatcher {
    pub(crate) fn new(transport: Arc<dyn Transport>, filters: FilterChain) -> Self {
        Self { transport, filters }
    }

    fn exchange(
        &self,
        request: &BuiltRequest,
        context: &RequestContext,
    ) -> Result<RawResponse, RestClientError> {
        context.next_attempt();
        self.filters.pre_handle(request, context);
        match self.transport.send(request) {
            Ok(response) => {
                self.filters.after_completion(request, &response, context);
                Ok(response)
            }
            Err(error) => {
                self.filters.on_error(request, &error, context);
                Err(error.into())
            }
        }
    }

    async fn exchange_async(
        &self,
        request: &BuiltRequest,
        context: &RequestContext,
    ) -> Result<RawResponse, RestClientError> {
        context.next_attempt();
        self.filters.pre_handle(request, context);
        match self.transport.send_async(request.clone()).await {
            Ok(response) => {
                self.filters.after_completion(request, &response, context);
                Ok(response)
            }
            Err(error) => {
                self.filters.on_error(request, &error, context);
                Err(error.into())
            }
        }
    }

    /// Runs the call on the current thread, sleeping between attempts.
    pub(crate) fn dispatch_blocking<T, F>(
        &self,
        request: &BuiltRequest,
        policy: &RetryPolicy,
        context: &RequestContext,
        mut complete: F,
    ) -> Result<T, RestClientError>
    where
        F: FnMut(RawResponse) -> Result<T, RestClientError>,
    {
        let predicate = policy.predicate();
        let attempt = || self.exchange(request, context).and_then(&mut complete);

        attempt
            .retry(policy.delays())
            .sleep(std::thread::sleep)
            .when(|error| predicate(error))
            .notify(|error, delay| notify_retry(context, error, delay))
            .call()
    }

    /// Runs the call without blocking, awaiting a timer between attempts.
    pub(crate) async fn dispatch<T, F>(
        &self,
        request: &BuiltRequest,
        policy: &RetryPolicy,
        context: &RequestContext,
        complete: F,
    ) -> Result<T, RestClientError>
    where
        F: Fn(RawResponse) -> Result<T, RestClientError>,
    {
        let predicate = policy.predicate();
        let complete = &complete;
        let attempt = || async move {
            let response = self.exchange_async(request, context).await?;
            complete(response)
        };

        attempt
            .retry(policy.delays())
            .sleep(tokio::time::sleep)
            .when(|error| predicate(error))
            .notify(|error, delay| notify_retry(context, error, delay))
            .await
    }
}

fn notify_retry(context: &RequestContext, error: &RestClientError, delay: Duration) {
    warn!(
        request_id = context.request_id(),
        method = context.method(),
        attempt = context.attempt(),
        ?delay,
        %error,
        "attempt failed, retrying"
    );
}
