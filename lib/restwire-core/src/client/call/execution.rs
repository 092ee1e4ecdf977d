use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::{Invocation, ResponseCallback};
use crate::client::ClientInner;
use crate::client::cache::CacheKey;
use crate::client::descriptor::CallMode;
use crate::client::error::RestClientError;
use crate::client::filter::RequestContext;
use crate::client::request::{BuiltRequest, CompiledMethod};
use crate::client::response::builder::build;
use crate::client::response::{RawResponse, ResponseHeaders};

impl Invocation {
    /// Runs the call on the current thread and returns the decoded response.
    ///
    /// Retries follow the method retry policy, the thread sleeps between attempts.
    /// Must not be called from within an async task, use a blocking task instead.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the method is declared asynchronous,
    /// - the request cannot be built,
    /// - the last attempt failed (transport failure, unexpected status, decoding),
    /// - the validator failure hook rejected the response.
    pub fn call<T>(self) -> Result<T, RestClientError>
    where
        T: DeserializeOwned + 'static,
    {
        if self.method.mode == CallMode::Async {
            return Err(RestClientError::async_contract(
                &self.method.name,
                "declared asynchronous, use `call_async` with a callback",
            ));
        }

        let request = self.build_request()?;
        let context = RequestContext::new(&self.method.interface, &self.method.name);
        let completion = Completion::new(self, request);

        if let Some(raw) = completion.cached() {
            return completion.complete(raw, false);
        }
        completion.client.dispatcher.dispatch_blocking(
            &completion.request,
            &completion.method.retry,
            &context,
            |raw| completion.complete(raw, true),
        )
    }

    /// Schedules the call and returns immediately.
    ///
    /// The outcome is delivered to `callback` exactly once, from a task of the runtime
    /// configured with [`RestClientBuilder::with_runtime`](crate::RestClientBuilder::with_runtime),
    /// or of the current runtime. Failures to build the request are delivered to the callback too.
    /// Retries wait on the runtime timer without blocking any thread.
    ///
    /// # Errors
    ///
    /// Returns a [`RestClientError::AsyncContract`] without calling back if:
    /// - the method is not declared asynchronous,
    /// - the method does not declare a callback parameter,
    /// - no Tokio runtime is available.
    pub fn call_async<T, C>(self, callback: C) -> Result<(), RestClientError>
    where
        T: DeserializeOwned + Send + 'static,
        C: ResponseCallback<T>,
    {
        let name = &self.method.name;
        if self.method.mode != CallMode::Async {
            return Err(RestClientError::async_contract(
                name,
                "declared synchronous, use `call`",
            ));
        }
        if !self.method.has_callback() {
            return Err(RestClientError::async_contract(
                name,
                "asynchronous methods must declare a callback parameter",
            ));
        }
        let Some(runtime) = self
            .client
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        else {
            return Err(RestClientError::async_contract(
                name,
                "no Tokio runtime available, configure one with `RestClientBuilder::with_runtime`",
            ));
        };

        let request = match self.build_request() {
            Ok(request) => request,
            Err(error) => {
                callback.on_failure(error);
                return Ok(());
            }
        };
        let context = RequestContext::new(&self.method.interface, &self.method.name);
        let completion = Completion::new(self, request);

        runtime.spawn(async move {
            let outcome = match completion.cached() {
                Some(raw) => completion.complete(raw, false),
                None => {
                    completion
                        .client
                        .dispatcher
                        .dispatch(
                            &completion.request,
                            &completion.method.retry,
                            &context,
                            |raw| completion.complete(raw, true),
                        )
                        .await
                }
            };
            match outcome {
                Ok(value) => callback.on_success(value),
                Err(error) => callback.on_failure(error),
            }
        });
        Ok(())
    }
}

/// What happens to a response once received: decoding, header sinks, validation, caching.
#[derive(Debug)]
struct Completion {
    client: Arc<ClientInner>,
    method: Arc<CompiledMethod>,
    sinks: IndexMap<String, ResponseHeaders>,
    request: BuiltRequest,
    cache_key: Option<CacheKey>,
}

impl Completion {
    fn new(invocation: Invocation, request: BuiltRequest) -> Self {
        let Invocation {
            client,
            method,
            sinks,
            ..
        } = invocation;

        for name in sinks.keys() {
            let declared = method
                .response_header_sinks()
                .any(|param| param.name() == name);
            if !declared {
                warn!(method = %method.name, sink = %name, "no response-headers parameter with this name, sink ignored");
            }
        }

        let cache_key = (client.cache.is_some() && method.cache_ttl.is_some())
            .then(|| CacheKey::for_request(&method.interface, &method.name, &request));

        Self {
            client,
            method,
            sinks,
            request,
            cache_key,
        }
    }

    fn cached(&self) -> Option<RawResponse> {
        let (Some(cache), Some(key)) = (&self.client.cache, &self.cache_key) else {
            return None;
        };
        let hit = cache.get(key);
        if hit.is_some() {
            debug!(%key, "response served from cache");
        }
        hit
    }

    fn complete<T>(&self, raw: RawResponse, fresh: bool) -> Result<T, RestClientError>
    where
        T: DeserializeOwned + 'static,
    {
        let value = build::<T>(&raw, self.request.serializer.as_ref())?;

        for param in self.method.response_header_sinks() {
            if let Some(sink) = self.sinks.get(param.name()) {
                sink.capture(param.key(), &raw);
            }
        }

        let validator = &self.client.validator;
        let result = validator.validate(&raw);
        if !result.is_valid() {
            warn!(
                method = %self.method.name,
                status = raw.status(),
                message = result.message(),
                "response validation failed"
            );
            validator.on_failure(&self.request, &raw, &result)?;
        }

        if fresh
            && let (Some(cache), Some(key), Some(ttl)) =
                (&self.client.cache, &self.cache_key, self.method.cache_ttl)
        {
            cache.put(key.clone(), raw, ttl);
        }
        Ok(value)
    }
}
