use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tokio::sync::oneshot;

use super::ClientInner;
use super::error::RestClientError;
use super::parameters::ArgValue;
use super::request::{BuiltRequest, CompiledMethod};
use super::response::ResponseHeaders;

mod execution;

/// One call of a declared method.
///
/// Obtained from [`RestClient::method`](super::RestClient::method), it collects the arguments
/// then runs the call with [`call`](Self::call) or [`call_async`](Self::call_async).
///
/// # Method Groups
///
/// ## Arguments
/// - [`arg(name, value)`](Self::arg) - Bind a value to a declared (or implicit query) parameter
/// - [`response_headers(name, sink)`](Self::response_headers) - Receive response headers into a sink
///
/// ## Execution
/// - [`call::<T>()`](Self::call) - Blocks the current thread until the decoded `T` is available
/// - [`call_async::<T, _>(callback)`](Self::call_async) - Returns immediately, the outcome goes to the callback
/// - [`build_request()`](Self::build_request) - Only assembles the request, without sending it
///
/// # Example
///
/// ```rust,no_run
/// use restwire_core::{ClientInterface, MethodDescriptor, ParamDecl, RestClient};
/// # use serde::Deserialize;
/// # #[derive(Deserialize)]
/// # struct User { id: u32, name: String }
///
/// # fn example() -> Result<(), restwire_core::RestClientError> {
/// let interface = ClientInterface::new("UserApi")
///     .with_base_url("http://localhost:8080")
///     .method(MethodDescriptor::get("get_user", "/users/{id}").param(ParamDecl::path("id")));
/// let client = RestClient::builder().build(interface)?;
///
/// let user: User = client.method("get_user")?.arg("id", 42)?.call()?;
/// # Ok(())
/// # }
/// ```
#[derive(derive_more::Debug)]
pub struct Invocation {
    #[debug(skip)]
    pub(super) client: Arc<ClientInner>,
    pub(super) method: Arc<CompiledMethod>,
    pub(super) args: IndexMap<String, ArgValue>,
    pub(super) sinks: IndexMap<String, ResponseHeaders>,
}

impl Invocation {
    pub(super) fn new(client: Arc<ClientInner>, method: Arc<CompiledMethod>) -> Self {
        Self {
            client,
            method,
            args: IndexMap::new(),
            sinks: IndexMap::new(),
        }
    }

    /// Binds a value to the parameter `name`.
    ///
    /// Arguments not declared by the method are sent as query parameters.
    /// A `null` value (e.g. `None`) leaves the parameter unbound.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn arg<T>(mut self, name: impl Into<String>, value: T) -> Result<Self, RestClientError>
    where
        T: Serialize,
    {
        let value = ArgValue::new(&value)?;
        self.args.insert(name.into(), value);
        Ok(self)
    }

    /// Routes response headers into `sink`, for the response-headers parameter `name`.
    ///
    /// Captures the single header named by the parameter key, or every header when the key is empty.
    #[must_use]
    pub fn response_headers(mut self, name: impl Into<String>, sink: &ResponseHeaders) -> Self {
        self.sinks.insert(name.into(), sink.clone());
        self
    }

    /// The method name.
    pub fn method_name(&self) -> &str {
        &self.method.name
    }

    /// Assembles the request the call would send.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built, the body cannot be encoded,
    /// or the authentication cannot be applied.
    pub fn build_request(&self) -> Result<BuiltRequest, RestClientError> {
        let mut request =
            self.method
                .build_request(&self.client.base_url, &self.args, &self.client.serializer)?;
        self.method.auth.apply(&mut request)?;
        Ok(request)
    }
}

/// Receives the outcome of an asynchronous call, exactly once.
///
/// Implemented for [`CallbackFn`] (see [`callback`]) and for `oneshot` senders.
pub trait ResponseCallback<T>: Send + 'static {
    /// The call produced a value.
    fn on_success(self, value: T);

    /// The call failed, after every allowed attempt.
    fn on_failure(self, error: RestClientError);
}

/// A [`ResponseCallback`] made of two closures.
#[derive(derive_more::Debug)]
pub struct CallbackFn<S, F> {
    #[debug(skip)]
    success: S,
    #[debug(skip)]
    failure: F,
}

/// Creates a [`ResponseCallback`] from a success and a failure closure.
///
/// ```rust
/// use restwire_core::{ResponseCallback, callback};
///
/// let cb = callback(
///     |value: u32| println!("got {value}"),
///     |error| eprintln!("failed: {error}"),
/// );
/// cb.on_success(42);
/// ```
pub fn callback<T, S, F>(success: S, failure: F) -> CallbackFn<S, F>
where
    S: FnOnce(T) + Send + 'static,
    F: FnOnce(RestClientError) + Send + 'static,
{
    CallbackFn { success, failure }
}

impl<T, S, F> ResponseCallback<T> for CallbackFn<S, F>
where
    S: FnOnce(T) + Send + 'static,
    F: FnOnce(RestClientError) + Send + 'static,
{
    fn on_success(self, value: T) {
        (self.success)(value);
    }

    fn on_failure(self, error: RestClientError) {
        (self.failure)(error);
    }
}

impl<T> ResponseCallback<T> for oneshot::Sender<Result<T, RestClientError>>
where
    T: Send + 'static,
{
    fn on_success(self, value: T) {
        // the receiver may have given up
        let _ = self.send(Ok(value));
    }

    fn on_failure(self, error: RestClientError) {
        let _ = self.send(Err(error));
    }
}
