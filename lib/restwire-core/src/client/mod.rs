use std::sync::Arc;

use indexmap::IndexMap;
use tokio::runtime::Handle;

mod builder;
pub use self::builder::RestClientBuilder;

mod descriptor;
pub use self::descriptor::{
    BindingKind, CallMode, ClientInterface, MethodDescriptor, ParamDecl, ParamKind,
};

mod call;
pub use self::call::{CallbackFn, Invocation, ResponseCallback, callback};

pub mod parameters;
pub use self::parameters::{ArgValue, RequestHeaders};

mod request;
pub use self::request::BuiltRequest;

mod dispatch;

mod retry;
pub use self::retry::{Backoff, RetryDelays, RetryPolicy};

pub mod response;
pub use self::response::{RawResponse, ResponseHeaders};

mod auth;
pub use self::auth::{AuthProvider, Authentication, AuthenticationError, NoAuth, SecureString};

mod validation;
pub use self::validation::{AcceptAll, ResponseValidator, ValidationResult};

mod filter;
pub use self::filter::{FilterChain, LoggingFilter, RequestContext, RequestFilter};

mod cache;
pub use self::cache::{CacheKey, ResponseCache};

pub mod serializer;
pub use self::serializer::{FormSerializer, JsonSerializer, Serializer};

pub mod transport;
pub use self::transport::{ExpectedStatusCodes, ReqwestTransport, Transport, TransportFuture};

mod config;
pub use self::config::{ClientConfig, RetryConfig};

mod error;
pub use self::error::{RestClientError, TransportError};

use self::dispatch::Dispatcher;
use self::request::CompiledMethod;

/// HTTP client generated from a [`ClientInterface`] declaration.
///
/// The declaration is compiled once by [`RestClientBuilder::build`]; the client is then an
/// immutable, cheaply cloneable handle that can be shared across threads.
/// Each call starts with [`method`](Self::method).
///
/// # Example
///
/// ```rust,no_run
/// use restwire_core::{ClientInterface, MethodDescriptor, ParamDecl, RestClient};
/// # use serde::Deserialize;
/// # #[derive(Deserialize)]
/// # struct User { id: u32, name: String }
///
/// # fn main() -> Result<(), restwire_core::RestClientError> {
/// let interface = ClientInterface::new("UserApi")
///     .with_base_url("http://api.example.com")
///     .method(
///         MethodDescriptor::get("get_user", "/users/{id}")
///             .param(ParamDecl::path("id"))
///             .param(ParamDecl::query("active")),
///     );
/// let client = RestClient::builder().build(interface)?;
///
/// // GET http://api.example.com/users/42?active=true
/// let user: User = client
///     .method("get_user")?
///     .arg("id", 42)?
///     .arg("active", true)?
///     .call()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RestClient {
    inner: Arc<ClientInner>,
}

/// The compiled, shared state of a [`RestClient`].
#[derive(derive_more::Debug)]
pub(crate) struct ClientInner {
    pub(crate) interface: String,
    pub(crate) base_url: String,
    pub(crate) methods: IndexMap<String, Arc<CompiledMethod>>,
    pub(crate) serializer: Arc<dyn Serializer>,
    pub(crate) validator: Arc<dyn ResponseValidator>,
    pub(crate) cache: Option<Arc<dyn ResponseCache>>,
    pub(crate) dispatcher: Dispatcher,
    #[debug(skip)]
    pub(crate) runtime: Option<Handle>,
}

impl RestClient {
    /// Creates a new `RestClientBuilder` for configuring a client.
    ///
    /// ```rust
    /// use restwire_core::{ClientInterface, RestClient};
    ///
    /// # fn example() -> Result<(), restwire_core::RestClientError> {
    /// let client = RestClient::builder()
    ///     .with_host("api.example.com")
    ///     .with_port(8080)
    ///     .build(ClientInterface::new("EmptyApi"))?;
    /// assert_eq!(client.base_url(), "http://api.example.com:8080");
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::default()
    }

    /// The interface name.
    pub fn interface(&self) -> &str {
        &self.inner.interface
    }

    /// The base URL requests are sent to, unless a host parameter overrides it.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Returns `true` if the interface declares `name`.
    pub fn declares(&self, name: &str) -> bool {
        self.inner.methods.contains_key(name)
    }

    /// Declared method names, in declaration order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.inner.methods.keys().map(String::as_str)
    }

    /// Starts a call of the method `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`RestClientError::UnknownMethod`] if the interface does not declare it.
    pub fn method(&self, name: &str) -> Result<Invocation, RestClientError> {
        let method = self
            .inner
            .methods
            .get(name)
            .ok_or_else(|| RestClientError::UnknownMethod {
                interface: self.inner.interface.clone(),
                method: name.to_string(),
            })?;
        Ok(Invocation::new(Arc::clone(&self.inner), Arc::clone(method)))
    }

    #[cfg(test)]
    pub(crate) fn compiled(&self, name: &str) -> &CompiledMethod {
        &self.inner.methods[name]
    }
}
