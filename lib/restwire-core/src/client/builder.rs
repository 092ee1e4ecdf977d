use std::fmt::Debug;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use http::Uri;
use http::uri::{PathAndQuery, Scheme};
use indexmap::IndexMap;
use tokio::runtime::Handle;
use tracing::debug;

use super::auth::{AuthProvider, NoAuth};
use super::cache::ResponseCache;
use super::config::ClientConfig;
use super::descriptor::ClientInterface;
use super::dispatch::Dispatcher;
use super::filter::{FilterChain, RequestFilter};
use super::request::CompiledMethod;
use super::retry::RetryPolicy;
use super::serializer::{JsonSerializer, Serializer};
use super::transport::{ReqwestTransport, Transport};
use super::validation::{AcceptAll, ResponseValidator};
use super::{ClientInner, RestClient, RestClientError};

/// Builder for creating [`RestClient`] instances.
///
/// The builder carries the client-wide capabilities; the interface passed to
/// [`build`](Self::build) may override some of them.
///
/// # Default Configuration
///
/// - **Base URL**: `http://127.0.0.1:80`, used when the interface declares neither a base URL
///   nor a configured property key
/// - **Transport**: [`ReqwestTransport`], with the configured timeout if any
/// - **Serializer**: [`JsonSerializer`]
/// - **Authentication**: none
/// - **Validator**: [`AcceptAll`]
/// - **Retry**: a single attempt
/// - **Filters / cache**: none
/// - **Runtime**: the runtime current when `call_async` is invoked
///
/// # Example
///
/// ```rust
/// use http::uri::Scheme;
/// use restwire_core::{ClientInterface, LoggingFilter, MethodDescriptor, RestClient, RetryPolicy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let interface = ClientInterface::new("UserApi").method(MethodDescriptor::get("list", "/users"));
///
/// let client = RestClient::builder()
///     .with_scheme(Scheme::HTTPS)
///     .with_host("api.example.com")
///     .with_port(443)
///     .with_base_path("/v1")?
///     .with_retry(RetryPolicy::exponential(3, Duration::from_millis(100)))
///     .with_filter(LoggingFilter)
///     .build(interface)?;
///
/// assert_eq!(client.base_url(), "https://api.example.com:443/v1");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, derive_more::Debug)]
pub struct RestClientBuilder {
    scheme: Scheme,
    host: String,
    port: u16,
    base_path: Option<PathAndQuery>,
    transport: Option<Arc<dyn Transport>>,
    serializer: Option<Arc<dyn Serializer>>,
    auth: Option<Arc<dyn AuthProvider>>,
    validator: Option<Arc<dyn ResponseValidator>>,
    filters: FilterChain,
    cache: Option<Arc<dyn ResponseCache>>,
    retry: Option<RetryPolicy>,
    config: ClientConfig,
    #[debug(skip)]
    runtime: Option<Handle>,
}

impl RestClientBuilder {
    /// Compiles the interface declaration into a ready-to-use client.
    ///
    /// Every method is validated here, so declaration problems surface once,
    /// before any call.
    ///
    /// # Errors
    ///
    /// This method can fail if:
    /// - a method declaration is invalid (missing path, malformed static header or query,
    ///   duplicate parameter, more than one body), or two methods share a name,
    /// - the interface property key has no configured base URL,
    /// - the resolved base URL is invalid.
    pub fn build(self, interface: ClientInterface) -> Result<RestClient, RestClientError> {
        let base_url = self.resolve_base_url(&interface)?;

        let Self {
            transport,
            serializer,
            auth,
            validator,
            filters,
            cache,
            retry,
            config,
            runtime,
            ..
        } = self;
        let ClientInterface {
            name,
            auth: interface_auth,
            validator: interface_validator,
            serializer: interface_serializer,
            methods: descriptors,
            ..
        } = interface;

        let auth = interface_auth
            .or(auth)
            .unwrap_or_else(|| Arc::new(NoAuth));
        let retry = config
            .retry_policy()
            .or(retry)
            .unwrap_or_else(RetryPolicy::none);

        let mut methods = IndexMap::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            let compiled = CompiledMethod::compile(&name, descriptor, &auth, &retry)?;
            if methods
                .insert(compiled.name.clone(), Arc::new(compiled))
                .is_some()
            {
                return Err(RestClientError::binding(
                    &name,
                    &descriptor.name,
                    "method declared twice",
                ));
            }
        }

        let transport = transport.unwrap_or_else(|| {
            let transport = ReqwestTransport::new();
            Arc::new(match config.timeout() {
                Some(timeout) => transport.with_timeout(timeout),
                None => transport,
            })
        });
        debug!(interface = %name, %base_url, methods = methods.len(), "client built");

        Ok(RestClient {
            inner: Arc::new(ClientInner {
                interface: name,
                base_url,
                methods,
                serializer: interface_serializer
                    .or(serializer)
                    .unwrap_or_else(|| Arc::new(JsonSerializer)),
                validator: interface_validator
                    .or(validator)
                    .unwrap_or_else(|| Arc::new(AcceptAll)),
                cache,
                dispatcher: Dispatcher::new(transport, filters),
                runtime,
            }),
        })
    }

    fn resolve_base_url(&self, interface: &ClientInterface) -> Result<String, RestClientError> {
        if let Some(base_url) = &interface.base_url {
            return Ok(base_url.trim_end_matches('/').to_string());
        }

        if let Some(key) = &interface.property_key {
            return self
                .config
                .base_url(key)
                .map(|url| url.trim_end_matches('/').to_string())
                .ok_or_else(|| {
                    RestClientError::binding(
                        &interface.name,
                        "",
                        format!("no base URL configured for property key '{key}'"),
                    )
                });
        }

        let builder = Uri::builder()
            .scheme(self.scheme.clone())
            .authority(format!("{}:{}", self.host, self.port));
        let builder = if let Some(path) = &self.base_path {
            builder.path_and_query(path.path())
        } else {
            builder.path_and_query("/")
        };
        let base_uri = builder.build().map_err(|err| RestClientError::Config {
            message: format!("invalid base URL: {err}"),
        })?;

        Ok(base_uri.to_string().trim_end_matches('/').to_string())
    }

    /// Sets the HTTP scheme of the default base URL.
    ///
    /// Defaults to `Scheme::HTTP`.
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the hostname of the default base URL.
    ///
    /// Defaults to `"127.0.0.1"`.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port of the default base URL.
    ///
    /// Defaults to `80`.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the base path of the default base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a valid URI path.
    ///
    /// # Example
    ///
    /// ```rust
    /// use restwire_core::RestClient;
    ///
    /// # fn example() -> Result<(), restwire_core::RestClientError> {
    /// let builder = RestClient::builder().with_base_path("/api/v1")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_base_path<P>(mut self, base_path: P) -> Result<Self, RestClientError>
    where
        P: TryInto<PathAndQuery>,
        P::Error: Debug + 'static,
    {
        let base_path = base_path
            .try_into()
            .map_err(|err| RestClientError::Config {
                message: format!("invalid base path: {err:?}"),
            })?;
        self.base_path = Some(base_path);
        Ok(self)
    }

    /// Sets the transport, replacing the default [`ReqwestTransport`].
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets the default serializer, used when the interface declares none.
    pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    /// Sets the default authentication, used when neither the method nor the interface declares one.
    ///
    /// ```rust
    /// use restwire_core::{Authentication, RestClient};
    ///
    /// let builder = RestClient::builder()
    ///     .with_auth(Authentication::Bearer("my-token".into()));
    /// ```
    pub fn with_auth(mut self, auth: impl AuthProvider + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    /// Sets the default response validator, used when the interface declares none.
    pub fn with_validator(mut self, validator: impl ResponseValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Adds a request filter.
    pub fn with_filter(mut self, filter: impl RequestFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Sets the cache consulted by cacheable methods.
    pub fn with_cache(mut self, cache: impl ResponseCache + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Sets the default retry policy, used by methods declaring none
    /// when the configuration does not provide one.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Sets the externalized configuration.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the runtime running asynchronous calls.
    ///
    /// Without it, `call_async` uses the runtime it is called from.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }
}

impl Default for RestClientBuilder {
    fn default() -> Self {
        Self {
            scheme: Scheme::HTTP,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST).to_string(),
            port: 80,
            base_path: None,
            transport: None,
            serializer: None,
            auth: None,
            validator: None,
            filters: FilterChain::new(),
            cache: None,
            retry: None,
            config: ClientConfig::default(),
            runtime: None,
        }
    }
}
