use std::sync::Arc;
use std::time::Duration;

use http::Method;

use super::auth::AuthProvider;
use super::retry::RetryPolicy;
use super::serializer::Serializer;
use super::validation::ResponseValidator;

/// How a parameter takes part in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Substituted into the path template.
    Path,
    /// Sent as a query parameter.
    Query,
    /// Sent as a request header.
    Header,
    /// Sent as the request body.
    Body,
    /// Replaces the configured base URL.
    Host,
    /// No explicit binding, sent as a query parameter named after the parameter.
    Unbound,
    /// Receives response headers, the key being a header name (empty for all headers).
    ResponseHeader,
    /// The completion callback of an async method.
    Callback,
}

impl ParamKind {
    /// The request component this parameter binds to, if any.
    pub fn binding_kind(self) -> Option<BindingKind> {
        match self {
            Self::Path => Some(BindingKind::Path),
            Self::Query | Self::Unbound => Some(BindingKind::Query),
            Self::Header => Some(BindingKind::Header),
            Self::Body => Some(BindingKind::Body),
            Self::Host => Some(BindingKind::Host),
            Self::ResponseHeader | Self::Callback => None,
        }
    }
}

/// The request component a bound value lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingKind {
    /// Path template placeholder.
    Path,
    /// Query string.
    Query,
    /// Header.
    Header,
    /// Body.
    Body,
    /// Base URL override.
    Host,
}

/// Declaration of one method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub(crate) name: String,
    pub(crate) kind: ParamKind,
    pub(crate) key: String,
}

impl ParamDecl {
    /// Declares a parameter of the given kind, keyed by its name.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            key: String::new(),
        }
    }

    /// Declares a path parameter.
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Path)
    }

    /// Declares a query parameter.
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Query)
    }

    /// Declares a header parameter.
    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Header)
    }

    /// Declares the body parameter.
    pub fn body(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Body)
    }

    /// Declares a base URL override parameter.
    pub fn host(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Host)
    }

    /// Declares a parameter without binding metadata.
    pub fn unbound(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Unbound)
    }

    /// Declares a response header sink receiving every response header.
    pub fn response_headers(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::ResponseHeader)
    }

    /// Declares the completion callback of an async method.
    pub fn callback(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Callback)
    }

    /// Sets an explicit key (placeholder name, query name, header name).
    ///
    /// An empty key falls back to the parameter name.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter kind.
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// The effective key.
    ///
    /// Response header sinks keep an empty key, meaning "all headers".
    pub fn key(&self) -> &str {
        if self.key.is_empty() && self.kind != ParamKind::ResponseHeader {
            &self.name
        } else {
            &self.key
        }
    }
}

/// Whether a method returns its result or reports it through a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallMode {
    /// The caller blocks until the result is available.
    #[default]
    Sync,
    /// The call returns immediately, the result is delivered to a callback.
    Async,
}

/// Declaration of one interface method.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub(crate) name: String,
    pub(crate) verb: Method,
    pub(crate) path: Option<String>,
    pub(crate) headers: Vec<String>,
    pub(crate) query: Vec<String>,
    pub(crate) params: Vec<ParamDecl>,
    pub(crate) retry: Option<RetryPolicy>,
    pub(crate) auth: Option<Arc<dyn AuthProvider>>,
    pub(crate) mode: CallMode,
    pub(crate) cache_ttl: Option<Duration>,
}

impl MethodDescriptor {
    /// Declares a method with the given verb and path template.
    pub fn new(name: impl Into<String>, verb: Method, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verb,
            path: Some(path.into()),
            headers: vec![],
            query: vec![],
            params: vec![],
            retry: None,
            auth: None,
            mode: CallMode::Sync,
            cache_ttl: None,
        }
    }

    /// Declares a method with no path template yet.
    ///
    /// Building a client fails unless [`with_path`](Self::with_path) is called.
    pub fn unrouted(name: impl Into<String>) -> Self {
        let mut result = Self::new(name, Method::GET, "");
        result.path = None;
        result
    }

    /// Declares a GET method.
    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::GET, path)
    }

    /// Declares a POST method.
    pub fn post(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::POST, path)
    }

    /// Declares a PUT method.
    pub fn put(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::PUT, path)
    }

    /// Declares a DELETE method.
    pub fn delete(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::DELETE, path)
    }

    /// Declares a PATCH method.
    pub fn patch(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::PATCH, path)
    }

    /// Sets the path template.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds a static header, written as `"Name: value"`.
    ///
    /// The value may contain `${name}` placeholders resolved from header parameters.
    #[must_use]
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.headers.push(header.into());
        self
    }

    /// Adds a static query pair, written as `"key=value"`.
    ///
    /// The value may contain `${name}` placeholders resolved from query parameters.
    #[must_use]
    pub fn query(mut self, pair: impl Into<String>) -> Self {
        self.query.push(pair.into());
        self
    }

    /// Declares the next parameter.
    #[must_use]
    pub fn param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the retry policy of this method.
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Overrides the interface authentication for this method.
    #[must_use]
    pub fn auth(mut self, auth: impl AuthProvider + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    /// Makes this method asynchronous.
    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.mode = CallMode::Async;
        self
    }

    /// Caches successful responses of this method for `ttl`.
    #[must_use]
    pub fn cacheable(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Declaration of a client interface: a named group of methods sharing a base URL.
#[derive(Debug, Clone)]
pub struct ClientInterface {
    pub(crate) name: String,
    pub(crate) base_url: Option<String>,
    pub(crate) property_key: Option<String>,
    pub(crate) auth: Option<Arc<dyn AuthProvider>>,
    pub(crate) validator: Option<Arc<dyn ResponseValidator>>,
    pub(crate) serializer: Option<Arc<dyn Serializer>>,
    pub(crate) methods: Vec<MethodDescriptor>,
}

impl ClientInterface {
    /// Declares an empty interface.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: None,
            property_key: None,
            auth: None,
            validator: None,
            serializer: None,
            methods: vec![],
        }
    }

    /// Sets a fixed base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Reads the base URL from the client configuration under this key.
    #[must_use]
    pub fn with_property_key(mut self, key: impl Into<String>) -> Self {
        self.property_key = Some(key.into());
        self
    }

    /// Sets the authentication used by every method without its own.
    #[must_use]
    pub fn with_auth(mut self, auth: impl AuthProvider + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    /// Sets the response validator of this interface.
    #[must_use]
    pub fn with_validator(mut self, validator: impl ResponseValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Sets the body serializer of this interface.
    #[must_use]
    pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    /// Declares a method.
    #[must_use]
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// The interface name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
