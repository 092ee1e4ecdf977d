//! # Restwire Core
//!
//! Declarative HTTP clients: describe an interface once, then call its methods
//! synchronously or asynchronously, with retries, authentication and validation.
//!
//! The crate is organized around two entry points:
//! - **[`RestClient`]** - the client compiled from a [`ClientInterface`] declaration
//! - **[`TestClient`](test_client::TestClient)** - test harness starting a server and pointing clients at it
//!
//! ## Quick Start
//!
//! ### Declaring an interface
//!
//! ```rust,no_run
//! use restwire_core::{ClientInterface, MethodDescriptor, ParamDecl, RestClient};
//! # use serde::{Deserialize, Serialize};
//! # #[derive(Deserialize)]
//! # struct User { id: u32, name: String }
//! # #[derive(Serialize)]
//! # struct NewUser { name: String }
//!
//! # fn main() -> Result<(), restwire_core::RestClientError> {
//! let interface = ClientInterface::new("UserApi")
//!     .with_base_url("http://api.example.com")
//!     .method(
//!         MethodDescriptor::get("get_user", "/users/{id}")
//!             .header("Accept: application/json")
//!             .param(ParamDecl::path("id")),
//!     )
//!     .method(MethodDescriptor::post("create_user", "/users").param(ParamDecl::body("user")));
//!
//! let client = RestClient::builder().build(interface)?;
//!
//! // GET http://api.example.com/users/42
//! let user: User = client.method("get_user")?.arg("id", 42)?.call()?;
//!
//! // POST http://api.example.com/users with a JSON body
//! let created: User = client
//!     .method("create_user")?
//!     .arg("user", NewUser { name: "Ann".to_string() })?
//!     .call()?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Asynchronous calls
//!
//! A method declared with [`asynchronous()`](MethodDescriptor::asynchronous) and a callback
//! parameter returns immediately; its outcome is delivered exactly once to a [`ResponseCallback`].
//! Retries wait on the runtime timer, no thread is blocked.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use restwire_core::{
//!     ClientInterface, MethodDescriptor, ParamDecl, RestClient, RestClientError, RetryPolicy,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let interface = ClientInterface::new("UserApi")
//!     .with_base_url("http://api.example.com")
//!     .method(
//!         MethodDescriptor::get("fetch_user", "/users/{id}")
//!             .param(ParamDecl::path("id"))
//!             .param(ParamDecl::callback("callback"))
//!             .retry(RetryPolicy::fixed(3, Duration::from_millis(100)))
//!             .asynchronous(),
//!     );
//! let client = RestClient::builder().build(interface)?;
//!
//! let (tx, rx) = tokio::sync::oneshot::channel::<Result<serde_json::Value, RestClientError>>();
//! client.method("fetch_user")?.arg("id", 42)?.call_async(tx)?;
//! let user = rx.await??;
//! # Ok(())
//! # }
//! ```
//!
//! ## Request Assembly
//!
//! For each call, arguments are bound to their declared component, then templates are resolved:
//!
//! | Declaration | Argument | Request |
//! |-------------|----------|---------|
//! | `ParamDecl::path("id")` on `/users/{id}` | `42` | `/users/42` |
//! | `ParamDecl::query("active")` | `true` | `?active=true` |
//! | `.query("lang=${lang:en}")` | none | `?lang=en` |
//! | `ParamDecl::unbound("tags")` | `["a", "b"]` | `?tags=a&tags=b` |
//! | `.header("X-Trace: ${trace}")` + `ParamDecl::header("trace")` | `"t-1"` | `X-Trace: t-1` |
//! | `ParamDecl::host("host")` | `"http://other"` | `http://other/...` |
//!
//! Path values are percent-encoded; a placeholder without value nor default is left verbatim.
//!
//! ## Error Handling
//!
//! Every fallible operation returns a [`RestClientError`]:
//!
//! ```rust
//! use restwire_core::{ClientInterface, MethodDescriptor, RestClient, RestClientError};
//!
//! let interface = ClientInterface::new("Broken").method(MethodDescriptor::unrouted("nowhere"));
//!
//! match RestClient::builder().build(interface) {
//!     Err(RestClientError::Binding { method, .. }) => assert_eq!(method, "nowhere"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

mod client;

pub mod test_client;

pub use self::client::parameters;
pub use self::client::response;
pub use self::client::serializer;
pub use self::client::transport;

// Public API - only expose user-facing types and functions
pub use self::client::{
    AcceptAll, ArgValue, AuthProvider, Authentication, AuthenticationError, Backoff, BindingKind,
    BuiltRequest, CacheKey, CallMode, CallbackFn, ClientConfig, ClientInterface,
    ExpectedStatusCodes, FilterChain, FormSerializer, Invocation, JsonSerializer, LoggingFilter,
    MethodDescriptor, NoAuth, ParamDecl, ParamKind, RawResponse, RequestContext, RequestFilter,
    RequestHeaders, ResponseCache, ResponseCallback, ResponseHeaders, ResponseValidator,
    RestClient, RestClientBuilder, RestClientError, RetryConfig, RetryDelays, RetryPolicy,
    ReqwestTransport, SecureString, Serializer, Transport, TransportError, TransportFuture,
    ValidationResult, callback,
};
