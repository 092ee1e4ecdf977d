use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::Method;
use indexmap::IndexMap;
use serde_json::Value;

use super::auth::AuthProvider;
use super::descriptor::{BindingKind, CallMode, MethodDescriptor, ParamDecl, ParamKind};
use super::error::RestClientError;
use super::parameters::headers::merge_headers;
use super::parameters::placeholder::{ConsumedKeys, Position, resolve};
use super::parameters::query::{build_url, merge_query};
use super::parameters::value::inline_string;
use super::parameters::{ArgValue, RequestHeaders, bind};
use super::retry::RetryPolicy;
use super::serializer::{FormSerializer, Serializer};

/// A request ready to be sent by a [`Transport`](super::Transport).
#[derive(Debug, Clone)]
pub struct BuiltRequest {
    /// The full URL, query string included.
    pub url: String,
    /// The HTTP verb.
    pub method: Method,
    /// Request headers, last write wins.
    pub headers: RequestHeaders,
    /// The encoded body.
    pub body: Option<Bytes>,
    /// The serializer used for the body, and for decoding the response.
    pub serializer: Arc<dyn Serializer>,
}

/// A method declaration validated and resolved against its interface and client.
///
/// Built once when the client is built, then shared by every call.
#[derive(Debug)]
pub(crate) struct CompiledMethod {
    pub(crate) interface: String,
    pub(crate) name: String,
    pub(crate) verb: Method,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) params: Vec<ParamDecl>,
    pub(crate) retry: RetryPolicy,
    pub(crate) auth: Arc<dyn AuthProvider>,
    pub(crate) mode: CallMode,
    pub(crate) cache_ttl: Option<Duration>,
}

impl CompiledMethod {
    /// Validates a declaration.
    ///
    /// `auth` and `retry` are the fallbacks used when the method declares none.
    pub(crate) fn compile(
        interface: &str,
        descriptor: &MethodDescriptor,
        auth: &Arc<dyn AuthProvider>,
        retry: &RetryPolicy,
    ) -> Result<Self, RestClientError> {
        let fail = |message: String| RestClientError::binding(interface, &descriptor.name, message);

        let Some(path) = descriptor.path.clone() else {
            return Err(fail("missing path template".to_string()));
        };

        let headers = descriptor
            .headers
            .iter()
            .map(|header| {
                header
                    .split_once(':')
                    .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                    .filter(|(name, _)| !name.is_empty())
                    .ok_or_else(|| fail(format!("malformed header '{header}', expected 'Name: value'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let query = descriptor
            .query
            .iter()
            .map(|pair| {
                pair.split_once('=')
                    .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                    .filter(|(key, _)| !key.is_empty())
                    .ok_or_else(|| fail(format!("malformed query pair '{pair}', expected 'key=value'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut names = IndexMap::new();
        for param in &descriptor.params {
            if names.insert(param.name(), param.kind()).is_some() {
                return Err(fail(format!("duplicate parameter '{}'", param.name())));
            }
        }
        let bodies = descriptor
            .params
            .iter()
            .filter(|param| param.kind() == ParamKind::Body)
            .count();
        if bodies > 1 {
            return Err(fail(format!("{bodies} body parameters declared, at most one allowed")));
        }

        Ok(Self {
            interface: interface.to_string(),
            name: descriptor.name.clone(),
            verb: descriptor.verb.clone(),
            path,
            headers,
            query,
            params: descriptor.params.clone(),
            retry: descriptor.retry.clone().unwrap_or_else(|| retry.clone()),
            auth: descriptor.auth.clone().unwrap_or_else(|| Arc::clone(auth)),
            mode: descriptor.mode,
            cache_ttl: descriptor.cache_ttl,
        })
    }

    pub(crate) fn has_callback(&self) -> bool {
        self.params
            .iter()
            .any(|param| param.kind() == ParamKind::Callback)
    }

    pub(crate) fn response_header_sinks(&self) -> impl Iterator<Item = &ParamDecl> + '_ {
        self.params
            .iter()
            .filter(|param| param.kind() == ParamKind::ResponseHeader)
    }

    /// Binds the arguments and assembles the request.
    ///
    /// Each binding kind tracks its own consumed keys rather than one set shared by path and
    /// query: a `{id}` path token never suppresses a Query binding keyed `id`, which is still
    /// emitted as a leftover pair. Only a static query template resolving `id` consumes it.
    pub(crate) fn build_request(
        &self,
        base_url: &str,
        args: &IndexMap<String, ArgValue>,
        serializer: &Arc<dyn Serializer>,
    ) -> Result<BuiltRequest, RestClientError> {
        let bindings = bind(&self.params, args);

        let path = resolve(
            &self.path,
            bindings.of(BindingKind::Path),
            Position::Path,
            &mut ConsumedKeys::default(),
        );
        let pairs = merge_query(
            &self.query,
            bindings.of(BindingKind::Query),
            &mut ConsumedKeys::default(),
        );
        let host = bindings
            .first(BindingKind::Host)
            .map_or_else(|| base_url.to_string(), |binding| inline_string(&binding.value));
        let url = build_url(&host, &path, &pairs)?;

        let mut headers = merge_headers(
            &self.headers,
            bindings.of(BindingKind::Header),
            &mut ConsumedKeys::default(),
        );

        let body = match bindings.first(BindingKind::Body) {
            Some(binding) => Some(encode_body(&binding.value, &mut headers, serializer.as_ref())?),
            None => None,
        };

        Ok(BuiltRequest {
            url,
            method: self.verb.clone(),
            headers,
            body,
            serializer: Arc::clone(serializer),
        })
    }
}

fn encode_body(
    value: &Value,
    headers: &mut RequestHeaders,
    serializer: &dyn Serializer,
) -> Result<Bytes, RestClientError> {
    let is_form = headers
        .get("content-type")
        .is_some_and(|content_type| {
            content_type
                .to_ascii_lowercase()
                .starts_with(mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
        });

    if let Value::String(text) = value {
        headers.insert_if_absent("Content-Type", serializer.content_type().to_string());
        return Ok(Bytes::from(text.clone()));
    }
    if is_form {
        return FormSerializer.serialize(value);
    }
    headers.insert_if_absent("Content-Type", serializer.content_type().to_string());
    serializer.serialize(value)
}
