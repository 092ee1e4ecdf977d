use std::sync::{Arc, OnceLock};
use std::time::Duration;

use bytes::Bytes;
use headers::{ContentType, HeaderMapExt};
use http::StatusCode;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use mime::Mime;
use tracing::debug;
use url::Url;

use super::{ExpectedStatusCodes, Transport, TransportFuture, truncate_body};
use crate::client::error::TransportError;
use crate::client::request::BuiltRequest;
use crate::client::response::RawResponse;
use crate::client::response::content::classify;

/// [`Transport`] backed by `reqwest`.
///
/// Async sends use a [`reqwest::Client`]. Blocking sends use a [`reqwest::blocking::Client`]
/// created on first use, so clients that never block never spawn its runtime thread.
/// Statuses outside [`ExpectedStatusCodes`] (every `2xx` by default) are reported as
/// [`TransportError::UnexpectedStatusCode`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    blocking: Arc<OnceLock<reqwest::blocking::Client>>,
    expected_status_codes: ExpectedStatusCodes,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport with default clients.
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Creates a transport using the given async client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            blocking: Arc::default(),
            expected_status_codes: ExpectedStatusCodes::default(),
            timeout: None,
        }
    }

    /// Uses the given client for blocking sends.
    #[must_use]
    pub fn with_blocking_client(mut self, client: reqwest::blocking::Client) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(client);
        self.blocking = Arc::new(cell);
        self
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the statuses considered successful.
    #[must_use]
    pub fn with_expected_status_codes(mut self, codes: ExpectedStatusCodes) -> Self {
        self.expected_status_codes = codes;
        self
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client, TransportError> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(self.blocking.get_or_init(|| client))
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &BuiltRequest) -> Result<RawResponse, TransportError> {
        let (url, headers) = wire_parts(request)?;
        let client = self.blocking_client()?;

        let mut wire = reqwest::blocking::Request::new(request.method.clone(), url);
        *wire.headers_mut() = headers;
        if self.timeout.is_some() {
            *wire.timeout_mut() = self.timeout;
        }
        if let Some(body) = &request.body {
            *wire.body_mut() = Some(reqwest::blocking::Body::from(body.to_vec()));
        }

        debug!(?wire, "sending...");
        let response = client.execute(wire)?;
        debug!(?response, "...receiving");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes()?;
        to_raw_response(status, &headers, bytes, &self.expected_status_codes)
    }

    fn send_async(&self, request: BuiltRequest) -> TransportFuture {
        let client = self.client.clone();
        let expected_status_codes = self.expected_status_codes.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let (url, headers) = wire_parts(&request)?;
            let mut wire = reqwest::Request::new(request.method.clone(), url);
            *wire.headers_mut() = headers;
            *wire.timeout_mut() = timeout;
            if let Some(body) = request.body {
                *wire.body_mut() = Some(reqwest::Body::from(body));
            }

            debug!(?wire, "sending...");
            let response = client.execute(wire).await?;
            debug!(?response, "...receiving");

            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.bytes().await?;
            to_raw_response(status, &headers, bytes, &expected_status_codes)
        })
    }
}

fn wire_parts(request: &BuiltRequest) -> Result<(Url, HeaderMap), TransportError> {
    let url = Url::parse(&request.url).map_err(|err| {
        TransportError::invalid_request(format!("invalid URL '{}': {err}", request.url))
    })?;

    let mut headers = HeaderMap::with_capacity(request.headers.len());
    for (name, value) in request.headers.iter() {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            TransportError::invalid_request(format!("invalid header name '{name}': {err}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|err| {
            TransportError::invalid_request(format!("invalid value for header '{name}': {err}"))
        })?;
        headers.insert(header_name, header_value);
    }

    Ok((url, headers))
}

fn to_raw_response(
    status: StatusCode,
    headers: &HeaderMap,
    bytes: Bytes,
    expected_status_codes: &ExpectedStatusCodes,
) -> Result<RawResponse, TransportError> {
    let status_code = status.as_u16();
    if !expected_status_codes.contains(status_code) {
        let body = truncate_body(String::from_utf8_lossy(&bytes).into_owned());
        return Err(TransportError::UnexpectedStatusCode { status_code, body });
    }

    let pairs = headers.iter().map(|(name, value)| {
        (
            name.as_str().to_string(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        )
    });
    let raw = RawResponse::new(status_code, pairs, bytes);

    Ok(match headers.typed_get::<ContentType>() {
        Some(content_type) => raw.with_content_kind(classify(&Mime::from(content_type))),
        None => raw,
    })
}

#[cfg(test)]
mod tests {
    use http::Method;
    use insta::assert_snapshot;

    use super::*;
    use crate::client::parameters::RequestHeaders;
    use crate::client::serializer::JsonSerializer;

    fn request(url: &str) -> BuiltRequest {
        BuiltRequest {
            url: url.to_string(),
            method: Method::GET,
            headers: RequestHeaders::new(),
            body: None,
            serializer: Arc::new(JsonSerializer),
        }
    }

    #[test]
    fn should_reject_relative_url_before_sending() {
        let transport = ReqwestTransport::new();

        let error = transport.send(&request("/users/42")).expect_err("relative URL");

        assert!(!error.is_retryable());
        assert_snapshot!(error, @"Invalid request: invalid URL '/users/42': relative URL without a base");
    }

    #[tokio::test]
    async fn should_reject_invalid_header_name() {
        let transport = ReqwestTransport::new();
        let mut request = request("http://localhost/");
        request.headers.insert("Bad Header", "x");

        let error = transport
            .send_async(request)
            .await
            .expect_err("invalid header");

        assert!(matches!(error, TransportError::InvalidRequest { .. }));
    }

    #[test]
    fn should_report_unexpected_status_with_body() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        let error = to_raw_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &headers,
            Bytes::from_static(b"try later"),
            &ExpectedStatusCodes::default(),
        )
        .expect_err("503");

        assert_snapshot!(error, @"Unexpected status code 503: try later");
        assert!(error.is_retryable());
    }

    #[test]
    fn should_classify_from_typed_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("image/png"));

        let raw = to_raw_response(
            StatusCode::OK,
            &headers,
            Bytes::from_static(&[1, 2]),
            &ExpectedStatusCodes::default(),
        )
        .expect("200");

        assert!(raw.is_binary());
        assert_eq!(raw.content_type(), Some("image/png"));
    }
}
