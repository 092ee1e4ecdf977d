use bytes::Bytes;
use indexmap::IndexMap;

use super::content::{ContentKind, classify_header};

/// Raw response data as received by a transport.
///
/// Header names are stored lowercased, repeated headers are joined with `", "`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    headers: IndexMap<String, String>,
    bytes: Bytes,
    is_binary: bool,
}

impl RawResponse {
    /// Creates a response, classifying its body from the `Content-Type` header.
    pub fn new<I, K, V>(status: u16, headers: I, bytes: impl Into<Bytes>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut collected = IndexMap::<String, String>::new();
        for (name, value) in headers {
            let name = name.as_ref().to_ascii_lowercase();
            let value = value.into();
            collected
                .entry(name)
                .and_modify(|previous| {
                    previous.push_str(", ");
                    previous.push_str(&value);
                })
                .or_insert_with(|| value.clone());
        }
        let is_binary =
            classify_header(collected.get("content-type").map(String::as_str)).is_binary();
        Self {
            status,
            headers: collected,
            bytes: bytes.into(),
            is_binary,
        }
    }

    /// Overrides the classification derived from the raw header.
    pub(crate) fn with_content_kind(mut self, kind: ContentKind) -> Self {
        self.is_binary = kind.is_binary();
        self
    }

    /// The HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// All headers, names lowercased.
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// A header value, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The body bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// The body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Returns `true` if the content type denotes binary data.
    pub fn is_binary(&self) -> bool {
        self.is_binary
    }
}
