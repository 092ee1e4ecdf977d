use std::fmt;
use std::time::Duration;

use xxhash_rust::xxh64::Xxh64;

use super::request::BuiltRequest;
use super::response::RawResponse;

/// Key of a cached response: `restwire:<interface>:<method>:<hash>`.
///
/// The hash is the XXH64 (seed 0) of the verb, the URL, the headers (names lowercased) and the
/// body of the built request, each field terminated by a NUL byte. It does not depend on the
/// process or the toolchain, so shared caches see the same key from every client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub struct CacheKey(String);

impl CacheKey {
    pub(crate) fn for_request(interface: &str, method: &str, request: &BuiltRequest) -> Self {
        let mut hasher = Xxh64::new(0);
        let mut field = |bytes: &[u8]| {
            hasher.update(bytes);
            hasher.update(&[0]);
        };
        field(request.method.as_str().as_bytes());
        field(request.url.as_bytes());
        for (name, value) in request.headers.iter() {
            field(name.to_ascii_lowercase().as_bytes());
            field(value.as_bytes());
        }
        if let Some(body) = &request.body {
            hasher.update(body);
        }
        Self(format!("restwire:{interface}:{method}:{:016x}", hasher.digest()))
    }

    /// The key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Storage for responses of cacheable methods.
///
/// Only successful raw responses are stored; decoding, header sinks and validation run
/// on cache hits as they do on fresh responses.
pub trait ResponseCache: Send + Sync + fmt::Debug {
    /// A live entry, if any.
    fn get(&self, key: &CacheKey) -> Option<RawResponse>;

    /// Stores an entry for `ttl`.
    fn put(&self, key: CacheKey, response: RawResponse, ttl: Duration);
}
