use indexmap::IndexMap;
use serde_json::Value;

use super::binder::ParamBinding;
use super::placeholder::{ConsumedKeys, Position, resolve};
use super::value::{join_scalars, scalar_to_string};

/// Ordered request headers.
///
/// Names compare case-insensitively and keep the spelling of their first insertion.
/// Inserting an existing name replaces its value in place (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    headers: IndexMap<String, (String, String)>,
}

impl RequestHeaders {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.headers.get_mut(&name.to_ascii_lowercase()) {
            Some((_, previous)) => *previous = value,
            None => {
                self.headers.insert(name.to_ascii_lowercase(), (name, value));
            }
        }
    }

    /// Sets a header only if it is not present yet.
    ///
    /// Returns `true` if the header was added.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.insert(name, value);
        true
    }

    /// Gets a header value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if the header is present.
    pub fn contains(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }

    /// Removes a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.headers
            .shift_remove(&name.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    /// Iterates over `(name, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.headers
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns `true` if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// Resolves static header templates, then adds header bindings they did not consume.
///
/// Leftover bindings never override a static header of the same name.
pub fn merge_headers(
    static_headers: &[(String, String)],
    bindings: &[ParamBinding],
    consumed: &mut ConsumedKeys,
) -> RequestHeaders {
    let mut result = RequestHeaders::new();

    for (name, template) in static_headers {
        let value = resolve(template, bindings, Position::Header, consumed);
        result.insert(name.clone(), value);
    }

    for binding in bindings {
        if consumed.contains(&binding.key) {
            continue;
        }
        result.insert_if_absent(binding.key.clone(), header_value(&binding.value));
    }

    result
}

fn header_value(value: &Value) -> String {
    match value {
        Value::Array(items) => join_scalars(items, ",").unwrap_or_else(|| value.to_string()),
        Value::Object(_) => value.to_string(),
        scalar => scalar_to_string(scalar).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::descriptor::BindingKind;

    fn header(key: &str, value: Value) -> ParamBinding {
        ParamBinding {
            kind: BindingKind::Header,
            key: key.to_string(),
            declared_type: "test",
            value,
            implicit: false,
        }
    }

    #[test]
    fn test_insert_is_case_insensitive_and_last_write_wins() {
        let mut headers = RequestHeaders::new();
        headers.insert("Content-Type", "text/plain");
        headers.insert("content-type", "application/json");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            [("Content-Type", "application/json")]
        );
    }

    #[test]
    fn test_insert_if_absent() {
        let mut headers = RequestHeaders::new();
        assert!(headers.insert_if_absent("X-Trace", "1"));
        assert!(!headers.insert_if_absent("x-trace", "2"));

        assert_eq!(headers.get("X-Trace"), Some("1"));
    }

    #[test]
    fn test_merge_resolves_templates_then_adds_leftovers() {
        let static_headers = vec![
            ("Authorization".to_string(), "Bearer ${token}".to_string()),
            ("X-Tenant".to_string(), "static".to_string()),
        ];
        let bindings = [
            header("token", json!("abc")),
            header("X-Tenant", json!("dynamic")),
            header("X-Tags", json!(["a", "b"])),
        ];
        let mut consumed = ConsumedKeys::default();

        let headers = merge_headers(&static_headers, &bindings, &mut consumed);

        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            [
                ("Authorization", "Bearer abc"),
                ("X-Tenant", "static"),
                ("X-Tags", "a,b"),
            ]
        );
    }

    #[test]
    fn test_remove_header() {
        let mut headers = RequestHeaders::new();
        headers.insert("A", "1");
        headers.insert("B", "2");

        assert_eq!(headers.remove("a"), Some("1".to_string()));
        assert_eq!(headers.iter().collect::<Vec<_>>(), [("B", "2")]);
    }
}
