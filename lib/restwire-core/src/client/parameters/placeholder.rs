use std::collections::HashSet;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{Captures, Regex};
use tracing::warn;

use super::binder::ParamBinding;
use super::value::inline_string;

/// Matches `{name}`, `${name}` and `${name:default}` tokens.
static RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$?\{(?<name>[\w.\-]+)(?::(?<default>[^{}]*))?}").expect("a valid regex")
});

/// Everything but RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Where a template is resolved, which decides how substituted values are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Path segment: values are percent-encoded.
    Path,
    /// Query value: values are kept raw, the whole query string is encoded once assembled.
    Query,
    /// Header value: values are kept raw.
    Header,
}

/// Keys of the bindings substituted into a template during one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumedKeys(HashSet<String>);

impl ConsumedKeys {
    /// Returns `true` if the key was substituted somewhere.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    /// Marks a key as substituted.
    pub fn insert(&mut self, key: impl Into<String>) {
        self.0.insert(key.into());
    }

    /// Number of consumed keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing was consumed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Returns `true` if `template` contains at least one placeholder token.
pub fn has_placeholders(template: &str) -> bool {
    RE.is_match(template)
}

/// Resolves the placeholder tokens of `template`, left to right.
///
/// A token whose name matches a binding key is replaced by the first such binding's value
/// (the first element for collections) and its key is recorded in `consumed`.
/// An unmatched `${name:default}` token becomes `default`.
/// Any other unmatched token is kept verbatim.
pub fn resolve(
    template: &str,
    bindings: &[ParamBinding],
    position: Position,
    consumed: &mut ConsumedKeys,
) -> String {
    RE.replace_all(template, |caps: &Captures| {
        let name = &caps["name"];
        if let Some(binding) = bindings.iter().find(|binding| binding.key == name) {
            consumed.insert(name);
            let value = inline_string(&binding.value);
            return match position {
                Position::Path => utf8_percent_encode(&value, PATH_SEGMENT).to_string(),
                Position::Query | Position::Header => value,
            };
        }
        if let Some(default) = caps.name("default") {
            return default.as_str().to_string();
        }
        warn!(?name, ?template, "no binding for placeholder, keeping it verbatim");
        caps[0].to_string()
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use serde_json::{Value, json};

    use super::*;
    use crate::client::descriptor::BindingKind;

    fn binding(key: &str, value: Value) -> ParamBinding {
        ParamBinding {
            kind: BindingKind::Path,
            key: key.to_string(),
            declared_type: "test",
            value,
            implicit: false,
        }
    }

    #[test]
    fn should_resolve_path_placeholders() {
        let bindings = [binding("id", json!(42)), binding("slug", json!("a b/c"))];
        let mut consumed = ConsumedKeys::default();

        let result = resolve("/users/{id}/posts/{slug}", &bindings, Position::Path, &mut consumed);

        assert_snapshot!(result, @"/users/42/posts/a%20b%2Fc");
        assert!(consumed.contains("id"));
        assert!(consumed.contains("slug"));
    }

    #[test]
    fn should_support_dollar_syntax_and_repeated_tokens() {
        let bindings = [binding("id", json!("x"))];
        let mut consumed = ConsumedKeys::default();

        let result = resolve("/a/${id}/b/{id}", &bindings, Position::Path, &mut consumed);

        assert_eq!(result, "/a/x/b/x");
        assert_eq!(consumed.len(), 1);
    }

    #[test]
    fn should_keep_unmatched_tokens_verbatim() {
        let mut consumed = ConsumedKeys::default();

        let result = resolve("/users/{id}?x=${missing}", &[], Position::Path, &mut consumed);

        assert_eq!(result, "/users/{id}?x=${missing}");
        assert!(consumed.is_empty());
    }

    #[test]
    fn should_use_default_without_consuming() {
        let mut consumed = ConsumedKeys::default();

        let result = resolve("${lang:en}", &[], Position::Query, &mut consumed);

        assert_eq!(result, "en");
        assert!(consumed.is_empty());
    }

    #[test]
    fn should_prefer_binding_over_default() {
        let bindings = [binding("lang", json!("fr"))];
        let mut consumed = ConsumedKeys::default();

        let result = resolve("${lang:en}", &bindings, Position::Query, &mut consumed);

        assert_eq!(result, "fr");
        assert!(consumed.contains("lang"));
    }

    #[test]
    fn should_substitute_first_collection_element() {
        let bindings = [binding("tags", json!(["a", "b"]))];
        let mut consumed = ConsumedKeys::default();

        let result = resolve("tag:${tags}", &bindings, Position::Header, &mut consumed);

        assert_eq!(result, "tag:a");
    }

    #[test]
    fn should_not_encode_header_values() {
        let bindings = [binding("token", json!("a b/c"))];
        let mut consumed = ConsumedKeys::default();

        let result = resolve("Bearer ${token}", &bindings, Position::Header, &mut consumed);

        assert_eq!(result, "Bearer a b/c");
    }

    #[test]
    fn should_be_idempotent() {
        let bindings = [binding("id", json!(7))];
        let template = "/items/{id}/{other}";

        let first = resolve(template, &bindings, Position::Path, &mut ConsumedKeys::default());
        let second = resolve(template, &bindings, Position::Path, &mut ConsumedKeys::default());
        let again = resolve(&first, &bindings, Position::Path, &mut ConsumedKeys::default());

        assert_eq!(first, second);
        assert_eq!(first, again);
        assert_eq!(
            resolve("/plain", &[], Position::Path, &mut ConsumedKeys::default()),
            "/plain"
        );
    }

    #[test]
    fn should_detect_placeholders() {
        assert!(has_placeholders("/users/{id}"));
        assert!(has_placeholders("${x:1}"));
        assert!(!has_placeholders("/users"));
    }
}
