use serde_json::Value;

use super::binder::ParamBinding;
use super::placeholder::{ConsumedKeys, Position, resolve};
use super::value::{join_scalars, scalar_to_string};
use crate::client::error::RestClientError;

/// Merges static query pairs with the dynamic query bindings of a call.
///
/// Static values are resolved first and consume the bindings they reference.
/// Every binding left unconsumed then contributes its own pairs:
/// - a collection emits one pair per element,
/// - an object emits one pair per simple field (see [`flatten_object`]),
/// - anything else emits a single pair.
pub fn merge_query(
    static_pairs: &[(String, String)],
    bindings: &[ParamBinding],
    consumed: &mut ConsumedKeys,
) -> Vec<(String, String)> {
    let mut result = Vec::with_capacity(static_pairs.len() + bindings.len());

    for (key, template) in static_pairs {
        let value = resolve(template, bindings, Position::Query, consumed);
        result.push((key.clone(), value));
    }

    for binding in bindings {
        if consumed.contains(&binding.key) {
            continue;
        }
        leftover_pairs(&binding.key, &binding.value, &mut result);
    }

    result
}

fn leftover_pairs(key: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Array(items) => {
            for item in items {
                let item = scalar_to_string(item).unwrap_or_else(|| item.to_string());
                pairs.push((key.to_string(), item));
            }
        }
        Value::Object(_) => pairs.extend(flatten_object(value)),
        scalar => {
            if let Some(text) = scalar_to_string(scalar) {
                pairs.push((key.to_string(), text));
            }
        }
    }
}

/// Flattens one level of an object into query pairs named after its fields.
///
/// Null fields and nested objects are skipped, collections of scalars are comma-joined,
/// collections holding objects are skipped.
pub fn flatten_object(value: &Value) -> Vec<(String, String)> {
    let Value::Object(fields) = value else {
        return vec![];
    };
    fields
        .iter()
        .filter_map(|(name, field)| {
            let text = match field {
                Value::Null | Value::Object(_) => return None,
                Value::Array(items) if items.is_empty() => return None,
                Value::Array(items) => join_scalars(items, ",")?,
                scalar => scalar_to_string(scalar)?,
            };
            Some((name.clone(), text))
        })
        .collect()
}

/// Builds the final URL: `host + path`, followed by `?` and the encoded pairs if there are any.
///
/// # Errors
///
/// Returns a [`RestClientError::QuerySerializationError`] if the pairs cannot be encoded.
pub fn build_url(host: &str, path: &str, pairs: &[(String, String)]) -> Result<String, RestClientError> {
    let mut url = join_host_and_path(host, path);
    if !pairs.is_empty() {
        let query = serde_urlencoded::to_string(pairs)?;
        url.push('?');
        url.push_str(&query);
    }
    Ok(url)
}

fn join_host_and_path(host: &str, path: &str) -> String {
    if host.is_empty() {
        return path.to_string();
    }
    if path.is_empty() {
        return host.to_string();
    }
    let host = host.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{host}/{path}")
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use serde_json::json;

    use super::*;
    use crate::client::descriptor::BindingKind;

    fn query(key: &str, value: Value) -> ParamBinding {
        ParamBinding {
            kind: BindingKind::Query,
            key: key.to_string(),
            declared_type: "test",
            value,
            implicit: false,
        }
    }

    fn url_for(static_pairs: &[(&str, &str)], bindings: &[ParamBinding]) -> String {
        let static_pairs = static_pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<Vec<_>>();
        let mut consumed = ConsumedKeys::default();
        let pairs = merge_query(&static_pairs, bindings, &mut consumed);
        build_url("", "/search", &pairs).expect("encodable")
    }

    #[test]
    fn should_expand_collections_into_repeated_pairs() {
        let url = url_for(&[], &[query("tags", json!(["a", "b"]))]);

        assert_snapshot!(url, @"/search?tags=a&tags=b");
    }

    #[test]
    fn should_not_duplicate_consumed_keys() {
        let url = url_for(&[("active", "${active}")], &[query("active", json!(true))]);

        assert_snapshot!(url, @"/search?active=true");
    }

    #[test]
    fn should_keep_static_pairs_first() {
        let url = url_for(
            &[("lang", "${lang:en}"), ("v", "2")],
            &[query("q", json!("rust & co"))],
        );

        assert_snapshot!(url, @"/search?lang=en&v=2&q=rust+%26+co");
    }

    #[test]
    fn should_flatten_objects_one_level() {
        let filter = json!({
            "name": "ann",
            "age": 30,
            "nickname": null,
            "roles": ["admin", "dev"],
            "address": { "city": "Paris" },
            "pets": [{ "name": "rex" }],
        });

        let url = url_for(&[], &[query("filter", filter)]);

        assert_snapshot!(url, @"/search?name=ann&age=30&roles=admin%2Cdev");
    }

    #[test]
    fn should_omit_question_mark_without_pairs() {
        let url = url_for(&[], &[query("empty", json!([]))]);

        assert_eq!(url, "/search");
    }

    #[test]
    fn should_join_host_and_path() {
        assert_eq!(
            build_url("http://api.test/v1/", "/users", &[]).expect("encodable"),
            "http://api.test/v1/users"
        );
        assert_eq!(
            build_url("http://api.test", "users", &[]).expect("encodable"),
            "http://api.test/users"
        );
        assert_eq!(
            build_url("http://api.test", "", &[]).expect("encodable"),
            "http://api.test"
        );
    }
}
