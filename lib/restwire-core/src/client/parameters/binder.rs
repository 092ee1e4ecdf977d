use indexmap::IndexMap;
use serde_json::Value;

use super::value::ArgValue;
use crate::client::descriptor::{BindingKind, ParamDecl, ParamKind};

/// A live argument attached to the request component it binds to.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamBinding {
    /// Where the value goes.
    pub kind: BindingKind,
    /// The key under which it is used (placeholder, query or header name).
    pub key: String,
    /// The Rust type of the argument.
    pub declared_type: &'static str,
    /// The argument value.
    pub value: Value,
    /// `true` when the parameter carried no binding metadata.
    pub implicit: bool,
}

/// Bindings of one call, grouped by kind, each group in declaration order.
///
/// Several bindings of a kind may share a key, e.g. repeated query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    groups: IndexMap<BindingKind, Vec<ParamBinding>>,
}

impl Bindings {
    /// All bindings of `kind`.
    pub fn of(&self, kind: BindingKind) -> &[ParamBinding] {
        self.groups.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// The first binding of `kind`.
    pub fn first(&self, kind: BindingKind) -> Option<&ParamBinding> {
        self.of(kind).first()
    }

    /// Total number of bindings.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing was bound.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, binding: ParamBinding) {
        self.groups.entry(binding.kind).or_default().push(binding);
    }
}

/// Binds the live arguments of a call to request components.
///
/// - parameters are visited in declaration order,
/// - `null` arguments and missing arguments are skipped,
/// - an empty key falls back to the parameter name,
/// - unbound parameters become query bindings keyed by their name,
/// - response header sinks and callbacks are not request bindings.
///
/// Arguments that match no declared parameter are bound as implicit query
/// parameters after the declared ones, in the order they were supplied.
pub fn bind(params: &[ParamDecl], args: &IndexMap<String, ArgValue>) -> Bindings {
    let mut result = Bindings::default();

    for param in params {
        let Some(kind) = param.kind().binding_kind() else {
            continue;
        };
        let Some(arg) = args.get(param.name()) else {
            continue;
        };
        if arg.is_null() {
            continue;
        }
        result.push(ParamBinding {
            kind,
            key: param.key().to_string(),
            declared_type: arg.declared_type,
            value: arg.value.clone(),
            implicit: param.kind() == ParamKind::Unbound,
        });
    }

    for (name, arg) in args {
        if arg.is_null() || params.iter().any(|param| param.name() == name) {
            continue;
        }
        result.push(ParamBinding {
            kind: BindingKind::Query,
            key: name.clone(),
            declared_type: arg.declared_type,
            value: arg.value.clone(),
            implicit: true,
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn args(values: &[(&str, Value)]) -> IndexMap<String, ArgValue> {
        values
            .iter()
            .map(|(name, value)| {
                (
                    (*name).to_string(),
                    ArgValue {
                        value: value.clone(),
                        declared_type: "test",
                    },
                )
            })
            .collect()
    }

    #[test]
    fn should_bind_by_kind_in_declaration_order() {
        let params = vec![
            ParamDecl::path("id"),
            ParamDecl::query("b"),
            ParamDecl::query("a"),
            ParamDecl::header("token").with_key("X-Token"),
        ];
        let args = args(&[
            ("a", json!(1)),
            ("b", json!(2)),
            ("id", json!(42)),
            ("token", json!("t")),
        ]);

        let bindings = bind(&params, &args);

        assert_eq!(bindings.len(), 4);
        assert_eq!(bindings.first(BindingKind::Path).map(|b| &b.value), Some(&json!(42)));
        let query_keys = bindings
            .of(BindingKind::Query)
            .iter()
            .map(|b| b.key.as_str())
            .collect::<Vec<_>>();
        assert_eq!(query_keys, ["b", "a"]);
        assert_eq!(
            bindings.first(BindingKind::Header).map(|b| b.key.as_str()),
            Some("X-Token")
        );
    }

    #[test]
    fn should_skip_null_and_missing_arguments() {
        let params = vec![ParamDecl::query("page"), ParamDecl::query("size")];
        let args = args(&[("page", Value::Null)]);

        let bindings = bind(&params, &args);

        assert!(bindings.is_empty());
    }

    #[test]
    fn should_treat_unbound_parameters_as_implicit_query() {
        let params = vec![ParamDecl::unbound("active"), ParamDecl::query("q")];
        let args = args(&[("active", json!(true)), ("q", json!("x")), ("extra", json!(3))]);

        let bindings = bind(&params, &args);

        let query = bindings.of(BindingKind::Query);
        assert_eq!(query.len(), 3);
        assert!(query.iter().any(|b| b.key == "active" && b.implicit));
        assert!(query.iter().any(|b| b.key == "q" && !b.implicit));
        assert!(query.iter().any(|b| b.key == "extra" && b.implicit));
    }

    #[test]
    fn should_ignore_sinks_and_callbacks() {
        let params = vec![ParamDecl::response_headers("headers"), ParamDecl::callback("done")];
        let args = args(&[("headers", json!({})), ("done", json!("cb"))]);

        let bindings = bind(&params, &args);

        assert!(bindings.is_empty());
    }

    #[test]
    fn should_allow_shared_keys() {
        let params = vec![
            ParamDecl::query("first").with_key("tag"),
            ParamDecl::query("second").with_key("tag"),
        ];
        let args = args(&[("first", json!("a")), ("second", json!("b"))]);

        let bindings = bind(&params, &args);

        assert_eq!(bindings.of(BindingKind::Query).len(), 2);
    }
}
