use std::fmt::Debug;

use serde::Serialize;
use serde_json::Value;

use crate::client::error::RestClientError;

/// An argument supplied to an [`Invocation`](crate::Invocation), captured as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgValue {
    /// The serialized value.
    pub value: Value,
    /// The Rust type the value was supplied as.
    pub declared_type: &'static str,
}

impl ArgValue {
    /// Serializes `value` into an argument.
    ///
    /// # Errors
    ///
    /// Returns a [`RestClientError::SerializationError`] if the value cannot be represented as JSON.
    pub fn new<T>(value: &T) -> Result<Self, RestClientError>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value).map_err(|err| RestClientError::SerializationError {
            message: format!(
                "failed to serialize argument of type {}: {err}",
                std::any::type_name::<T>()
            ),
        })?;
        Ok(Self {
            value,
            declared_type: std::any::type_name::<T>(),
        })
    }

    /// `None` and unit arguments serialize to `null` and are never bound.
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

/// Converts a scalar JSON value to its wire string.
///
/// Returns `None` for arrays and objects.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// The string used when a value is substituted inline into a template.
///
/// Collections contribute their first element, objects their compact JSON text.
pub(crate) fn inline_string(value: &Value) -> String {
    match value {
        Value::Array(items) => items.first().map(inline_string).unwrap_or_default(),
        Value::Object(_) => value.to_string(),
        scalar => scalar_to_string(scalar).unwrap_or_default(),
    }
}

/// Joins the scalar items of a collection with `delimiter`.
///
/// Returns `None` if any item is itself a collection or an object.
pub(crate) fn join_scalars(items: &[Value], delimiter: &str) -> Option<String> {
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        result.push(scalar_to_string(item)?);
    }
    Some(result.join(delimiter))
}
