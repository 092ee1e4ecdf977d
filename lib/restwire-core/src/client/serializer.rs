use std::fmt;

use bytes::Bytes;
use mime::Mime;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::RestClientError;
use super::parameters::query::flatten_object;

/// Encodes request bodies and decodes response bodies.
///
/// Decoding goes through a [`serde_json::Value`], the typed conversion happens afterwards
/// with [`decode_value`], so any `DeserializeOwned` type works, generic containers included.
pub trait Serializer: Send + Sync + fmt::Debug {
    /// The content type sent with encoded bodies.
    fn content_type(&self) -> Mime;

    /// Encodes a body.
    ///
    /// # Errors
    ///
    /// Returns a [`RestClientError::SerializationError`] if the value cannot be encoded.
    fn serialize(&self, value: &Value) -> Result<Bytes, RestClientError>;

    /// Decodes a body.
    ///
    /// # Errors
    ///
    /// Returns a [`RestClientError::Deserialization`] if the payload is malformed.
    fn deserialize(&self, bytes: &[u8]) -> Result<Value, RestClientError>;
}

/// JSON bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn content_type(&self) -> Mime {
        mime::APPLICATION_JSON
    }

    fn serialize(&self, value: &Value) -> Result<Bytes, RestClientError> {
        let bytes = serde_json::to_vec(value).map_err(|err| RestClientError::SerializationError {
            message: format!("failed to encode JSON body: {err}"),
        })?;
        Ok(Bytes::from(bytes))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, RestClientError> {
        let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
        serde_path_to_error::deserialize(deserializer).map_err(|err| {
            RestClientError::Deserialization {
                path: err.path().to_string(),
                error: err.into_inner(),
                body: String::from_utf8_lossy(bytes).into_owned(),
            }
        })
    }
}

/// `application/x-www-form-urlencoded` bodies.
///
/// Only objects can be encoded, their fields are flattened one level like query objects.
/// Decoding yields an object of string values.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormSerializer;

impl Serializer for FormSerializer {
    fn content_type(&self) -> Mime {
        mime::APPLICATION_WWW_FORM_URLENCODED
    }

    fn serialize(&self, value: &Value) -> Result<Bytes, RestClientError> {
        if !value.is_object() {
            return Err(RestClientError::UnsupportedParameterValue {
                message: "form bodies must be objects".to_string(),
                value: value.clone(),
            });
        }
        let pairs = flatten_object(value);
        let encoded = serde_urlencoded::to_string(pairs)?;
        Ok(Bytes::from(encoded))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, RestClientError> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_bytes(bytes).map_err(|err| RestClientError::SerializationError {
                message: format!("failed to decode form body: {err}"),
            })?;
        let fields = pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        Ok(Value::Object(fields))
    }
}

/// Converts a decoded value into the target type, reporting the failing path.
///
/// # Errors
///
/// Returns a [`RestClientError::Deserialization`] on type mismatch, with `body` as context.
pub fn decode_value<T>(value: Value, body: &str) -> Result<T, RestClientError>
where
    T: DeserializeOwned,
{
    serde_path_to_error::deserialize(value).map_err(|err| RestClientError::Deserialization {
        path: err.path().to_string(),
        error: err.into_inner(),
        body: body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u32,
        name: String,
    }

    #[test]
    fn test_json_roundtrip() {
        let bytes = JsonSerializer
            .serialize(&json!({"id": 1, "name": "ann"}))
            .expect("encodable");
        let value = JsonSerializer.deserialize(&bytes).expect("decodable");

        let user: User = decode_value(value, "").expect("a user");
        assert_eq!(
            user,
            User {
                id: 1,
                name: "ann".to_string()
            }
        );
    }

    #[test]
    fn test_decode_reports_path() {
        let error = decode_value::<Vec<User>>(json!([{"id": 1, "name": "a"}, {"id": "x", "name": "b"}]), "<body>")
            .expect_err("type mismatch");

        assert_snapshot!(error.to_string(), @r#"
        Failed to deserialize response at '[1].id': invalid type: string "x", expected u32
        <body>
        "#);
    }

    #[test]
    fn test_malformed_json() {
        let error = JsonSerializer
            .deserialize(b"{not json")
            .expect_err("malformed");

        assert!(matches!(error, RestClientError::Deserialization { .. }));
    }

    #[test]
    fn test_form_encoding() {
        let bytes = FormSerializer
            .serialize(&json!({"user": "ann", "tags": ["a", "b"], "skip": null}))
            .expect("encodable");

        assert_eq!(&bytes[..], b"user=ann&tags=a%2Cb");
        assert_eq!(
            FormSerializer.deserialize(&bytes).expect("decodable"),
            json!({"user": "ann", "tags": "a,b"})
        );
    }

    #[test]
    fn test_form_rejects_scalars() {
        let error = FormSerializer.serialize(&json!(3)).expect_err("not an object");

        assert!(matches!(error, RestClientError::UnsupportedParameterValue { .. }));
    }
}
