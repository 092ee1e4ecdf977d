use std::any::{Any, TypeId};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::content::is_json;
use super::raw::RawResponse;
use crate::client::error::RestClientError;
use crate::client::serializer::{Serializer, decode_value};

/// Decodes a raw response into the declared return type `T`.
///
/// - `Vec<u8>` and [`Bytes`] receive the body untouched, whatever its content type,
/// - `String` receives the text of any non-JSON body,
/// - an empty body decodes from `null`, so `()` and `Option<_>` work for 204 responses,
/// - anything else goes through the serializer, binary bodies being read as UTF-8 text first.
///
/// # Errors
///
/// Returns a [`RestClientError::Deserialization`] if the payload does not match `T`.
pub fn build<T>(response: &RawResponse, serializer: &dyn Serializer) -> Result<T, RestClientError>
where
    T: DeserializeOwned + 'static,
{
    if let Some(value) = raw_target::<T>(response) {
        return Ok(value);
    }

    if response.bytes().is_empty() {
        return decode_value(Value::Null, "");
    }

    let text = response.text();
    let value = if response.is_binary() {
        debug!(
            content_type = response.content_type(),
            target = std::any::type_name::<T>(),
            "decoding binary content as structured data"
        );
        serializer.deserialize(text.as_bytes())?
    } else {
        serializer.deserialize(response.bytes())?
    };
    decode_value(value, &text)
}

fn raw_target<T>(response: &RawResponse) -> Option<T>
where
    T: 'static,
{
    let target = TypeId::of::<T>();
    let boxed: Box<dyn Any> = if target == TypeId::of::<Bytes>() {
        Box::new(response.bytes().clone())
    } else if target == TypeId::of::<Vec<u8>>() {
        Box::new(response.bytes().to_vec())
    } else if target == TypeId::of::<String>() && !is_json(response.content_type()) {
        Box::new(response.text())
    } else {
        return None;
    };
    boxed.downcast::<T>().ok().map(|value| *value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;

    use super::*;
    use crate::client::serializer::JsonSerializer;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    fn response(content_type: &str, body: impl Into<Bytes>) -> RawResponse {
        RawResponse::new(200, [("content-type", content_type)], body)
    }

    #[test]
    fn should_return_raw_bytes_for_binary_content() {
        let payload = vec![0x89, b'P', b'N', b'G', 0xff, 0x00];
        let raw = response("application/octet-stream", payload.clone());

        let bytes: Vec<u8> = build(&raw, &JsonSerializer).expect("raw bytes");
        let shared: Bytes = build(&raw, &JsonSerializer).expect("raw bytes");

        assert_eq!(bytes, payload);
        assert_eq!(shared.as_ref(), payload.as_slice());
    }

    #[test]
    fn should_return_raw_bytes_even_for_json() {
        let raw = response("application/json", r#"{"id":1}"#);

        let bytes: Vec<u8> = build(&raw, &JsonSerializer).expect("raw bytes");

        assert_eq!(bytes, br#"{"id":1}"#);
    }

    #[test]
    fn should_decode_generic_containers() {
        let raw = response(
            "application/json",
            r#"{"first": [{"id": 1}], "second": [{"id": 2}, {"id": 3}]}"#,
        );

        let items: HashMap<String, Vec<Item>> = build(&raw, &JsonSerializer).expect("decoded");

        assert_eq!(items["second"], vec![Item { id: 2 }, Item { id: 3 }]);
    }

    #[test]
    fn should_return_text_for_plain_string_target() {
        let raw = response("text/plain", "hello");

        let text: String = build(&raw, &JsonSerializer).expect("text");

        assert_eq!(text, "hello");
    }

    #[test]
    fn should_decode_json_string_target() {
        let raw = response("application/json", r#""quoted""#);

        let text: String = build(&raw, &JsonSerializer).expect("text");

        assert_eq!(text, "quoted");
    }

    #[test]
    fn should_decode_empty_body_as_null() {
        let raw = RawResponse::new(204, Vec::<(&str, &str)>::new(), Bytes::new());

        build::<()>(&raw, &JsonSerializer).expect("unit");
        let missing: Option<Item> = build(&raw, &JsonSerializer).expect("none");

        assert_eq!(missing, None);
    }

    #[test]
    fn should_attempt_decoding_binary_as_structured() {
        let raw = response("application/octet-stream", r#"{"id": 9}"#);

        let item: Item = build(&raw, &JsonSerializer).expect("decoded");

        assert_eq!(item, Item { id: 9 });
    }

    #[test]
    fn should_report_mismatch() {
        let raw = response("application/json", r#"{"id": "nine"}"#);

        let error = build::<Item>(&raw, &JsonSerializer).expect_err("mismatch");

        assert!(matches!(error, RestClientError::Deserialization { ref path, .. } if path == "id"));
    }
}
