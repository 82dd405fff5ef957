//! Response envelope rules.
//!
//! The API is not consistent about where a resource lives in the response
//! body. Collections are usually HAL-embedded, organizations sit under
//! `data`, and most single resources are the body itself. Each operation
//! names its rule explicitly; nothing is inferred.

use serde_json::Value;

use crate::error::ApiError;

/// Where the payload sits inside a successful response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// The whole body.
    Raw,
    /// `body["data"]`.
    Data,
    /// `body["_embedded"]["hal:<rel>"]`.
    Embedded(&'static str),
}

impl Envelope {
    /// Dotted path of the key this envelope unwraps, for diagnostics.
    pub fn key(&self) -> String {
        match self {
            Envelope::Raw => String::new(),
            Envelope::Data => "data".to_string(),
            Envelope::Embedded(rel) => format!("_embedded.hal:{rel}"),
        }
    }

    /// Take the payload out of `body`.
    pub fn unwrap(&self, mut body: Value) -> Result<Value, ApiError> {
        let found = match self {
            Envelope::Raw => return Ok(body),
            Envelope::Data => body.get_mut("data").map(Value::take),
            Envelope::Embedded(rel) => body
                .get_mut("_embedded")
                .and_then(|embedded| embedded.get_mut(format!("hal:{rel}")))
                .map(Value::take),
        };
        found.ok_or_else(|| ApiError::MissingEnvelope { key: self.key() })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn raw_returns_whole_body() {
        let body = json!({"nid": 5, "title": "Call your MP"});
        assert_eq!(Envelope::Raw.unwrap(body.clone()).unwrap(), body);
    }

    #[test]
    fn data_unwraps_data_key() {
        let body = json!({"data": [{"id": 1}], "meta": {}});
        assert_eq!(Envelope::Data.unwrap(body).unwrap(), json!([{"id": 1}]));
    }

    #[test]
    fn embedded_unwraps_hal_relation() {
        let body = json!({
            "_links": {"self": {"href": "/tool"}},
            "_embedded": {"hal:tool": [{"nid": 1}, {"nid": 2}]}
        });
        assert_eq!(
            Envelope::Embedded("tool").unwrap(body).unwrap(),
            json!([{"nid": 1}, {"nid": 2}])
        );
    }

    #[test]
    fn embedded_with_wrong_relation_is_missing() {
        let body = json!({"_embedded": {"hal:campaign": []}});
        let err = Envelope::Embedded("tool").unwrap(body).unwrap_err();
        assert!(matches!(err, ApiError::MissingEnvelope { key } if key == "_embedded.hal:tool"));
    }

    #[test]
    fn data_missing_on_non_object_body() {
        let err = Envelope::Data.unwrap(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ApiError::MissingEnvelope { key } if key == "data"));
    }
}
