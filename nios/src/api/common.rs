//! Common types and utilities for the WAPI

use crate::reconcile::AttributeMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Envelope used when `_return_as_object=1` is requested
#[derive(Debug, Deserialize)]
pub struct ResultWrapper<T> {
    pub result: T,
}

/// Error body, e.g.
/// `{"Error": "AdmConDataNotFoundError: ...", "code": "Client.Ibap.Data.NotFound", "text": "..."}`
#[derive(Debug, Deserialize)]
pub struct WapiErrorResponse {
    #[serde(rename = "Error")]
    pub error: Option<String>,
    pub code: Option<String>,
    pub text: Option<String>,
}

impl WapiErrorResponse {
    pub fn is_not_found(&self) -> bool {
        let mentions = |s: &Option<String>| s.as_deref().is_some_and(|s| s.contains("NotFound"));
        mentions(&self.code) || mentions(&self.error)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("WAPI error details: code={code:?}, text={text:?}")]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub text: Option<String>,
}

impl From<WapiErrorResponse> for ApiErrorDetails {
    fn from(resp: WapiErrorResponse) -> Self {
        Self {
            code: resp.code,
            text: resp.text.or(resp.error),
        }
    }
}

/// One extensible attribute value on the wire: `{"value": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtAttrValue {
    #[serde(with = "string_or_number")]
    pub value: String,
}

/// Extensible attributes keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtAttrs(pub BTreeMap<String, ExtAttrValue>);

impl ExtAttrs {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_attribute_map(&self) -> AttributeMap {
        AttributeMap::from_values(self.0.iter().map(|(k, v)| (k.clone(), v.value.clone())))
    }
}

impl From<&AttributeMap> for ExtAttrs {
    fn from(map: &AttributeMap) -> Self {
        Self(
            map.iter()
                .map(|(k, v)| {
                    (
                        k.clone(),
                        ExtAttrValue {
                            value: v.value.clone(),
                        },
                    )
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// `_return_fields+=a,b,c`: the object's default fields plus these
    pub fn return_fields(self, fields: &[&str]) -> Self {
        self.add("_return_fields+", fields.join(","))
    }

    /// `*Name=value`: equality match on an extensible attribute
    pub fn extattr_equals(self, name: &str, value: &str) -> Self {
        self.add(format!("*{}", name), value)
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// Extensible attribute values may come back as strings or numbers;
/// both are kept as strings.
pub mod string_or_number {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrNumber {
            String(String),
            Int(i64),
            Float(f64),
        }

        Ok(match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::String(s) => s,
            StringOrNumber::Int(i) => i.to_string(),
            StringOrNumber::Float(f) => f.to_string(),
        })
    }
}
