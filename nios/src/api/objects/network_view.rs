use super::WapiObject;
use crate::api::common::ExtAttrs;
use crate::reconcile::{AttributeMap, RemoteObject};
use serde::{Deserialize, Serialize};

/// `networkview`
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkView {
    #[serde(rename = "_ref")]
    pub reference: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_default: Option<bool>,
    #[serde(default)]
    pub extattrs: ExtAttrs,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkViewFields {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RemoteObject for NetworkView {
    fn reference(&self) -> &str {
        &self.reference
    }

    fn attributes(&self) -> AttributeMap {
        self.extattrs.to_attribute_map()
    }
}

impl WapiObject for NetworkView {
    const OBJECT_TYPE: &'static str = "networkview";
    const RETURN_FIELDS: &'static [&'static str] = &["name", "comment", "is_default", "extattrs"];
    type Fields = NetworkViewFields;
}
