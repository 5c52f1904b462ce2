use super::WapiObject;
use crate::api::common::ExtAttrs;
use crate::reconcile::{AttributeMap, RemoteObject};
use serde::{Deserialize, Serialize};

/// `admingroup`
#[derive(Debug, Clone, Deserialize)]
pub struct AdminGroup {
    #[serde(rename = "_ref")]
    pub reference: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub disable: Option<bool>,
    #[serde(default)]
    pub superuser: Option<bool>,
    #[serde(default)]
    pub extattrs: ExtAttrs,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminGroupFields {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superuser: Option<bool>,
}

impl RemoteObject for AdminGroup {
    fn reference(&self) -> &str {
        &self.reference
    }

    fn attributes(&self) -> AttributeMap {
        self.extattrs.to_attribute_map()
    }
}

impl WapiObject for AdminGroup {
    const OBJECT_TYPE: &'static str = "admingroup";
    const RETURN_FIELDS: &'static [&'static str] =
        &["name", "comment", "disable", "superuser", "extattrs"];
    type Fields = AdminGroupFields;
}
