use super::WapiObject;
use crate::api::common::ExtAttrs;
use crate::reconcile::{AttributeMap, RemoteObject};
use serde::{Deserialize, Serialize};

/// `adminuser`
#[derive(Debug, Clone, Deserialize)]
pub struct AdminUser {
    #[serde(rename = "_ref")]
    pub reference: String,
    pub name: String,
    #[serde(default)]
    pub admin_groups: Vec<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub disable: Option<bool>,
    #[serde(default)]
    pub extattrs: ExtAttrs,
}

/// The password is write-only; WAPI never returns it
#[derive(Clone, Serialize)]
pub struct AdminUserFields {
    pub name: String,
    pub admin_groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
}

impl std::fmt::Debug for AdminUserFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUserFields")
            .field("name", &self.name)
            .field("admin_groups", &self.admin_groups)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("email", &self.email)
            .field("comment", &self.comment)
            .field("disable", &self.disable)
            .finish()
    }
}

impl RemoteObject for AdminUser {
    fn reference(&self) -> &str {
        &self.reference
    }

    fn attributes(&self) -> AttributeMap {
        self.extattrs.to_attribute_map()
    }
}

impl WapiObject for AdminUser {
    const OBJECT_TYPE: &'static str = "adminuser";
    const RETURN_FIELDS: &'static [&'static str] = &[
        "name",
        "admin_groups",
        "email",
        "comment",
        "disable",
        "extattrs",
    ];
    type Fields = AdminUserFields;
}
