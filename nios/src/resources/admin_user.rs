//! nios_admin_user

use super::extensible::{optional, required_string, set_optional_bool, set_optional_string, ObjectKind};
use crate::api::{AdminUser, AdminUserFields};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

pub struct AdminUserKind;

impl ObjectKind for AdminUserKind {
    type Object = AdminUser;

    const TYPE_NAME: &'static str = "nios_admin_user";
    const DESCRIPTION: &'static str = "Manages an admin user account";

    fn attributes() -> Vec<Attribute> {
        vec![
            AttributeBuilder::new("name", AttributeType::String)
                .description("Login name of the admin user")
                .required()
                .build(),
            AttributeBuilder::new("admin_groups", AttributeType::List(Box::new(AttributeType::String)))
                .description("Admin groups the user belongs to")
                .required()
                .build(),
            AttributeBuilder::new("password", AttributeType::String)
                .description("Login password. Never read back from the appliance.")
                .optional()
                .sensitive()
                .build(),
            AttributeBuilder::new("email", AttributeType::String)
                .description("Email address of the admin user")
                .optional()
                .build(),
            AttributeBuilder::new("comment", AttributeType::String)
                .description("Comment for the admin user")
                .optional()
                .build(),
            AttributeBuilder::new("disable", AttributeType::Bool)
                .description("Whether the admin user is disabled")
                .optional()
                .build(),
        ]
    }

    fn expand(config: &DynamicValue) -> Result<AdminUserFields, Diagnostic> {
        let admin_groups = optional(
            config.get_optional_string_list(&AttributePath::new("admin_groups")),
            "admin_groups",
        )?
        .filter(|groups| !groups.is_empty())
        .ok_or_else(|| {
            Diagnostic::error(
                "Missing admin_groups",
                "An admin user must belong to at least one admin group",
            )
            .with_attribute(AttributePath::new("admin_groups"))
        })?;

        Ok(AdminUserFields {
            name: required_string(config, "name")?,
            admin_groups,
            password: optional(
                config.get_optional_string(&AttributePath::new("password")),
                "password",
            )?,
            email: optional(
                config.get_optional_string(&AttributePath::new("email")),
                "email",
            )?,
            comment: optional(
                config.get_optional_string(&AttributePath::new("comment")),
                "comment",
            )?,
            disable: optional(
                config.get_optional_bool(&AttributePath::new("disable")),
                "disable",
            )?,
        })
    }

    fn flatten(user: &AdminUser, state: &mut DynamicValue) -> tfplug::Result<()> {
        state.set_string(&AttributePath::new("name"), user.name.clone())?;
        state.set_list(
            &AttributePath::new("admin_groups"),
            user.admin_groups
                .iter()
                .cloned()
                .map(Dynamic::String)
                .collect(),
        )?;
        set_optional_string(state, "email", &user.email)?;
        set_optional_string(state, "comment", &user.comment)?;
        set_optional_bool(state, "disable", user.disable)
    }
}
