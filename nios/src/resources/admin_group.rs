//! nios_admin_group

use super::extensible::{optional, required_string, set_optional_bool, set_optional_string, ObjectKind};
use crate::api::{AdminGroup, AdminGroupFields};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

pub struct AdminGroupKind;

impl ObjectKind for AdminGroupKind {
    type Object = AdminGroup;

    const TYPE_NAME: &'static str = "nios_admin_group";
    const DESCRIPTION: &'static str = "Manages an admin group";

    fn attributes() -> Vec<Attribute> {
        vec![
            AttributeBuilder::new("name", AttributeType::String)
                .description("Name of the admin group")
                .required()
                .build(),
            AttributeBuilder::new("comment", AttributeType::String)
                .description("Comment for the admin group")
                .optional()
                .build(),
            AttributeBuilder::new("disable", AttributeType::Bool)
                .description("Whether the admin group is disabled")
                .optional()
                .build(),
            AttributeBuilder::new("superuser", AttributeType::Bool)
                .description("Whether members of the group are superusers")
                .optional()
                .build(),
        ]
    }

    fn expand(config: &DynamicValue) -> Result<AdminGroupFields, Diagnostic> {
        Ok(AdminGroupFields {
            name: required_string(config, "name")?,
            comment: optional(
                config.get_optional_string(&AttributePath::new("comment")),
                "comment",
            )?,
            disable: optional(
                config.get_optional_bool(&AttributePath::new("disable")),
                "disable",
            )?,
            superuser: optional(
                config.get_optional_bool(&AttributePath::new("superuser")),
                "superuser",
            )?,
        })
    }

    fn flatten(group: &AdminGroup, state: &mut DynamicValue) -> tfplug::Result<()> {
        state.set_string(&AttributePath::new("name"), group.name.clone())?;
        set_optional_string(state, "comment", &group.comment)?;
        set_optional_bool(state, "disable", group.disable)?;
        set_optional_bool(state, "superuser", group.superuser)
    }
}
