//! nios_network_view

use super::extensible::{optional, required_string, set_optional_string, ObjectKind};
use crate::api::{NetworkView, NetworkViewFields};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

pub struct NetworkViewKind;

impl ObjectKind for NetworkViewKind {
    type Object = NetworkView;

    const TYPE_NAME: &'static str = "nios_network_view";
    const DESCRIPTION: &'static str = "Manages a network view";

    fn attributes() -> Vec<Attribute> {
        vec![
            AttributeBuilder::new("name", AttributeType::String)
                .description("Name of the network view")
                .required()
                .build(),
            AttributeBuilder::new("comment", AttributeType::String)
                .description("Comment for the network view")
                .optional()
                .build(),
            AttributeBuilder::new("is_default", AttributeType::Bool)
                .description("Whether this is the default network view")
                .computed()
                .build(),
        ]
    }

    fn expand(config: &DynamicValue) -> Result<NetworkViewFields, Diagnostic> {
        Ok(NetworkViewFields {
            name: required_string(config, "name")?,
            comment: optional(
                config.get_optional_string(&AttributePath::new("comment")),
                "comment",
            )?,
        })
    }

    fn flatten(view: &NetworkView, state: &mut DynamicValue) -> tfplug::Result<()> {
        state.set_string(&AttributePath::new("name"), view.name.clone())?;
        set_optional_string(state, "comment", &view.comment)?;
        state.set_bool(
            &AttributePath::new("is_default"),
            view.is_default.unwrap_or(false),
        )
    }
}
