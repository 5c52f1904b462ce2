//! Terraform provider for NIOS objects carrying extensible attributes.
//!
//! Every resource keeps a hidden correlation tag on its object so it can be
//! found again after the object's reference changes, and keeps attributes the
//! appliance inherited out of the user-visible attribute map.

pub mod api;
pub mod config;
pub mod provider_data;
pub mod reconcile;
pub mod resources;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, Provider, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory,
};
use tfplug::resource::ProviderResource;
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::Diagnostic;

use config::ProviderConfig;
use provider_data::NiosProviderData;
use resources::{AdminGroupResource, AdminUserResource, NetworkViewResource};

#[derive(Default)]
pub struct NiosProvider {
    provider_data: Option<NiosProviderData>,
}

impl NiosProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.provider_data.is_some()
    }
}

fn factory<R: ProviderResource + Default + 'static>() -> ResourceFactory {
    Box::new(|| Box::new(R::default()) as Box<dyn ProviderResource>)
}

#[async_trait]
impl Provider for NiosProvider {
    fn type_name(&self) -> &str {
        "nios"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manages NIOS objects through the WAPI")
            .attribute(
                AttributeBuilder::new("endpoint", AttributeType::String)
                    .description("Grid Master URL. Can also be set with NIOS_HOST.")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("username", AttributeType::String)
                    .description("WAPI username. Can also be set with NIOS_USERNAME.")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("password", AttributeType::String)
                    .description("WAPI password. Can also be set with NIOS_PASSWORD.")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("wapi_version", AttributeType::String)
                    .description("WAPI version, defaults to 2.12. Can also be set with NIOS_WAPI_VERSION.")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("insecure", AttributeType::Bool)
                    .description("Skip TLS certificate verification. Can also be set with NIOS_INSECURE.")
                    .optional()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let config = match ProviderConfig::resolve(&request.config) {
            Ok(config) => config,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        };

        match config.client() {
            Ok(client) => {
                tracing::info!(
                    "Configured NIOS provider for {} (WAPI v{})",
                    config.endpoint,
                    config.wapi_version
                );
                let data = NiosProviderData::new(client);
                self.provider_data = Some(data.clone());
                ConfigureProviderResponse {
                    diagnostics: vec![],
                    provider_data: Some(Arc::new(data)),
                }
            }
            Err(e) => ConfigureProviderResponse {
                diagnostics: vec![Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                )],
                provider_data: None,
            },
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        HashMap::from([
            (
                "nios_admin_group".to_string(),
                factory::<AdminGroupResource>(),
            ),
            ("nios_admin_user".to_string(), factory::<AdminUserResource>()),
            (
                "nios_network_view".to_string(),
                factory::<NetworkViewResource>(),
            ),
        ])
    }
}
