//! One resource implementation shared by every object kind that carries
//! extensible attributes.
//!
//! State layout:
//! - `ref`: the object's current reference (computed)
//! - `extattrs`: attributes the user declared
//! - `extattrs_all`: every attribute last seen on the object, including those
//!   the appliance filled in and the correlation tag (computed)

use crate::api::{WapiCollection, WapiObject};
use crate::provider_data::NiosProviderData;
use crate::reconcile::{
    AttributeMap, ManagedObjectRecord, ReadOutcome, ReconcileError, Reconciled, Reconciler,
    TagMinter, TaggedValue, UuidMinter, CORRELATION_TAG_KEY,
};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource,
    ReadResourceRequest, ReadResourceResponse, Resource, ResourceSchemaRequest,
    ResourceSchemaResponse, ResourceWithConfigure, ResourceWithImportState,
    UpdateResourceRequest, UpdateResourceResponse, ValidateResourceConfigRequest,
    ValidateResourceConfigResponse,
};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

/// Per-object-type behaviour plugged into [`ExtensibleResource`]
pub trait ObjectKind: Send + Sync + 'static {
    type Object: WapiObject;

    /// Terraform resource type, e.g. `nios_admin_group`
    const TYPE_NAME: &'static str;
    const DESCRIPTION: &'static str;

    /// Schema attributes besides `ref`, `extattrs` and `extattrs_all`
    fn attributes() -> Vec<Attribute>;

    /// Configuration to request fields
    fn expand(config: &DynamicValue) -> Result<<Self::Object as WapiObject>::Fields, Diagnostic>;

    /// Object fields to state. Write-only attributes are left as they are.
    fn flatten(object: &Self::Object, state: &mut DynamicValue) -> tfplug::Result<()>;
}

pub struct ExtensibleResource<K: ObjectKind> {
    provider_data: Option<NiosProviderData>,
    minter: Arc<dyn TagMinter>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ObjectKind> Default for ExtensibleResource<K> {
    fn default() -> Self {
        Self::with_minter(Arc::new(UuidMinter))
    }
}

impl<K: ObjectKind> ExtensibleResource<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_minter(minter: Arc<dyn TagMinter>) -> Self {
        Self {
            provider_data: None,
            minter,
            _kind: PhantomData,
        }
    }

    fn reconciler(
        &self,
    ) -> Result<Reconciler<WapiCollection<K::Object>, Arc<dyn TagMinter>>, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(|| {
            Diagnostic::error(
                "Provider not configured",
                "Provider data was not properly configured",
            )
        })?;
        let collection = WapiCollection::new(data.client.as_ref().clone());
        Ok(Reconciler::with_minter(collection, self.minter.clone()))
    }

    fn build_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description(K::DESCRIPTION)
            .attribute(
                AttributeBuilder::new("ref", AttributeType::String)
                    .description("Current WAPI reference of the object")
                    .computed()
                    .build(),
            )
            .attributes(K::attributes())
            .attribute(
                AttributeBuilder::new("extattrs", AttributeType::Map(Box::new(AttributeType::String)))
                    .description("Extensible attributes managed by this resource")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "extattrs_all",
                    AttributeType::Map(Box::new(AttributeType::String)),
                )
                .description(
                    "All extensible attributes on the object, including inherited ones",
                )
                .computed()
                .build(),
            )
            .build()
    }
}

fn extattrs_path() -> AttributePath {
    AttributePath::new("extattrs")
}

fn extattrs_all_path() -> AttributePath {
    AttributePath::new("extattrs_all")
}

fn invalid_state(e: tfplug::TfplugError) -> Diagnostic {
    Diagnostic::error("Invalid resource state", e.to_string())
}

fn failure(action: &str, type_name: &str, e: &ReconcileError) -> Diagnostic {
    Diagnostic::error(format!("Failed to {} {}", action, type_name), e.to_string())
}

/// The attributes the user declared in configuration
pub(crate) fn declared_attributes(config: &DynamicValue) -> Result<AttributeMap, Diagnostic> {
    config
        .get_string_map(&extattrs_path())
        .map(AttributeMap::from)
        .map_err(|e| Diagnostic::error("Invalid extattrs", e.to_string()).with_attribute(extattrs_path()))
}

/// Rebuilds the persisted record. The correlation tag is kept only in
/// `extattrs_all` but belongs to the explicit set.
pub(crate) fn record_from_state(state: &DynamicValue) -> tfplug::Result<ManagedObjectRecord> {
    let reference = state.get_string(&AttributePath::new("ref"))?;
    let all = state.get_string_map(&extattrs_all_path())?;

    let mut explicit = AttributeMap::from(state.get_string_map(&extattrs_path())?);
    if let Some(tag) = all.get(CORRELATION_TAG_KEY).filter(|t| !t.is_empty()) {
        explicit.insert_explicit(CORRELATION_TAG_KEY, tag.as_str());
    }

    let full = all
        .into_iter()
        .map(|(key, value)| {
            let tagged = if explicit.contains_key(&key) {
                TaggedValue::explicit(value)
            } else {
                TaggedValue::inherited(value)
            };
            (key, tagged)
        })
        .collect();

    Ok(ManagedObjectRecord {
        reference,
        explicit,
        full,
    })
}

/// Writes the record into state. The correlation tag stays out of `extattrs`
/// so it never shows up in a diff against configuration.
pub(crate) fn write_record(
    state: &mut DynamicValue,
    record: &ManagedObjectRecord,
) -> tfplug::Result<()> {
    state.set_string(&AttributePath::new("ref"), record.reference.clone())?;

    let declared = record.explicit.without_correlation_tag();
    if declared.is_empty() {
        state.set_null(&extattrs_path())?;
    } else {
        state.set_string_map(&extattrs_path(), &declared.values())?;
    }
    state.set_string_map(&extattrs_all_path(), &record.full.values())
}

/// Absent optional values are written as null so they match an unset
/// configuration attribute
pub(crate) fn set_optional_string(
    state: &mut DynamicValue,
    name: &str,
    value: &Option<String>,
) -> tfplug::Result<()> {
    let path = AttributePath::new(name);
    match value {
        Some(v) => state.set_string(&path, v.clone()),
        None => state.set_null(&path),
    }
}

pub(crate) fn set_optional_bool(
    state: &mut DynamicValue,
    name: &str,
    value: Option<bool>,
) -> tfplug::Result<()> {
    let path = AttributePath::new(name);
    match value {
        Some(v) => state.set_bool(&path, v),
        None => state.set_null(&path),
    }
}

pub(crate) fn required_string(config: &DynamicValue, name: &str) -> Result<String, Diagnostic> {
    config.get_string(&AttributePath::new(name)).map_err(|_| {
        Diagnostic::error(
            format!("Missing {}", name),
            format!("The '{}' attribute is required", name),
        )
        .with_attribute(AttributePath::new(name))
    })
}

pub(crate) fn optional<T>(
    value: tfplug::Result<Option<T>>,
    name: &str,
) -> Result<Option<T>, Diagnostic> {
    value.map_err(|e| {
        Diagnostic::error(format!("Invalid {}", name), e.to_string())
            .with_attribute(AttributePath::new(name))
    })
}

fn write_state<K: ObjectKind>(
    state: &mut DynamicValue,
    reconciled: &Reconciled<K::Object>,
) -> tfplug::Result<()> {
    K::flatten(&reconciled.object, state)?;
    write_record(state, &reconciled.record)
}

#[async_trait]
impl<K: ObjectKind> Resource for ExtensibleResource<K> {
    fn type_name(&self) -> &str {
        K::TYPE_NAME
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: Self::build_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        // Unknown values are checked again at apply time
        if let Ok(declared) = request.config.get_string_map(&extattrs_path()) {
            if declared.contains_key(CORRELATION_TAG_KEY) {
                diagnostics.push(
                    Diagnostic::error(
                        "Reserved extensible attribute",
                        format!(
                            "\"{}\" is managed by the provider and cannot be set",
                            CORRELATION_TAG_KEY
                        ),
                    )
                    .with_attribute(extattrs_path().key(CORRELATION_TAG_KEY)),
                );
            }
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = vec![];

        let prepared = self.reconciler().and_then(|reconciler| {
            let fields = K::expand(&request.config)?;
            let declared = declared_attributes(&request.config)?;
            Ok((reconciler, fields, declared))
        });
        let (reconciler, fields, declared) = match prepared {
            Ok(prepared) => prepared,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    private: vec![],
                    diagnostics,
                };
            }
        };

        match reconciler.reconcile_create(&ctx, &fields, &declared).await {
            Ok(reconciled) => {
                let mut new_state = request.planned_state;
                if let Err(e) = write_state::<K>(&mut new_state, &reconciled) {
                    diagnostics.push(invalid_state(e));
                }
                CreateResourceResponse {
                    new_state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(failure("create", K::TYPE_NAME, &e));
                CreateResourceResponse {
                    new_state: DynamicValue::null(),
                    private: vec![],
                    diagnostics,
                }
            }
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let record = match record_from_state(&request.current_state) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Dropping {} with unreadable state: {}", K::TYPE_NAME, e);
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                };
            }
        };

        let reconciler = match self.reconciler() {
            Ok(reconciler) => reconciler,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                };
            }
        };

        match reconciler.reconcile_read(&ctx, &record).await {
            Ok(ReadOutcome::Present(reconciled)) => {
                let mut new_state = request.current_state.clone();
                if let Err(e) = write_state::<K>(&mut new_state, &reconciled) {
                    diagnostics.push(invalid_state(e));
                    new_state = request.current_state;
                }
                ReadResourceResponse {
                    new_state: Some(new_state),
                    diagnostics,
                    private: request.private,
                }
            }
            Ok(ReadOutcome::Deleted) => {
                tracing::info!(
                    "{} {} no longer exists, removing from state",
                    K::TYPE_NAME,
                    record.reference
                );
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(failure("read", K::TYPE_NAME, &e));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                }
            }
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let prepared = self.reconciler().and_then(|reconciler| {
            let record = record_from_state(&request.prior_state).map_err(invalid_state)?;
            let fields = K::expand(&request.config)?;
            let declared = declared_attributes(&request.config)?;
            Ok((reconciler, record, fields, declared))
        });
        let (reconciler, record, fields, declared) = match prepared {
            Ok(prepared) => prepared,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        match reconciler
            .reconcile_update(&ctx, &record, &fields, &declared)
            .await
        {
            Ok(reconciled) => {
                let mut new_state = request.planned_state;
                if let Err(e) = write_state::<K>(&mut new_state, &reconciled) {
                    diagnostics.push(invalid_state(e));
                }
                UpdateResourceResponse {
                    new_state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(failure("update", K::TYPE_NAME, &e));
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                }
            }
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let record = match record_from_state(&request.prior_state) {
            Ok(record) => record,
            Err(_) => return DeleteResourceResponse { diagnostics },
        };

        let reconciler = match self.reconciler() {
            Ok(reconciler) => reconciler,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        if let Err(e) = reconciler.reconcile_delete(&ctx, &record).await {
            diagnostics.push(failure("delete", K::TYPE_NAME, &e));
        }
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl<K: ObjectKind> ResourceWithConfigure for ExtensibleResource<K> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<NiosProviderData>() {
                self.provider_data = Some(provider_data.clone());
            } else {
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract NiosProviderData from provider data",
                ));
            }
        }

        ConfigureResourceResponse { diagnostics }
    }
}

#[async_trait]
impl<K: ObjectKind> ResourceWithImportState for ExtensibleResource<K> {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut diagnostics = vec![];

        let reconciler = match self.reconciler() {
            Ok(reconciler) => reconciler,
            Err(diag) => {
                diagnostics.push(diag);
                return ImportResourceStateResponse {
                    imported_resources: vec![],
                    diagnostics,
                };
            }
        };

        let reconciled = match reconciler.reconcile_import(&ctx, &request.id).await {
            Ok(reconciled) => reconciled,
            Err(e) => {
                diagnostics.push(failure("import", K::TYPE_NAME, &e));
                return ImportResourceStateResponse {
                    imported_resources: vec![],
                    diagnostics,
                };
            }
        };

        let mut state = DynamicValue::object();
        if let Err(e) = write_state::<K>(&mut state, &reconciled) {
            diagnostics.push(invalid_state(e));
            return ImportResourceStateResponse {
                imported_resources: vec![],
                diagnostics,
            };
        }

        ImportResourceStateResponse {
            imported_resources: vec![ImportedResource {
                type_name: request.type_name,
                state,
                private: vec![],
            }],
            diagnostics,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::RetryConfig;
    use crate::reconcile::tag::tests::SequenceMinter;
    use std::collections::BTreeMap;
    use tfplug::types::ClientCapabilities;

    pub(crate) async fn configured<K: ObjectKind>(url: &str) -> ExtensibleResource<K> {
        let retry = RetryConfig {
            max_retries: 0,
            ..Default::default()
        };
        let client =
            crate::api::Client::with_config(url, "2.12", "admin", "secret", true, retry).unwrap();
        let mut resource = ExtensibleResource::<K>::with_minter(Arc::new(SequenceMinter::default()));
        let response = resource
            .configure(
                Context::new(),
                ConfigureResourceRequest {
                    provider_data: Some(Arc::new(NiosProviderData::new(client))),
                },
            )
            .await;
        assert!(response.diagnostics.is_empty());
        resource
    }

    fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn state(reference: &str, extattrs: &[(&str, &str)], all: &[(&str, &str)]) -> DynamicValue {
        let mut state = DynamicValue::object();
        state
            .set_string(&AttributePath::new("ref"), reference.to_string())
            .unwrap();
        state
            .set_string_map(&extattrs_path(), &string_map(extattrs))
            .unwrap();
        state
            .set_string_map(&extattrs_all_path(), &string_map(all))
            .unwrap();
        state
    }

    #[test]
    fn record_from_state_restores_tag_as_explicit() {
        let state = state(
            "networkview/xyz:blue",
            &[("Site", "NYC")],
            &[
                ("Site", "NYC"),
                ("Region", "US-East"),
                (CORRELATION_TAG_KEY, "abc-uuid"),
            ],
        );

        let record = record_from_state(&state).unwrap();

        assert_eq!(record.reference, "networkview/xyz:blue");
        assert_eq!(record.correlation_tag(), Some("abc-uuid"));
        assert_eq!(
            record.explicit,
            AttributeMap::from_values([("Site", "NYC"), (CORRELATION_TAG_KEY, "abc-uuid")])
        );
        assert!(record.full.get("Region").unwrap().inherited);
        assert!(!record.full.get(CORRELATION_TAG_KEY).unwrap().inherited);
    }

    #[test]
    fn record_round_trips_through_state() {
        let original = state(
            "admingroup/b25l:ops",
            &[("Site", "NYC")],
            &[("Site", "NYC"), (CORRELATION_TAG_KEY, "abc-uuid")],
        );
        let record = record_from_state(&original).unwrap();

        let mut written = DynamicValue::object();
        write_record(&mut written, &record).unwrap();

        assert_eq!(written, original);
    }

    #[test]
    fn tag_never_lands_in_user_visible_attributes() {
        let record = ManagedObjectRecord {
            reference: "admingroup/b25l:ops".to_string(),
            explicit: AttributeMap::from_values([(CORRELATION_TAG_KEY, "abc-uuid")]),
            full: AttributeMap::from_values([(CORRELATION_TAG_KEY, "abc-uuid")]),
        };

        let mut state = DynamicValue::object();
        write_record(&mut state, &record).unwrap();

        assert!(state.get_map(&extattrs_path()).is_err());
        assert_eq!(
            state.get_string_map(&extattrs_all_path()).unwrap(),
            string_map(&[(CORRELATION_TAG_KEY, "abc-uuid")])
        );
    }

    #[test]
    fn state_without_ref_is_rejected() {
        let mut state = DynamicValue::object();
        state
            .set_string_map(&extattrs_path(), &string_map(&[("Site", "NYC")]))
            .unwrap();
        assert!(record_from_state(&state).is_err());
    }

    #[tokio::test]
    async fn validate_rejects_reserved_attribute() {
        let resource = ExtensibleResource::<crate::resources::NetworkViewKind>::new();
        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new("name"), "blue".to_string())
            .unwrap();
        config
            .set_string_map(
                &extattrs_path(),
                &string_map(&[(CORRELATION_TAG_KEY, "mine"), ("Site", "NYC")]),
            )
            .unwrap();

        let response = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "nios_network_view".to_string(),
                    config,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].is_error());
    }

    #[tokio::test]
    async fn unconfigured_resource_reports_error() {
        let resource = ExtensibleResource::<crate::resources::NetworkViewKind>::new();
        let prior = state("networkview/xyz:blue", &[], &[(CORRELATION_TAG_KEY, "t")]);

        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "nios_network_view".to_string(),
                    current_state: prior.clone(),
                    private: vec![],
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert_eq!(response.new_state, Some(prior));
        assert_eq!(response.diagnostics[0].summary, "Provider not configured");
    }
}
