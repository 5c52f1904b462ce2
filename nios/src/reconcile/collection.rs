//! The capability set the protocol needs from a remote object collection

use super::attributes::AttributeMap;
use super::error::ReconcileError;
use crate::api::ApiError;
use async_trait::async_trait;
use std::future::Future;
use tfplug::Context;

/// A remote object as far as reconciliation is concerned
pub trait RemoteObject: Clone + Send + Sync {
    /// Current locator; may change behind our back
    fn reference(&self) -> &str;

    /// Complete attribute map as returned by the remote system
    fn attributes(&self) -> AttributeMap;
}

/// Equality filter on one extensible attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    pub name: String,
    pub value: String,
}

impl AttributeFilter {
    pub fn equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Get / List / Create / Update / Delete over one object type.
/// Implemented once per remote object kind.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    type Object: RemoteObject;
    /// Per-type field payload (everything except the attribute map)
    type Fields: Send + Sync;

    fn object_type(&self) -> &str;

    /// `Ok(None)` when the remote system reports not-found
    async fn get(&self, reference: &str) -> Result<Option<Self::Object>, ApiError>;

    async fn list(&self, filter: &AttributeFilter) -> Result<Vec<Self::Object>, ApiError>;

    async fn create(
        &self,
        fields: &Self::Fields,
        attributes: &AttributeMap,
    ) -> Result<Self::Object, ApiError>;

    /// With `fields == None` only `attributes` is submitted, and it is merged
    /// into the object's existing attributes instead of replacing them.
    async fn update(
        &self,
        reference: &str,
        fields: Option<&Self::Fields>,
        attributes: &AttributeMap,
    ) -> Result<Self::Object, ApiError>;

    /// `Ok(false)` when there was nothing to delete
    async fn delete(&self, reference: &str) -> Result<bool, ApiError>;
}

/// Runs one remote call, aborting with `Cancelled` if the context is
/// cancelled first. Transport errors are wrapped with the operation name.
pub(crate) async fn remote_call<T, F>(
    ctx: &Context,
    operation: &'static str,
    call: F,
) -> Result<T, ReconcileError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    if ctx.is_cancelled() {
        return Err(ReconcileError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(ReconcileError::Cancelled),
        result = call => result.map_err(|source| ReconcileError::Transport { operation, source }),
    }
}
