//! Create / Read / Update / Import / Delete sequencing
//!
//! Every phase computes a complete new [`ManagedObjectRecord`] and hands it
//! back; nothing is written on failure, so the caller's persisted state only
//! changes when a phase succeeds.

use super::attributes::AttributeMap;
use super::collection::{remote_call, RemoteCollection, RemoteObject};
use super::error::ReconcileError;
use super::filter::{merge_inherited, split};
use super::resolver::{resolve, search_by_tag, Resolution};
use super::tag::{ensure_correlation_tag, TagMinter, UuidMinter, CORRELATION_TAG_KEY};
use crate::api::ApiError;
use tfplug::Context;

/// Persisted per-object state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedObjectRecord {
    pub reference: String,
    /// User-declared attributes plus the correlation tag
    pub explicit: AttributeMap,
    /// Everything last observed, annotated with inheritance
    pub full: AttributeMap,
}

impl ManagedObjectRecord {
    pub fn correlation_tag(&self) -> Option<&str> {
        self.full.correlation_tag()
    }
}

/// A record together with the remote object it was built from, so resource
/// handlers can flatten the object's other fields
#[derive(Debug, Clone)]
pub struct Reconciled<O> {
    pub record: ManagedObjectRecord,
    pub object: O,
}

#[derive(Debug, Clone)]
pub enum ReadOutcome<O> {
    Present(Reconciled<O>),
    /// Confirmed gone; drop the record from state
    Deleted,
}

pub struct Reconciler<C, M = UuidMinter> {
    collection: C,
    minter: M,
}

impl<C: RemoteCollection> Reconciler<C> {
    pub fn new(collection: C) -> Self {
        Self::with_minter(collection, UuidMinter)
    }
}

impl<C: RemoteCollection, M: TagMinter> Reconciler<C, M> {
    pub fn with_minter(collection: C, minter: M) -> Self {
        Self { collection, minter }
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    pub async fn reconcile_create(
        &self,
        ctx: &Context,
        fields: &C::Fields,
        user_attributes: &AttributeMap,
    ) -> Result<Reconciled<C::Object>, ReconcileError> {
        let declared =
            ensure_correlation_tag(&user_attributes.without_correlation_tag(), &self.minter)?;

        let object = remote_call(ctx, "create", self.collection.create(fields, &declared)).await?;
        tracing::info!(
            "Created {} {}",
            self.collection.object_type(),
            object.reference()
        );

        Ok(self.settle(&declared, object))
    }

    pub async fn reconcile_read(
        &self,
        ctx: &Context,
        record: &ManagedObjectRecord,
    ) -> Result<ReadOutcome<C::Object>, ReconcileError> {
        let Some(object) = self.locate(ctx, record).await? else {
            return Ok(ReadOutcome::Deleted);
        };

        let observed = object.attributes();
        let split = split(&record.explicit, &observed, record.correlation_tag());
        Ok(ReadOutcome::Present(Reconciled {
            record: ManagedObjectRecord {
                reference: object.reference().to_string(),
                explicit: split.explicit,
                full: split.full,
            },
            object,
        }))
    }

    pub async fn reconcile_update(
        &self,
        ctx: &Context,
        record: &ManagedObjectRecord,
        fields: &C::Fields,
        user_attributes: &AttributeMap,
    ) -> Result<Reconciled<C::Object>, ReconcileError> {
        let mut declared = user_attributes.without_correlation_tag();
        if let Some(tag) = record.correlation_tag() {
            declared.insert_explicit(CORRELATION_TAG_KEY, tag);
        }
        // Objects adopted before they were ever tagged get their tag now
        let declared = ensure_correlation_tag(&declared, &self.minter)?;
        let submitted = merge_inherited(&declared, &record.full);

        let target = self
            .locate(ctx, record)
            .await?
            .ok_or_else(|| ReconcileError::ObjectNotFound(record.reference.clone()))?;
        let reference = target.reference();

        let object = remote_call(
            ctx,
            "update",
            self.collection.update(reference, Some(fields), &submitted),
        )
        .await
        .map_err(|e| not_found_as_missing(e, reference))?;
        tracing::debug!(
            "Updated {} {} with {} attributes",
            self.collection.object_type(),
            object.reference(),
            submitted.len()
        );

        Ok(self.settle(&declared, object))
    }

    pub async fn reconcile_import(
        &self,
        ctx: &Context,
        external_reference: &str,
    ) -> Result<Reconciled<C::Object>, ReconcileError> {
        let object = remote_call(ctx, "import lookup", self.collection.get(external_reference))
            .await?
            .ok_or_else(|| ReconcileError::ObjectNotFound(external_reference.to_string()))?;

        if let Some(tag) = object.attributes().correlation_tag() {
            tracing::info!(
                "Imported {} {} already carries correlation tag {}",
                self.collection.object_type(),
                object.reference(),
                tag
            );
            let declared = AttributeMap::from_values([(CORRELATION_TAG_KEY, tag)]);
            return Ok(self.settle(&declared, object));
        }

        let declared = ensure_correlation_tag(&AttributeMap::new(), &self.minter)?;
        let reference = object.reference().to_string();
        let object = remote_call(
            ctx,
            "import tagging",
            self.collection.update(&reference, None, &declared),
        )
        .await
        .map_err(|e| not_found_as_missing(e, &reference))?;
        tracing::info!(
            "Tagged imported {} {}",
            self.collection.object_type(),
            object.reference()
        );

        Ok(self.settle(&declared, object))
    }

    /// Deletes the object wherever it currently lives. An object that cannot
    /// be found any more counts as deleted.
    pub async fn reconcile_delete(
        &self,
        ctx: &Context,
        record: &ManagedObjectRecord,
    ) -> Result<(), ReconcileError> {
        let Some(target) = self.locate(ctx, record).await? else {
            tracing::debug!("{} already gone", record.reference);
            return Ok(());
        };

        if target.reference() != record.reference {
            tracing::info!(
                "Deleting {} at recovered reference {}",
                self.collection.object_type(),
                target.reference()
            );
        }
        if !remote_call(ctx, "delete", self.collection.delete(target.reference())).await? {
            tracing::debug!("{} vanished before it could be deleted", target.reference());
        }
        Ok(())
    }

    /// Finds the remote object a record describes. An object at the stored
    /// reference only counts when it carries the record's correlation tag;
    /// otherwise the reference was reused and the tag decides.
    async fn locate(
        &self,
        ctx: &Context,
        record: &ManagedObjectRecord,
    ) -> Result<Option<C::Object>, ReconcileError> {
        let stored_tag = record.correlation_tag();

        let (object, recovered) =
            match resolve(ctx, &self.collection, &record.reference, stored_tag).await? {
                Resolution::Found { object, recovered } => (object, recovered),
                Resolution::NotFound => return Ok(None),
            };

        match stored_tag.filter(|_| !recovered) {
            Some(tag) if object.attributes().correlation_tag() != Some(tag) => {
                tracing::warn!(
                    "{} {} carries correlation tag {:?}, expected {}; searching by tag",
                    self.collection.object_type(),
                    object.reference(),
                    object.attributes().correlation_tag(),
                    tag
                );
                search_by_tag(ctx, &self.collection, tag).await
            }
            _ => Ok(Some(object)),
        }
    }

    fn settle(&self, declared: &AttributeMap, object: C::Object) -> Reconciled<C::Object> {
        let split = split(declared, &object.attributes(), declared.correlation_tag());
        Reconciled {
            record: ManagedObjectRecord {
                reference: object.reference().to_string(),
                explicit: split.explicit,
                full: split.full,
            },
            object,
        }
    }
}

fn not_found_as_missing(err: ReconcileError, reference: &str) -> ReconcileError {
    match err {
        ReconcileError::Transport {
            source: ApiError::NotFound(_),
            ..
        } => ReconcileError::ObjectNotFound(reference.to_string()),
        other => other,
    }
}
