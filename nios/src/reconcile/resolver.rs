//! Drift-tolerant identity lookup
//!
//! Lookup first tries the stored reference. When the remote system reports
//! not-found, the collection is searched for the object's correlation tag and
//! a single match is adopted as the object's new identity.

use super::collection::{remote_call, AttributeFilter, RemoteCollection, RemoteObject};
use super::error::ReconcileError;
use super::tag::CORRELATION_TAG_KEY;
use tfplug::Context;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<O> {
    /// `recovered` is true when the object was found through its tag after
    /// the stored reference went stale
    Found { object: O, recovered: bool },
    /// The object is gone, or cannot be identified any more
    NotFound,
}

pub async fn resolve<C: RemoteCollection>(
    ctx: &Context,
    collection: &C,
    reference: &str,
    correlation_tag: Option<&str>,
) -> Result<Resolution<C::Object>, ReconcileError> {
    tracing::debug!("Looking up {} {}", collection.object_type(), reference);

    if let Some(object) = remote_call(ctx, "direct lookup", collection.get(reference)).await? {
        return Ok(Resolution::Found {
            object,
            recovered: false,
        });
    }

    let Some(tag) = correlation_tag.filter(|t| !t.is_empty()) else {
        tracing::info!(
            "{} {} not found and carries no correlation tag; treating as deleted",
            collection.object_type(),
            reference
        );
        return Ok(Resolution::NotFound);
    };

    match search_by_tag(ctx, collection, tag).await? {
        Some(object) => {
            tracing::info!(
                "Recovered {} by correlation tag: {} -> {}",
                collection.object_type(),
                reference,
                object.reference()
            );
            Ok(Resolution::Found {
                object,
                recovered: true,
            })
        }
        None => {
            tracing::info!(
                "{} {} not found by reference or correlation tag; treating as deleted",
                collection.object_type(),
                reference
            );
            Ok(Resolution::NotFound)
        }
    }
}

/// Finds the single object carrying `tag`. More than one match is a
/// consistency error; no match is `None`.
pub async fn search_by_tag<C: RemoteCollection>(
    ctx: &Context,
    collection: &C,
    tag: &str,
) -> Result<Option<C::Object>, ReconcileError> {
    let filter = AttributeFilter::equals(CORRELATION_TAG_KEY, tag);
    let mut matches = remote_call(ctx, "tag search", collection.list(&filter)).await?;

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        count => Err(ReconcileError::IdentityAmbiguous {
            tag: tag.to_string(),
            count,
        }),
    }
}
