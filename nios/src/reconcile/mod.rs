//! Identity reconciliation and inherited-attribute filtering
//!
//! Keeps a managed object's identity stable when the remote system hands it a
//! new reference, and keeps attributes the remote system filled in on its own
//! out of the user's diff.

pub mod attributes;
pub mod collection;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod resolver;
pub mod tag;

#[cfg(test)]
mod testing;

pub use attributes::{AttributeMap, TaggedValue};
pub use collection::{AttributeFilter, RemoteCollection, RemoteObject};
pub use error::ReconcileError;
pub use filter::{merge_inherited, split, SplitAttributes};
pub use orchestrator::{ManagedObjectRecord, ReadOutcome, Reconciled, Reconciler};
pub use resolver::{resolve, search_by_tag, Resolution};
pub use tag::{ensure_correlation_tag, TagMinter, TokenError, UuidMinter, CORRELATION_TAG_KEY};
