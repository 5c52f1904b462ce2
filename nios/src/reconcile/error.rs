use super::tag::TokenError;
use crate::api::ApiError;
use thiserror::Error;

/// Fatal outcomes of a reconciliation phase. Legitimate external deletion is
/// not an error; it surfaces as `ReadOutcome::Deleted`.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{count} objects carry correlation tag {tag}; refusing to guess which one is managed")]
    IdentityAmbiguous { tag: String, count: usize },

    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    TokenGeneration(#[from] TokenError),

    #[error("object {0} does not exist")]
    ObjectNotFound(String),

    #[error("operation cancelled before completion")]
    Cancelled,
}
