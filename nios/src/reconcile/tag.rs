//! Correlation tag minting and injection

use super::attributes::{AttributeMap, TaggedValue};
use super::error::ReconcileError;
use std::sync::Arc;
use uuid::Uuid;

/// Reserved extensible attribute holding the provider-private identity.
/// Never user-settable.
pub const CORRELATION_TAG_KEY: &str = "Terraform Internal ID";

/// Source of fresh correlation tokens
pub trait TagMinter: Send + Sync {
    fn mint(&self) -> Result<String, TokenError>;
}

#[derive(Debug, thiserror::Error)]
#[error("failed to generate correlation token: {0}")]
pub struct TokenError(pub String);

/// Random (v4) UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidMinter;

impl TagMinter for UuidMinter {
    fn mint(&self) -> Result<String, TokenError> {
        Ok(Uuid::new_v4().to_string())
    }
}

impl<T: TagMinter + ?Sized> TagMinter for Arc<T> {
    fn mint(&self) -> Result<String, TokenError> {
        (**self).mint()
    }
}

/// Returns `current` with a correlation tag. An existing non-empty tag is
/// kept as is; otherwise a new token is minted and stored as explicit.
pub fn ensure_correlation_tag(
    current: &AttributeMap,
    minter: &dyn TagMinter,
) -> Result<AttributeMap, ReconcileError> {
    if current.correlation_tag().is_some() {
        return Ok(current.clone());
    }

    let token = minter.mint()?;
    if token.is_empty() {
        return Err(TokenError("minter returned an empty token".to_string()).into());
    }
    tracing::debug!("Minted correlation tag {}", token);

    let mut tagged = current.clone();
    tagged.insert(CORRELATION_TAG_KEY, TaggedValue::explicit(token));
    Ok(tagged)
}
