//! tfplug - Terraform Plugin Framework for Rust
//!
//! The provider-facing half of a Terraform plugin: request contexts, dynamic
//! state values, schemas, and the resource/provider traits. The wire
//! transport that drives these traits lives outside this crate.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod provider;
pub mod resource;

// Re-exports for convenience
pub use context::Context;
pub use error::{Result, TfplugError};
pub use provider::{Provider, ResourceFactory};
pub use resource::{ProviderResource, Resource, ResourceWithConfigure, ResourceWithImportState};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use types::{AttributePath, Config, Diagnostic, Dynamic, DynamicValue, State};
