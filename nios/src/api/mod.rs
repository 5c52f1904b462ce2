//! NIOS WAPI client and object bindings

pub mod client;
pub mod common;
pub mod error;
pub mod objects;

pub use client::{Client, RetryConfig};
pub use common::{ApiQueryParams, ExtAttrs};
pub use error::ApiError;
pub use objects::{
    AdminGroup, AdminGroupFields, AdminUser, AdminUserFields, NetworkView, NetworkViewFields,
    WapiCollection, WapiObject,
};
