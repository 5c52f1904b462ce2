//! Terraform resources

mod admin_group;
mod admin_user;
mod extensible;
mod network_view;

pub use admin_group::AdminGroupKind;
pub use admin_user::AdminUserKind;
pub use extensible::{ExtensibleResource, ObjectKind};
pub use network_view::NetworkViewKind;

pub type AdminGroupResource = ExtensibleResource<AdminGroupKind>;
pub type AdminUserResource = ExtensibleResource<AdminUserKind>;
pub type NetworkViewResource = ExtensibleResource<NetworkViewKind>;
