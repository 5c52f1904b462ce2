//! Typed WAPI object bindings and the collection adapter the reconciler runs
//! against.

mod admin_group;
mod admin_user;
mod network_view;

pub use admin_group::{AdminGroup, AdminGroupFields};
pub use admin_user::{AdminUser, AdminUserFields};
pub use network_view::{NetworkView, NetworkViewFields};

use super::common::{ApiQueryParams, ExtAttrs};
use super::{ApiError, Client};
use crate::reconcile::{AttributeFilter, AttributeMap, RemoteCollection, RemoteObject};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::marker::PhantomData;

/// A WAPI object type carrying extensible attributes
pub trait WapiObject: RemoteObject + DeserializeOwned + Debug + 'static {
    /// e.g. `admingroup`
    const OBJECT_TYPE: &'static str;
    /// Fields requested on top of the type's defaults
    const RETURN_FIELDS: &'static [&'static str];

    /// Everything submitted on create/update except `extattrs`
    type Fields: Serialize + Send + Sync;
}

#[derive(Serialize)]
struct WriteBody<'a, F> {
    #[serde(flatten)]
    fields: &'a F,
    extattrs: ExtAttrs,
}

/// `extattrs+` merges into the existing attributes instead of replacing them
#[derive(Serialize)]
struct MergeAttributesBody {
    #[serde(rename = "extattrs+")]
    extattrs: ExtAttrs,
}

/// CRUD over one WAPI object type
pub struct WapiCollection<T> {
    client: Client,
    _object: PhantomData<fn() -> T>,
}

impl<T: WapiObject> WapiCollection<T> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _object: PhantomData,
        }
    }

    fn return_fields() -> ApiQueryParams {
        ApiQueryParams::new().return_fields(T::RETURN_FIELDS)
    }

    fn write_params() -> ApiQueryParams {
        Self::return_fields().add("_return_as_object", 1)
    }
}

impl<T> Clone for WapiCollection<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _object: PhantomData,
        }
    }
}

#[async_trait]
impl<T: WapiObject> RemoteCollection for WapiCollection<T> {
    type Object = T;
    type Fields = T::Fields;

    fn object_type(&self) -> &str {
        T::OBJECT_TYPE
    }

    async fn get(&self, reference: &str) -> Result<Option<T>, ApiError> {
        match self
            .client
            .get_with_params(&format!("/{}", reference), &Self::return_fields())
            .await
        {
            Ok(object) => Ok(Some(object)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list(&self, filter: &AttributeFilter) -> Result<Vec<T>, ApiError> {
        let params = Self::return_fields().extattr_equals(&filter.name, &filter.value);
        self.client
            .get_with_params(&format!("/{}", T::OBJECT_TYPE), &params)
            .await
    }

    async fn create(&self, fields: &T::Fields, attributes: &AttributeMap) -> Result<T, ApiError> {
        let body = WriteBody {
            fields,
            extattrs: ExtAttrs::from(attributes),
        };
        let path = format!("/{}{}", T::OBJECT_TYPE, Self::write_params().to_query_string());
        self.client.post(&path, &body).await
    }

    async fn update(
        &self,
        reference: &str,
        fields: Option<&T::Fields>,
        attributes: &AttributeMap,
    ) -> Result<T, ApiError> {
        let path = format!("/{}{}", reference, Self::write_params().to_query_string());
        let extattrs = ExtAttrs::from(attributes);
        match fields {
            Some(fields) => {
                self.client
                    .put(&path, &WriteBody { fields, extattrs })
                    .await
            }
            None => {
                self.client
                    .put(&path, &MergeAttributesBody { extattrs })
                    .await
            }
        }
    }

    async fn delete(&self, reference: &str) -> Result<bool, ApiError> {
        match self
            .client
            .delete::<String>(&format!("/{}", reference))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
