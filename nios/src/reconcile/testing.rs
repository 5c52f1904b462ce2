//! In-memory collection used by the reconciliation tests

use super::attributes::AttributeMap;
use super::collection::{AttributeFilter, RemoteCollection, RemoteObject};
use super::tag::CORRELATION_TAG_KEY;
use crate::api::ApiError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FakeObject {
    pub reference: String,
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

impl FakeObject {
    pub(crate) fn new(reference: &str, attributes: &[(&str, &str)]) -> Self {
        Self {
            reference: reference.to_string(),
            name: reference.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub(crate) fn tagged(reference: &str, tag: &str) -> Self {
        Self::new(reference, &[(CORRELATION_TAG_KEY, tag)])
    }
}

impl RemoteObject for FakeObject {
    fn reference(&self) -> &str {
        &self.reference
    }

    fn attributes(&self) -> AttributeMap {
        AttributeMap::from_values(self.attributes.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SubmittedUpdate {
    pub reference: String,
    pub name: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

/// Objects keyed by reference. Created objects get `obj/<n>` references and
/// pick up `defaults` for every attribute the request did not set.
#[derive(Default)]
pub(crate) struct FakeCollection {
    objects: Mutex<BTreeMap<String, FakeObject>>,
    defaults: Mutex<BTreeMap<String, String>>,
    next_id: AtomicUsize,
    get_calls: AtomicUsize,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    get_failure: Mutex<Option<ApiError>>,
    list_failure: Mutex<Option<ApiError>>,
    update_failure: Mutex<Option<ApiError>>,
    updates: Mutex<Vec<SubmittedUpdate>>,
}

impl FakeCollection {
    pub(crate) fn with_defaults(defaults: &[(&str, &str)]) -> Self {
        let collection = Self::default();
        *collection.defaults.lock().unwrap() = defaults
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        collection
    }

    pub(crate) fn put(&self, object: FakeObject) {
        self.objects
            .lock()
            .unwrap()
            .insert(object.reference.clone(), object);
    }

    pub(crate) fn object(&self, reference: &str) -> Option<FakeObject> {
        self.objects.lock().unwrap().get(reference).cloned()
    }

    /// Simulates an out-of-band rebuild that hands the object a new reference
    pub(crate) fn move_object(&self, from: &str, to: &str) {
        let mut objects = self.objects.lock().unwrap();
        let mut object = objects.remove(from).expect("object to move");
        object.reference = to.to_string();
        objects.insert(to.to_string(), object);
    }

    pub(crate) fn remove(&self, reference: &str) {
        self.objects.lock().unwrap().remove(reference);
    }

    pub(crate) fn set_attribute(&self, reference: &str, key: &str, value: &str) {
        let mut objects = self.objects.lock().unwrap();
        let object = objects.get_mut(reference).expect("object to modify");
        object.attributes.insert(key.to_string(), value.to_string());
    }

    pub(crate) fn fail_next_get(&self, error: ApiError) {
        *self.get_failure.lock().unwrap() = Some(error);
    }

    pub(crate) fn fail_next_list(&self, error: ApiError) {
        *self.list_failure.lock().unwrap() = Some(error);
    }

    pub(crate) fn fail_next_update(&self, error: ApiError) {
        *self.update_failure.lock().unwrap() = Some(error);
    }

    pub(crate) fn updates(&self) -> Vec<SubmittedUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteCollection for FakeCollection {
    type Object = FakeObject;
    type Fields = String;

    fn object_type(&self) -> &str {
        "fake"
    }

    async fn get(&self, reference: &str) -> Result<Option<FakeObject>, ApiError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.get_failure.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.object(reference))
    }

    async fn list(&self, filter: &AttributeFilter) -> Result<Vec<FakeObject>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.list_failure.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.attributes.get(&filter.name) == Some(&filter.value))
            .cloned()
            .collect())
    }

    async fn create(&self, name: &String, attributes: &AttributeMap) -> Result<FakeObject, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;

        let mut values = self.defaults.lock().unwrap().clone();
        values.extend(attributes.values());

        let object = FakeObject {
            reference: format!("obj/{}", id),
            name: name.clone(),
            attributes: values,
        };
        self.put(object.clone());
        Ok(object)
    }

    async fn update(
        &self,
        reference: &str,
        name: Option<&String>,
        attributes: &AttributeMap,
    ) -> Result<FakeObject, ApiError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.update_failure.lock().unwrap().take() {
            return Err(error);
        }
        self.updates.lock().unwrap().push(SubmittedUpdate {
            reference: reference.to_string(),
            name: name.cloned(),
            attributes: attributes.values(),
        });

        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .get_mut(reference)
            .ok_or_else(|| ApiError::NotFound(reference.to_string()))?;
        match name {
            Some(name) => {
                object.name = name.clone();
                object.attributes = attributes.values();
            }
            None => object.attributes.extend(attributes.values()),
        }
        Ok(object.clone())
    }

    async fn delete(&self, reference: &str) -> Result<bool, ApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.objects.lock().unwrap().remove(reference).is_some())
    }
}
