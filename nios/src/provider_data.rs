//! Provider data structure passed to resources

use crate::api::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct NiosProviderData {
    pub client: Arc<Client>,
}

impl NiosProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}
