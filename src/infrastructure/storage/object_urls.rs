//! In-memory object URL registry

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uuid::Uuid;

use crate::application::ports::ObjectUrlStore;
use crate::domain::recording::{ObjectUrl, RecordedBlob, OBJECT_URL_SCHEME};

/// Process-local `blob:` URL registry.
///
/// Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectUrls {
    entries: Arc<Mutex<HashMap<String, Arc<RecordedBlob>>>>,
}

impl InMemoryObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live URLs
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<RecordedBlob>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectUrlStore for InMemoryObjectUrls {
    fn create_object_url(&self, blob: Arc<RecordedBlob>) -> ObjectUrl {
        let url = format!("{}{}", OBJECT_URL_SCHEME, Uuid::new_v4());
        self.entries().insert(url.clone(), blob);
        debug!(url = %url, "object url created");
        ObjectUrl::new(url)
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        if self.entries().remove(url.as_str()).is_some() {
            debug!(url = %url, "object url revoked");
        }
    }

    fn resolve(&self, url: &ObjectUrl) -> Option<Arc<RecordedBlob>> {
        self.entries().get(url.as_str()).cloned()
    }
}
