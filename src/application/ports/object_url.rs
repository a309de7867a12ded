//! Object URL port interface

use std::sync::Arc;

use crate::domain::recording::{ObjectUrl, RecordedBlob};

/// Port for issuing revocable references to finished artifacts
pub trait ObjectUrlStore: Send + Sync + 'static {
    /// Register an artifact and return a fresh reference to it
    fn create_object_url(&self, blob: Arc<RecordedBlob>) -> ObjectUrl;

    /// Release a reference. Revoking an unknown URL is a no-op.
    fn revoke_object_url(&self, url: &ObjectUrl);

    /// Look up a live reference
    fn resolve(&self, url: &ObjectUrl) -> Option<Arc<RecordedBlob>>;
}
