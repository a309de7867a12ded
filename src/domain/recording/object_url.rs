//! Revocable reference to a recorded artifact

use std::fmt;

use serde::Serialize;

/// URL scheme prefix used for artifact references
pub const OBJECT_URL_SCHEME: &str = "blob:";

/// Opaque reference handed out for a finished artifact.
/// Only meaningful to the store that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
