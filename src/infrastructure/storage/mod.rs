//! Artifact storage adapters

mod object_urls;

pub use object_urls::InMemoryObjectUrls;
