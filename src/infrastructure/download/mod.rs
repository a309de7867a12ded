//! Download adapters

mod directory;

pub use directory::DirectoryDownloader;
