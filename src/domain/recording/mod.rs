//! Recording value objects

mod artifact;
mod duration;
mod format;
mod object_url;
mod options;

pub use artifact::RecordedBlob;
pub use duration::{format_clock, Duration};
pub use format::{MimeType, RecordingFormat};
pub use object_url::{ObjectUrl, OBJECT_URL_SCHEME};
pub use options::{ButtonLabels, RecordingOptions, DEFAULT_DOWNLOAD_NAME, DEFAULT_FRAME_RATE};
