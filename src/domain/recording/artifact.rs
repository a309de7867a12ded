//! Recorded artifact value object

use super::format::RecordingFormat;

/// The finalized recording: every emitted fragment concatenated in order,
/// tagged with the MIME type the recorder negotiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBlob {
    data: Vec<u8>,
    mime_type: String,
}

impl RecordedBlob {
    /// Create a blob from raw bytes
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Concatenate fragments in the order given
    pub fn from_chunks<I, C>(chunks: I, mime_type: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        let mut data = Vec::new();
        for chunk in chunks {
            data.extend_from_slice(chunk.as_ref());
        }
        Self::new(data, mime_type)
    }

    /// Get the raw bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the raw bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Negotiated MIME type
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Container format derived from the MIME type
    pub fn format(&self) -> RecordingFormat {
        RecordingFormat::from_mime_type(&self.mime_type)
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Whether no bytes were recorded
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else if bytes < 1024 * 1024 * 1024 {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        } else {
            format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
        }
    }
}
