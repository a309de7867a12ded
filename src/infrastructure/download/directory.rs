//! Directory download sink

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::application::ports::{DownloadError, DownloadSink};
use crate::domain::recording::{ObjectUrl, RecordedBlob};

/// Give up after this many name collisions
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Saves artifacts into a directory without ever overwriting a file
#[derive(Debug, Clone)]
pub struct DirectoryDownloader {
    dir: Option<PathBuf>,
}

impl DirectoryDownloader {
    /// Save into `dir`, creating it on first use
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Save into the user's download directory, or the working directory
    pub fn default_location() -> Self {
        Self {
            dir: dirs::download_dir().or_else(|| std::env::current_dir().ok()),
        }
    }

    /// Target directory, if one could be determined
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

impl Default for DirectoryDownloader {
    fn default() -> Self {
        Self::default_location()
    }
}

fn validate_filename(filename: &str) -> Result<(), DownloadError> {
    let invalid = filename.trim().is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(&['/', '\\', '\0'][..]);
    if invalid {
        return Err(DownloadError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// `name.ext` for the first attempt, then `name-1.ext`, `name-2.ext`, ...
fn candidate_name(filename: &str, attempt: u32) -> String {
    if attempt == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, attempt, ext),
        _ => format!("{}-{}", filename, attempt),
    }
}

fn write_failed(path: &Path, e: std::io::Error) -> DownloadError {
    DownloadError::WriteFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Await a write into the freshly created `path`; on failure remove the
/// partial file so the name stays free
async fn finish_or_remove<F>(path: &Path, write: F) -> Result<(), DownloadError>
where
    F: Future<Output = std::io::Result<()>>,
{
    let Err(e) = write.await else {
        return Ok(());
    };
    if let Err(remove) = fs::remove_file(path).await {
        warn!(path = %path.display(), error = %remove, "could not remove partial download");
    }
    Err(write_failed(path, e))
}

#[async_trait]
impl DownloadSink for DirectoryDownloader {
    async fn save(
        &self,
        url: &ObjectUrl,
        blob: &RecordedBlob,
        filename: &str,
    ) -> Result<PathBuf, DownloadError> {
        validate_filename(filename)?;
        let dir = self.dir.as_deref().ok_or(DownloadError::NoLocation)?;
        fs::create_dir_all(dir)
            .await
            .map_err(|e| write_failed(dir, e))?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(candidate_name(filename, attempt));
            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(write_failed(&path, e)),
            };

            finish_or_remove(&path, async {
                file.write_all(blob.data()).await?;
                file.flush().await
            })
            .await?;

            debug!(url = %url, path = %path.display(), size = blob.size_bytes(), "artifact saved");
            return Ok(path);
        }

        Err(DownloadError::WriteFailed {
            path: dir.join(filename).display().to_string(),
            message: "too many files with the same name".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob() -> RecordedBlob {
        RecordedBlob::new(b"webm-bytes".to_vec(), "video/webm")
    }

    fn url() -> ObjectUrl {
        ObjectUrl::new("blob:test")
    }

    #[test]
    fn candidate_names_insert_counter_before_extension() {
        assert_eq!(candidate_name("clip.webm", 0), "clip.webm");
        assert_eq!(candidate_name("clip.webm", 2), "clip-2.webm");
        assert_eq!(candidate_name("clip", 1), "clip-1");
        assert_eq!(candidate_name(".hidden", 1), ".hidden-1");
    }

    #[test]
    fn path_like_names_are_rejected() {
        for name in ["", "  ", ".", "..", "a/b.webm", "..\\b.webm"] {
            assert!(
                matches!(validate_filename(name), Err(DownloadError::InvalidFilename(_))),
                "accepted {:?}",
                name
            );
        }
        assert!(validate_filename("screen-recording.webm").is_ok());
    }

    #[tokio::test]
    async fn saves_under_requested_name() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = DirectoryDownloader::new(dir.path().join("videos"));

        let path = downloader.save(&url(), &blob(), "clip.webm").await.unwrap();

        assert_eq!(path, dir.path().join("videos").join("clip.webm"));
        assert_eq!(std::fs::read(&path).unwrap(), b"webm-bytes");
    }

    #[tokio::test]
    async fn never_overwrites_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.webm"), b"keep me").unwrap();
        let downloader = DirectoryDownloader::new(dir.path());

        let first = downloader.save(&url(), &blob(), "clip.webm").await.unwrap();
        let second = downloader.save(&url(), &blob(), "clip.webm").await.unwrap();

        assert_eq!(first, dir.path().join("clip-1.webm"));
        assert_eq!(second, dir.path().join("clip-2.webm"));
        assert_eq!(std::fs::read(dir.path().join("clip.webm")).unwrap(), b"keep me");
    }

    #[tokio::test]
    async fn invalid_filename_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = DirectoryDownloader::new(dir.path());

        let err = downloader.save(&url(), &blob(), "../escape.webm").await.unwrap_err();

        assert!(matches!(err, DownloadError::InvalidFilename(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen-recording.webm");
        std::fs::write(&path, b"half").unwrap();

        let err = finish_or_remove(&path, async {
            Err(std::io::Error::new(ErrorKind::WriteZero, "disk full"))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, DownloadError::WriteFailed { ref message, .. } if message == "disk full"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn successful_write_keeps_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.webm");
        std::fs::write(&path, b"done").unwrap();

        finish_or_remove(&path, async { Ok(()) }).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"done");
    }

    #[tokio::test]
    async fn missing_location_is_reported() {
        let downloader = DirectoryDownloader { dir: None };

        let err = downloader.save(&url(), &blob(), "clip.webm").await.unwrap_err();
        assert!(matches!(err, DownloadError::NoLocation));
    }
}
