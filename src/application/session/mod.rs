//! Recording session use case
//!
//! [`RecordingSession`] is a cheap, cloneable handle to a control loop that
//! owns the capture stream, the recorder and the accumulated data. Every
//! operation is a message to that loop; observers follow state through
//! [`RecordingSession::subscribe`].

mod actor;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::info;

pub use error::SessionError;

use self::actor::{Command, SessionActor};
use crate::application::ports::{CaptureSource, DownloadSink, ObjectUrlStore, RecorderFactory};
use crate::domain::recording::{ButtonLabels, ObjectUrl, RecordedBlob, RecordingOptions};
use crate::domain::session::{SessionSnapshot, SessionState};

const COMMAND_BUFFER: usize = 16;

/// Handle to a recording session
pub struct RecordingSession<D> {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionSnapshot>,
    downloads: Arc<D>,
    options: Arc<RecordingOptions>,
}

impl<D> Clone for RecordingSession<D> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            state: self.state.clone(),
            downloads: Arc::clone(&self.downloads),
            options: Arc::clone(&self.options),
        }
    }
}

impl<D: DownloadSink + 'static> RecordingSession<D> {
    /// Spawn a session on the current tokio runtime.
    ///
    /// `options` are the construction-time options used by
    /// [`start_recording`](Self::start_recording). The session is torn down
    /// once every handle is dropped or [`shutdown`](Self::shutdown) is called.
    pub fn new<C, F, U>(
        capture: C,
        factory: F,
        urls: U,
        downloads: D,
        options: RecordingOptions,
    ) -> Self
    where
        C: CaptureSource,
        F: RecorderFactory<C::Stream>,
        U: ObjectUrlStore,
    {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(SessionSnapshot::idle());

        let actor = SessionActor::new(capture, factory, urls, state_tx);
        tokio::spawn(actor.run(command_rx));

        Self {
            commands: command_tx,
            state: state_rx,
            downloads: Arc::new(downloads),
            options: Arc::new(options),
        }
    }

    /// Start recording with the construction-time options
    pub async fn start_recording(&self) -> Result<(), SessionError> {
        self.start(self.options.as_ref().clone()).await
    }

    /// Start recording with explicit options.
    ///
    /// Acquires a capture stream, creates a recorder over it and begins
    /// accumulating data. On failure the session stays idle and any stream
    /// that was acquired is released.
    pub async fn start(&self, options: RecordingOptions) -> Result<(), SessionError> {
        self.request(|reply| Command::Start { options, reply }).await
    }

    pub async fn pause_recording(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Pause { reply }).await
    }

    pub async fn resume_recording(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Resume { reply }).await
    }

    /// Stop recording and wait for the artifact.
    ///
    /// Returns `Ok(None)` when nothing was recording or a stop is already in
    /// flight.
    pub async fn stop_recording(&self) -> Result<Option<Arc<RecordedBlob>>, SessionError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Save the current artifact under its derived filename
    pub async fn download_recording(&self) -> Result<PathBuf, SessionError> {
        let request = self
            .request(|reply| Command::PrepareDownload { reply })
            .await?;
        let path = self
            .downloads
            .save(&request.url, &request.blob, &request.filename)
            .await?;
        info!(path = %path.display(), "recording downloaded");
        Ok(path)
    }

    /// Discard any recording and artifact and return to idle
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Reset { reply }).await
    }

    /// Tear the session down. Other handles see `SessionClosed` afterwards.
    pub async fn shutdown(self) -> Result<(), SessionError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<Result<T, SessionError>>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        reply_rx.await.map_err(|_| SessionError::SessionClosed)?
    }
}

impl<D> RecordingSession<D> {
    pub fn is_recording(&self) -> bool {
        self.state.borrow().is_recording
    }

    pub fn is_paused(&self) -> bool {
        self.state.borrow().is_paused
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().state
    }

    /// Elapsed recording time in whole seconds
    pub fn duration_secs(&self) -> u64 {
        self.state.borrow().duration_secs
    }

    /// Elapsed recording time as `MM:SS` or `HH:MM:SS`
    pub fn formatted_duration(&self) -> String {
        self.state.borrow().formatted_duration.clone()
    }

    pub fn recorded_blob(&self) -> Option<Arc<RecordedBlob>> {
        self.state.borrow().recorded_blob.clone()
    }

    pub fn recorded_url(&self) -> Option<ObjectUrl> {
        self.state.borrow().recorded_url.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// Construction-time options
    pub fn options(&self) -> &RecordingOptions {
        &self.options
    }

    /// Button captions, with defaults filled in
    pub fn button_labels(&self) -> ButtonLabels {
        self.options.labels()
    }
}
