//! Session control loop
//!
//! One task owns every piece of mutable session state. Handle commands,
//! recorder events and duration ticks are multiplexed through a single
//! `select!`, so no lock ever guards the state.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, info, warn};

use super::error::SessionError;
use crate::application::ports::{
    CaptureConstraints, CaptureSource, CaptureStream, DownloadError, ObjectUrlStore, RecorderControl,
    RecorderError, RecorderEvent, RecorderEvents, RecorderFactory, RecorderOptions,
    RecorderParts, RecorderState,
};
use crate::domain::recording::{
    format_clock, ObjectUrl, RecordedBlob, RecordingFormat, RecordingOptions,
};
use crate::domain::session::{
    InvalidStateTransition, SessionErrorKind, SessionLifecycle, SessionSnapshot,
};

/// Period of the elapsed-time counter
pub(super) const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub(super) type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Requests sent from handles to the control loop
pub(super) enum Command {
    Start {
        options: RecordingOptions,
        reply: Reply<()>,
    },
    Pause {
        reply: Reply<()>,
    },
    Resume {
        reply: Reply<()>,
    },
    Stop {
        reply: Reply<Option<Arc<RecordedBlob>>>,
    },
    PrepareDownload {
        reply: Reply<DownloadRequest>,
    },
    Reset {
        reply: Reply<()>,
    },
    Shutdown {
        reply: Reply<()>,
    },
}

/// Everything a handle needs to save the current artifact
#[derive(Debug, Clone)]
pub(super) struct DownloadRequest {
    pub url: ObjectUrl,
    pub blob: Arc<RecordedBlob>,
    pub filename: String,
}

/// The stream/recorder pair of the recording in progress
struct ActiveRecording<S> {
    stream: S,
    control: Box<dyn RecorderControl>,
    mime_type: String,
    options: RecordingOptions,
}

pub(super) struct SessionActor<C: CaptureSource, F, U> {
    capture: C,
    factory: F,
    urls: U,
    lifecycle: SessionLifecycle,
    duration_secs: u64,
    chunks: Vec<Vec<u8>>,
    active: Option<ActiveRecording<C::Stream>>,
    events: Option<RecorderEvents>,
    ticker: Option<Interval>,
    pending_stop: Option<Reply<Option<Arc<RecordedBlob>>>>,
    recorded_blob: Option<Arc<RecordedBlob>>,
    recorded_url: Option<ObjectUrl>,
    recorded_filename: Option<String>,
    last_error: Option<SessionErrorKind>,
    state_tx: watch::Sender<SessionSnapshot>,
}

impl<C, F, U> SessionActor<C, F, U>
where
    C: CaptureSource,
    F: RecorderFactory<C::Stream>,
    U: ObjectUrlStore,
{
    pub(super) fn new(
        capture: C,
        factory: F,
        urls: U,
        state_tx: watch::Sender<SessionSnapshot>,
    ) -> Self {
        Self {
            capture,
            factory,
            urls,
            lifecycle: SessionLifecycle::new(),
            duration_secs: 0,
            chunks: Vec::new(),
            active: None,
            events: None,
            ticker: None,
            pending_stop: None,
            recorded_blob: None,
            recorded_url: None,
            recorded_filename: None,
            last_error: None,
            state_tx,
        }
    }

    /// Run until shut down or every handle is gone
    pub(super) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        self.reset();
                        let _ = reply.send(Ok(()));
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                event = next_event(&mut self.events) => self.handle_event(event),
                () = next_tick(&mut self.ticker) => self.handle_tick(),
            }
        }

        self.reset();
        debug!("recording session closed");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { options, reply } => {
                let result = self.start(options).await;
                let _ = reply.send(result);
            }
            Command::Pause { reply } => {
                let _ = reply.send(self.pause());
            }
            Command::Resume { reply } => {
                let _ = reply.send(self.resume());
            }
            Command::Stop { reply } => self.stop(reply),
            Command::PrepareDownload { reply } => {
                let _ = reply.send(self.prepare_download());
            }
            Command::Reset { reply } => {
                self.reset();
                let _ = reply.send(Ok(()));
            }
            Command::Shutdown { reply } => {
                // Handled by the loop; kept exhaustive for the compiler.
                let _ = reply.send(Ok(()));
            }
        }
    }

    async fn start(&mut self, options: RecordingOptions) -> Result<(), SessionError> {
        self.lifecycle.ensure_can_start()?;

        let constraints = CaptureConstraints::from_options(&options);
        let stream = match self.capture.acquire(&constraints).await {
            Ok(stream) => stream,
            Err(e) => return Err(self.fail(e.into())),
        };
        debug!(stream = stream.id(), tracks = stream.tracks().len(), "capture stream acquired");

        let parts = match self.open_recorder(&stream, &options) {
            Ok(parts) => parts,
            Err(e) => {
                stream.stop_all_tracks();
                return Err(self.fail(e));
            }
        };

        self.lifecycle.start()?;
        self.chunks.clear();
        self.duration_secs = 0;
        self.last_error = None;
        self.events = Some(parts.events);
        self.ticker = Some(interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL));
        info!(mime_type = %parts.mime_type, "recording started");
        self.active = Some(ActiveRecording {
            stream,
            control: parts.control,
            mime_type: parts.mime_type,
            options,
        });

        self.publish();
        Ok(())
    }

    fn open_recorder(
        &self,
        stream: &C::Stream,
        options: &RecordingOptions,
    ) -> Result<RecorderParts, SessionError> {
        let recorder_options = RecorderOptions::from_options(options);
        if let Some(mime_type) = recorder_options.mime_type.as_deref() {
            if !self.factory.is_type_supported(mime_type) {
                return Err(SessionError::UnsupportedFormat {
                    mime_type: mime_type.to_string(),
                });
            }
        }

        let mut parts = self.factory.create(stream, &recorder_options)?;
        let timeslice = options.timeslice_ms.map(Duration::from_millis);
        parts.control.start(timeslice)?;
        Ok(parts)
    }

    fn pause(&mut self) -> Result<(), SessionError> {
        self.lifecycle.pause()?;
        if let Err(e) = self.control_mut(|control| control.pause()) {
            return Err(self.fail(e));
        }
        debug!(duration = self.duration_secs, "recording paused");
        self.publish();
        Ok(())
    }

    fn resume(&mut self) -> Result<(), SessionError> {
        self.lifecycle.resume()?;
        if let Err(e) = self.control_mut(|control| control.resume()) {
            return Err(self.fail(e));
        }
        debug!(duration = self.duration_secs, "recording resumed");
        self.publish();
        Ok(())
    }

    fn stop(&mut self, reply: Reply<Option<Arc<RecordedBlob>>>) {
        // Nothing recording, or a stop already in flight: no-op
        if !self.lifecycle.is_recording() {
            let _ = reply.send(Ok(None));
            return;
        }

        if let Err(e) = self.lifecycle.request_stop() {
            let _ = reply.send(Err(e.into()));
            return;
        }
        if let Err(e) = self.control_mut(|control| control.stop()) {
            let _ = reply.send(Err(self.fail(e)));
            return;
        }

        debug!(chunks = self.chunks.len(), "stop requested, waiting for final data");
        self.pending_stop = Some(reply);
        self.publish();
    }

    /// Resolve the artifact through its object URL and pair it with the filename
    fn prepare_download(&self) -> Result<DownloadRequest, SessionError> {
        let Some(url) = self.recorded_url.as_ref() else {
            return Err(InvalidStateTransition::new(self.lifecycle.state(), "download").into());
        };
        let blob = self
            .urls
            .resolve(url)
            .ok_or_else(|| DownloadError::UnresolvedUrl(url.to_string()))?;
        let filename = self
            .recorded_filename
            .clone()
            .unwrap_or_else(|| RecordingOptions::default().download_filename(blob.format()));

        Ok(DownloadRequest {
            url: url.clone(),
            blob,
            filename,
        })
    }

    fn handle_event(&mut self, event: Option<RecorderEvent>) {
        if self.active.is_none() {
            self.events = None;
            return;
        }

        match event {
            Some(RecorderEvent::DataAvailable(data)) => {
                if !data.is_empty() {
                    self.chunks.push(data);
                    self.publish();
                }
            }
            Some(RecorderEvent::Stopped) => self.finalize(),
            Some(RecorderEvent::Errored(e)) => {
                self.fail(SessionError::RecorderFault(e));
            }
            None => {
                self.fail(SessionError::RecorderFault(RecorderError::Fault(
                    "recorder went away without finishing".to_string(),
                )));
            }
        }
    }

    fn handle_tick(&mut self) {
        if self.lifecycle.is_capturing() {
            self.duration_secs += 1;
            self.publish();
        }
    }

    /// Concatenate the chunks into the artifact and return to idle
    fn finalize(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.events = None;
        self.ticker = None;
        active.stream.stop_all_tracks();

        let blob = Arc::new(RecordedBlob::from_chunks(
            self.chunks.drain(..),
            active.mime_type,
        ));

        if let Some(previous) = self.recorded_url.take() {
            self.urls.revoke_object_url(&previous);
        }
        let url = self.urls.create_object_url(Arc::clone(&blob));

        if self.lifecycle.request_stop().is_ok() {
            warn!("recorder stopped on its own, finalizing recording");
        }
        if let Err(e) = self.lifecycle.finish_stop() {
            warn!(error = %e, "unexpected state while finalizing");
            self.lifecycle.abort();
        }

        info!(
            size = %blob.human_readable_size(),
            duration = %format_clock(self.duration_secs),
            url = %url,
            "recording finalized"
        );
        self.recorded_filename = Some(active.options.download_filename(blob.format()));
        self.recorded_blob = Some(Arc::clone(&blob));
        self.recorded_url = Some(url);

        if let Some(reply) = self.pending_stop.take() {
            let _ = reply.send(Ok(Some(blob)));
        }
        self.publish();
    }

    /// Abandon the recording in progress and return to idle
    fn fail(&mut self, error: SessionError) -> SessionError {
        warn!(error = %error, "recording failed, returning to idle");
        self.release_recording();
        self.lifecycle.abort();
        self.last_error = Some(error.kind());
        if let Some(reply) = self.pending_stop.take() {
            let _ = reply.send(Err(error.clone()));
        }
        self.publish();
        error
    }

    /// Tear everything down; safe to call repeatedly
    fn reset(&mut self) {
        self.release_recording();
        if let Some(url) = self.recorded_url.take() {
            self.urls.revoke_object_url(&url);
        }
        self.recorded_blob = None;
        self.recorded_filename = None;
        self.duration_secs = 0;
        self.last_error = None;
        self.lifecycle.abort();
        if let Some(reply) = self.pending_stop.take() {
            let _ = reply.send(Ok(None));
        }
        self.publish();
    }

    fn release_recording(&mut self) {
        if let Some(mut active) = self.active.take() {
            if active.control.state() != RecorderState::Inactive {
                if let Err(e) = active.control.stop() {
                    debug!(error = %e, "recorder stop during release failed");
                }
            }
            active.stream.stop_all_tracks();
        }
        self.events = None;
        self.ticker = None;
        self.chunks.clear();
    }

    fn control_mut(
        &mut self,
        op: impl FnOnce(&mut dyn RecorderControl) -> Result<(), RecorderError>,
    ) -> Result<(), SessionError> {
        let active = self.active.as_mut().ok_or_else(|| {
            SessionError::RecorderFault(RecorderError::Fault("no active recorder".to_string()))
        })?;
        op(active.control.as_mut()).map_err(SessionError::from)
    }

    fn snapshot(&self) -> SessionSnapshot {
        let mime_type = self
            .active
            .as_ref()
            .map(|a| a.mime_type.clone())
            .or_else(|| self.recorded_blob.as_ref().map(|b| b.mime_type().to_string()));

        SessionSnapshot {
            state: self.lifecycle.state(),
            is_recording: self.lifecycle.is_recording(),
            is_paused: self.lifecycle.is_paused(),
            duration_secs: self.duration_secs,
            formatted_duration: format_clock(self.duration_secs),
            recorded_blob: self.recorded_blob.clone(),
            recorded_url: self.recorded_url.clone(),
            recorded_size: self.recorded_blob.as_ref().map(|b| b.size_bytes()),
            format: mime_type.as_deref().map(RecordingFormat::from_mime_type),
            mime_type,
            chunk_count: self.chunks.len(),
            last_error: self.last_error,
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot());
    }
}

async fn next_event(events: &mut Option<RecorderEvents>) -> Option<RecorderEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => future::pending().await,
    }
}
