//! Main app runner for record mode

use std::env;
use std::process::ExitCode;

use tracing::debug;

use crate::application::ports::ConfigStore;
use crate::application::RecordingSession;
use crate::domain::config::{AppConfig, FfmpegConfig, OutputConfig};
use crate::domain::session::SessionSnapshot;
use crate::infrastructure::{
    DirectoryDownloader, FfmpegCaptureSource, FfmpegRecorderFactory, InMemoryObjectUrls,
    XdgConfigStore,
};

use super::args::RecordOptions;
use super::presenter::Presenter;
use super::signals::{ControlSignal, ControlSignalHandler};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding `ffmpeg.path`
pub const FFMPEG_ENV: &str = "SCREEN_RECORDER_FFMPEG";
/// Environment variable overriding `output.dir`
pub const OUTPUT_DIR_ENV: &str = "SCREEN_RECORDER_OUTPUT_DIR";

/// Record until stopped, then save the recording
pub async fn run_record(options: RecordOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    // Setup signal handler
    let (mut controls, control_tx) = match ControlSignalHandler::new() {
        Ok(handler) => handler,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };
    ControlSignalHandler::listen_stdin(control_tx);

    // Create adapters
    let capture = FfmpegCaptureSource::new()
        .with_ffmpeg_path(options.ffmpeg_path.clone())
        .with_display(options.display.clone())
        .with_audio_input(options.audio_input.clone());
    let downloads = match options.output_dir.as_deref() {
        Some(dir) => DirectoryDownloader::new(dir),
        None => DirectoryDownloader::default_location(),
    };

    let session = RecordingSession::new(
        capture,
        FfmpegRecorderFactory::new(),
        InMemoryObjectUrls::new(),
        downloads,
        options.recording.clone(),
    );
    let labels = session.button_labels();

    presenter.start_spinner(&format!("{}...", labels.start()));
    if let Err(e) = session.start_recording().await {
        presenter.stop_spinner();
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let max_secs = options.max_duration.map(|d| d.as_std().as_secs());
    let mut updates = session.subscribe();
    loop {
        let snapshot = updates.borrow_and_update().clone();
        presenter.recording_status(&snapshot, &labels);
        if options.json {
            presenter.snapshot_json(&snapshot);
        }

        // Finished on its own or failed
        if !snapshot.is_recording {
            break;
        }
        if max_secs.is_some_and(|limit| snapshot.duration_secs >= limit) {
            presenter.info("Maximum duration reached");
            break;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            control = controls.recv() => match control {
                Some(ControlSignal::Stop) | None => break,
                Some(ControlSignal::TogglePause) => {
                    let result = if session.is_paused() {
                        session.resume_recording().await
                    } else {
                        session.pause_recording().await
                    };
                    if let Err(e) = result {
                        presenter.warn(&e.to_string());
                    }
                }
            },
        }
    }

    presenter.update_spinner(&format!("{}...", labels.stop()));
    let blob = match session.stop_recording().await {
        Ok(Some(blob)) => Some(blob),
        // Already finalized without a stop request
        Ok(None) => session.recorded_blob(),
        Err(e) => {
            presenter.spinner_fail(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let Some(blob) = blob else {
        presenter.spinner_fail(&failure_message(&session.snapshot()));
        return ExitCode::from(EXIT_ERROR);
    };
    presenter.spinner_success(&format!(
        "Recorded {} ({}, {})",
        session.formatted_duration(),
        blob.human_readable_size(),
        blob.format()
    ));
    if blob.is_empty() {
        presenter.warn("The recording is empty");
    }

    let code = match session.download_recording().await {
        Ok(path) => {
            presenter.success(&format!("{}: {}", labels.download(), path.display()));
            presenter.output(&path.display().to_string());
            if options.json {
                presenter.snapshot_json(&session.snapshot());
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    };

    if let Err(e) = session.shutdown().await {
        debug!(error = %e, "session shutdown failed");
    }
    code
}

fn failure_message(snapshot: &SessionSnapshot) -> String {
    match snapshot.last_error {
        Some(kind) => format!("Recording failed ({})", kind),
        None => "Recording ended without any data".to_string(),
    }
}

/// Config layer from environment variables
fn env_config() -> AppConfig {
    let var = |name: &str| env::var(name).ok().filter(|s| !s.trim().is_empty());

    AppConfig {
        recording: None,
        output: var(OUTPUT_DIR_ENV).map(|dir| OutputConfig {
            dir: Some(dir),
            max_duration: None,
        }),
        ffmpeg: var(FFMPEG_ENV).map(|path| FfmpegConfig {
            path: Some(path),
            ..Default::default()
        }),
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load_or_empty().await;

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config)
}
