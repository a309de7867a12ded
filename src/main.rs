//! ScreenRecorder CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use screen_recorder::cli::{
    app::{load_merged_config, run_record, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
    RecordOptions,
};
use screen_recorder::domain::recording::Duration;
use screen_recorder::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays clean for the saved path
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "screen_recorder=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Handle subcommands
    if let Some(Commands::Config { action }) = cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Merge config
    let config = load_merged_config(cli.to_config()).await;

    // Parse max duration
    let max_duration = match config.output.as_ref().and_then(|o| o.max_duration.as_ref()) {
        Some(s) => match s.parse::<Duration>() {
            Ok(d) => Some(d),
            Err(e) => {
                presenter.error(&format!("Invalid max-duration: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        None => None,
    };

    let options = RecordOptions {
        recording: config.recording_or_default(),
        max_duration,
        output_dir: config.output_dir().map(String::from),
        ffmpeg_path: config.ffmpeg_path_or_default().to_string(),
        display: config.display().map(String::from),
        audio_input: config.audio_input().map(String::from),
        json: cli.json,
    };

    tracing::debug!(?options, "starting recording");
    run_record(options).await
}
