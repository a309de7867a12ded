//! Config command handler

use std::str::FromStr;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::{Duration, MimeType};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    ensure_valid_key(key)?;

    let mut config = store.load().await?;
    set_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    ensure_valid_key(key)?;

    let config = store.load().await?;
    match get_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = get_value(&config, key);
        presenter.key_value(key, value.as_deref().unwrap_or(NOT_SET));
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn ensure_valid_key(key: &str) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        });
    }
    Ok(())
}

/// Read a dotted key from the config
fn get_value(config: &AppConfig, key: &str) -> Option<String> {
    let recording = config.recording.as_ref();
    let labels = recording.and_then(|r| r.button_labels.as_ref());
    let output = config.output.as_ref();
    let ffmpeg = config.ffmpeg.as_ref();

    match key {
        "recording.mime_type" => recording.and_then(|r| r.mime_type.clone()),
        "recording.video_bits_per_second" => {
            recording.and_then(|r| r.video_bits_per_second).map(|v| v.to_string())
        }
        "recording.audio_bits_per_second" => {
            recording.and_then(|r| r.audio_bits_per_second).map(|v| v.to_string())
        }
        "recording.frame_rate" => recording.and_then(|r| r.frame_rate).map(|v| v.to_string()),
        "recording.width" => recording.and_then(|r| r.width).map(|v| v.to_string()),
        "recording.height" => recording.and_then(|r| r.height).map(|v| v.to_string()),
        "recording.audio" => recording.and_then(|r| r.audio).map(|b| b.to_string()),
        "recording.download_name" => recording.and_then(|r| r.custom_download_name.clone()),
        "recording.download_extension" => {
            recording.and_then(|r| r.custom_download_extension.clone())
        }
        "recording.timeslice_ms" => recording.and_then(|r| r.timeslice_ms).map(|v| v.to_string()),
        "labels.start" => labels.and_then(|l| l.start.clone()),
        "labels.stop" => labels.and_then(|l| l.stop.clone()),
        "labels.pause" => labels.and_then(|l| l.pause.clone()),
        "labels.resume" => labels.and_then(|l| l.resume.clone()),
        "labels.download" => labels.and_then(|l| l.download.clone()),
        "output.dir" => output.and_then(|o| o.dir.clone()),
        "output.max_duration" => output.and_then(|o| o.max_duration.clone()),
        "ffmpeg.path" => ffmpeg.and_then(|f| f.path.clone()),
        "ffmpeg.display" => ffmpeg.and_then(|f| f.display.clone()),
        "ffmpeg.audio_input" => ffmpeg.and_then(|f| f.audio_input.clone()),
        _ => None,
    }
}

/// Validate and write a dotted key into the config
fn set_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "recording.mime_type" => {
            MimeType::from_str(value).map_err(|e| invalid(e.to_string()))?;
            config.recording_mut().mime_type = Some(value.trim().to_string());
        }
        "recording.video_bits_per_second" => {
            config.recording_mut().video_bits_per_second = Some(parse_positive(value).map_err(invalid)?);
        }
        "recording.audio_bits_per_second" => {
            config.recording_mut().audio_bits_per_second = Some(parse_positive(value).map_err(invalid)?);
        }
        "recording.frame_rate" => {
            config.recording_mut().frame_rate = Some(parse_positive(value).map_err(invalid)?);
        }
        "recording.width" => {
            config.recording_mut().width = Some(parse_positive(value).map_err(invalid)?);
        }
        "recording.height" => {
            config.recording_mut().height = Some(parse_positive(value).map_err(invalid)?);
        }
        "recording.audio" => {
            let audio = parse_bool(value)
                .map_err(|_| invalid("Value must be 'true' or 'false'".to_string()))?;
            config.recording_mut().audio = Some(audio);
        }
        "recording.download_name" => {
            config.recording_mut().custom_download_name =
                Some(parse_file_part(value).map_err(invalid)?);
        }
        "recording.download_extension" => {
            let extension = parse_file_part(value.trim_start_matches('.')).map_err(invalid)?;
            config.recording_mut().custom_download_extension = Some(extension);
        }
        "recording.timeslice_ms" => {
            config.recording_mut().timeslice_ms = Some(parse_positive(value).map_err(invalid)?);
        }
        "labels.start" => config.labels_mut().start = Some(value.to_string()),
        "labels.stop" => config.labels_mut().stop = Some(value.to_string()),
        "labels.pause" => config.labels_mut().pause = Some(value.to_string()),
        "labels.resume" => config.labels_mut().resume = Some(value.to_string()),
        "labels.download" => config.labels_mut().download = Some(value.to_string()),
        "output.dir" => config.output_mut().dir = Some(value.to_string()),
        "output.max_duration" => {
            value.parse::<Duration>().map_err(|e| invalid(e.to_string()))?;
            config.output_mut().max_duration = Some(value.to_string());
        }
        "ffmpeg.path" => config.ffmpeg_mut().path = Some(value.to_string()),
        "ffmpeg.display" => config.ffmpeg_mut().display = Some(value.to_string()),
        "ffmpeg.audio_input" => config.ffmpeg_mut().audio_input = Some(value.to_string()),
        _ => return Err(invalid("Unknown key".to_string())),
    }
    Ok(())
}

/// Parse a number that must be greater than zero
fn parse_positive<T>(value: &str) -> Result<T, String>
where
    T: FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(format!("Invalid value '{}'. Expected a positive number", value)),
    }
}

/// Parse a file name component (no directories)
fn parse_file_part(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains(&['/', '\\'][..]) {
        return Err(format!("Invalid value '{}'. Expected a plain file name", value));
    }
    Ok(trimmed.to_string())
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}
