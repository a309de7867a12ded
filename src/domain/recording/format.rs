//! Recording container format and MIME type value objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::MimeTypeParseError;

/// Container format of a finished recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingFormat {
    #[default]
    Webm,
    Mp4,
}

impl RecordingFormat {
    /// Derive the format from a negotiated MIME type string.
    ///
    /// Anything that is not an MP4 container is treated as WebM, which is
    /// what capture hosts fall back to.
    pub fn from_mime_type(mime_type: &str) -> Self {
        match mime_type.parse::<MimeType>() {
            Ok(mime) => mime.format(),
            Err(_) if mime_type.to_ascii_lowercase().contains("mp4") => Self::Mp4,
            Err(_) => Self::Webm,
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
        }
    }

    /// Get the bare container MIME type
    pub const fn container_mime(&self) -> &'static str {
        match self {
            Self::Webm => "video/webm",
            Self::Mp4 => "video/mp4",
        }
    }
}

impl fmt::Display for RecordingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Parsed `type/subtype;codecs=...` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeType {
    media: String,
    format: RecordingFormat,
    codecs: Vec<String>,
}

impl MimeType {
    /// Build a MIME type for a format with explicit codecs
    pub fn new(format: RecordingFormat, codecs: &[&str]) -> Self {
        Self {
            media: "video".to_string(),
            format,
            codecs: codecs.iter().map(|c| c.to_ascii_lowercase()).collect(),
        }
    }

    /// Container format
    pub fn format(&self) -> RecordingFormat {
        self.format
    }

    /// Codec identifiers in the order given, lowercased
    pub fn codecs(&self) -> &[String] {
        &self.codecs
    }

    /// Whether the type is `audio/*`
    pub fn is_audio_only(&self) -> bool {
        self.media == "audio"
    }
}

impl FromStr for MimeType {
    type Err = MimeTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MimeTypeParseError { input: s.to_string() };
        let lower = s.trim().to_ascii_lowercase();

        let mut parts = lower.split(';');
        let essence = parts.next().map(str::trim).ok_or_else(invalid)?;
        let (media, subtype) = essence.split_once('/').ok_or_else(invalid)?;

        let media = media.trim();
        if media != "video" && media != "audio" {
            return Err(invalid());
        }
        let format = match subtype.trim() {
            "webm" | "x-matroska" => RecordingFormat::Webm,
            "mp4" => RecordingFormat::Mp4,
            _ => return Err(invalid()),
        };

        let mut codecs = Vec::new();
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            if key.trim() != "codecs" {
                continue;
            }
            codecs.extend(
                value
                    .trim()
                    .trim_matches('"')
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string),
            );
        }

        Ok(Self {
            media: media.to_string(),
            format,
            codecs,
        })
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media, self.format.extension())?;
        if !self.codecs.is_empty() {
            write!(f, ";codecs={}", self.codecs.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_extension() {
        assert_eq!(RecordingFormat::Webm.extension(), "webm");
        assert_eq!(RecordingFormat::Mp4.extension(), "mp4");
    }

    #[test]
    fn format_from_negotiated_mime() {
        assert_eq!(
            RecordingFormat::from_mime_type("video/webm;codecs=vp9,opus"),
            RecordingFormat::Webm
        );
        assert_eq!(
            RecordingFormat::from_mime_type("video/mp4;codecs=avc1"),
            RecordingFormat::Mp4
        );
        assert_eq!(RecordingFormat::from_mime_type("video/x-matroska"), RecordingFormat::Webm);
    }

    #[test]
    fn unknown_mime_falls_back() {
        assert_eq!(RecordingFormat::from_mime_type("application/mp4-ish"), RecordingFormat::Mp4);
        assert_eq!(RecordingFormat::from_mime_type(""), RecordingFormat::Webm);
    }

    #[test]
    fn parse_with_codecs() {
        let mime: MimeType = "video/webm; codecs=\"vp8, opus\"".parse().unwrap();
        assert_eq!(mime.format(), RecordingFormat::Webm);
        assert_eq!(mime.codecs(), &["vp8".to_string(), "opus".to_string()]);
        assert!(!mime.is_audio_only());
    }

    #[test]
    fn parse_is_case_insensitive() {
        let mime: MimeType = "Video/MP4;Codecs=AVC1".parse().unwrap();
        assert_eq!(mime.format(), RecordingFormat::Mp4);
        assert_eq!(mime.codecs(), &["avc1".to_string()]);
    }

    #[test]
    fn parse_audio_only() {
        let mime: MimeType = "audio/webm;codecs=opus".parse().unwrap();
        assert!(mime.is_audio_only());
    }

    #[test]
    fn parse_rejects_other_containers() {
        assert!("video/ogg".parse::<MimeType>().is_err());
        assert!("image/webm".parse::<MimeType>().is_err());
        assert!("webm".parse::<MimeType>().is_err());
    }

    #[test]
    fn display_normalises() {
        let mime = MimeType::new(RecordingFormat::Webm, &["VP9", "opus"]);
        assert_eq!(mime.to_string(), "video/webm;codecs=vp9,opus");
        assert_eq!(
            MimeType::new(RecordingFormat::Mp4, &[]).to_string(),
            "video/mp4"
        );
    }
}
