//! ScreenRecorder - screen capture sessions with pause/resume and download
//!
//! This crate provides a recording session that captures the screen (and
//! optionally audio), accumulates encoded chunks, tracks elapsed recording
//! time, and saves the finished WebM or MP4 file.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Formats, options, session state machine, and errors
//! - **Application**: The recording session and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (FFmpeg, object URLs, downloads, config)
//! - **CLI**: Command-line interface, argument parsing, and recording controls

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
