// Error types for lapsight

use std::{fmt, io, sync::mpsc::SendError};

use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::playback::PlaybackFrame;

#[derive(Debug, Snafu)]
pub enum LapsightError {
    // Errors while reading raw exports
    #[snafu(display("Error reading telemetry export {path}"))]
    ExportReadError { path: String, source: io::Error },

    // Errors for the session writer and loader
    #[snafu(display("Error writing session file"))]
    WriterError { source: io::Error },
    #[snafu(display("Error loading session file"))]
    SessionLoaderError { source: io::Error },
    #[snafu(display("Invalid session file: {reason}"))]
    InvalidSessionFile { reason: String },

    // Session storage errors
    #[snafu(display("Session storage error: {reason}"))]
    SessionStorageError { reason: String },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Playback errors
    #[snafu(display("Invalid playback speed multiplier: {multiplier}"))]
    InvalidPlaybackSpeed { multiplier: f64 },
    #[snafu(display("Error broadcasting playback frame"))]
    PlaybackBroadcastError {
        source: Box<SendError<PlaybackFrame>>,
    },
}

impl From<SendError<PlaybackFrame>> for LapsightError {
    fn from(value: SendError<PlaybackFrame>) -> Self {
        LapsightError::PlaybackBroadcastError {
            source: Box::new(value),
        }
    }
}

/// Data integrity problems that were recovered from locally.
///
/// These never abort ingestion. They are logged when detected and kept on the
/// session so callers can surface them next to the data they affect.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum DataWarning {
    /// A lap record arrived before any data point and could not be anchored
    OrphanLapBoundary { lap_number: u32 },
    /// A lap boundary pointed past the end of the point array
    LapBoundaryOutOfRange {
        lap_number: u32,
        point_index: usize,
        clamped_to: usize,
    },
    /// A lap boundary did not advance past the previous boundary
    LapBoundaryOutOfOrder {
        lap_number: u32,
        point_index: usize,
        previous_index: usize,
    },
    /// The first time token resolved before 2000-01-01 or not at all
    CorruptTimestamp { token: String, substituted_ms: i64 },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::OrphanLapBoundary { lap_number } => {
                write!(f, "Lap {lap_number} recorded before any data point, dropped")
            }
            DataWarning::LapBoundaryOutOfRange {
                lap_number,
                point_index,
                clamped_to,
            } => write!(
                f,
                "Lap {lap_number} ends at point {point_index} which is out of range, clamped to {clamped_to}"
            ),
            DataWarning::LapBoundaryOutOfOrder {
                lap_number,
                point_index,
                previous_index,
            } => write!(
                f,
                "Lap {lap_number} ends at point {point_index}, not after previous lap end {previous_index}"
            ),
            DataWarning::CorruptTimestamp {
                token,
                substituted_ms,
            } => write!(
                f,
                "Time token {token:?} is not a plausible date, session start replaced with ingestion time {substituted_ms}"
            ),
        }
    }
}
