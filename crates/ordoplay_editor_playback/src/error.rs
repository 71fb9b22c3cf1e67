// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error type for the playback pipeline.

use crate::history::HistoryError;
use ordoplay_editor_timeline::TimelineError;
use thiserror::Error;

/// Errors reported by sessions, renderers and export
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A model operation failed
    #[error(transparent)]
    Timeline(#[from] TimelineError),

    /// Undo/redo failed
    #[error(transparent)]
    History(#[from] HistoryError),

    /// The render pool has shut down
    #[error("Render pool is closed")]
    PoolClosed,

    /// An export frame range was empty or negative
    #[error("Invalid frame range {begin}..{end}")]
    InvalidRange {
        /// First frame
        begin: i64,
        /// End frame (exclusive)
        end: i64,
    },

    /// A frame or audio sink failed
    #[error("Sink error: {0}")]
    Sink(String),

    /// Configuration could not be read or written
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
