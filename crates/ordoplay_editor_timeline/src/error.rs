// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error type shared by every timeline operation.

use crate::clip::{ClipId, ClipKind};
use crate::engine::HolderRef;
use crate::keyframe::{KeyFrameId, ValueKind};
use crate::parameter::Parameter;
use crate::span::FrameSpan;
use crate::track::TrackId;
use thiserror::Error;

/// Errors reported by the timeline model.
///
/// Structural edits that fail leave the model unchanged; the error carries the
/// reason so the host can present it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    /// A span was built with a negative begin or duration
    #[error("Invalid span: begin {begin}, duration {duration}")]
    InvalidSpan {
        /// Requested begin frame
        begin: i64,
        /// Requested duration
        duration: i64,
    },

    /// A negative frame was passed to a mutating API
    #[error("Frame {0} is negative")]
    NegativeFrame(i64),

    /// Inserting or moving a clip would overlap a sibling
    #[error("Cannot place clip {clip:?} at {span}: would overlap clip {existing:?} at {existing_span}")]
    Overlap {
        /// Clip being placed
        clip: ClipId,
        /// Requested span
        span: FrameSpan,
        /// Clip already occupying the range
        existing: ClipId,
        /// Span of the occupying clip
        existing_span: FrameSpan,
    },

    /// The track does not accept this kind of clip
    #[error("Track accepts {expected:?} clips, got {found:?}")]
    ClipKindMismatch {
        /// Kind accepted by the track
        expected: ClipKind,
        /// Kind of the rejected clip
        found: ClipKind,
    },

    /// Clip not found
    #[error("Clip not found: {0:?}")]
    ClipNotFound(ClipId),

    /// Track not found
    #[error("Track not found: {0:?}")]
    TrackNotFound(TrackId),

    /// The clip already belongs to a track
    #[error("Clip {0:?} is already attached to a track")]
    ClipAlreadyAttached(ClipId),

    /// The track is locked against structural edits
    #[error("Track {0:?} is locked")]
    TrackLocked(TrackId),

    /// A value of the wrong kind was given for a parameter
    #[error("{parameter:?} expects {expected:?} values, got {found:?}")]
    TypeMismatch {
        /// Target parameter
        parameter: Parameter,
        /// Kind the parameter stores
        expected: ValueKind,
        /// Kind that was supplied
        found: ValueKind,
    },

    /// The holder has no sequence for this parameter
    #[error("Parameter {0:?} is not available on this holder")]
    UnknownParameter(Parameter),

    /// Keyframe not found
    #[error("Keyframe not found: {0:?}")]
    KeyFrameNotFound(KeyFrameId),

    /// A keyframe already exists at the target frame
    #[error("A keyframe already exists at frame {0}")]
    DuplicateKeyFrame(i64),

    /// The requested split spans do not describe a cut of the clip
    #[error("Invalid split of clip {clip:?}: {reason}")]
    InvalidSplit {
        /// Clip being split
        clip: ClipId,
        /// Human-readable reason
        reason: String,
    },

    /// A cut would leave a clip with a negative duration
    #[error("Cut would leave clip {clip:?} with negative duration {duration}")]
    NegativeDuration {
        /// Clip being cut
        clip: ClipId,
        /// Resulting duration
        duration: i64,
    },

    /// A mutating API was called while the holder is being evaluated
    #[error("Cannot edit {0:?} while automation is being evaluated")]
    EditDuringEvaluation(HolderRef),

    /// One operation of a batch failed, nothing was applied
    #[error("Batch rejected at operation {index} (clip {clip:?}): {reason}")]
    BatchRejected {
        /// Index of the failing operation within the batch
        index: usize,
        /// Clip targeted by the failing operation
        clip: ClipId,
        /// Why it failed
        reason: Box<TimelineError>,
    },

    /// The operation was cancelled before it was applied
    #[error("Cancelled after {completed} of {total} units")]
    Cancelled {
        /// Units of work finished before cancellation
        completed: usize,
        /// Total units of work
        total: usize,
    },

    /// Decoded state violates a model invariant
    #[error("Invalid timeline state: {0}")]
    InvalidState(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TimelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;
