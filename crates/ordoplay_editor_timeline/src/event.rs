// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural change notifications for the host.

use crate::clip::ClipId;
use crate::span::FrameSpan;
use crate::track::TrackId;

/// A structural change to the timeline.
///
/// The timeline queues these as edits succeed; the host drains them with
/// [`crate::Timeline::take_events`] to keep its views in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEvent {
    /// A track was added at `index`
    TrackAdded {
        /// New track
        track: TrackId,
        /// Position in the track list
        index: usize,
    },
    /// A track and all of its clips were removed
    TrackRemoved(TrackId),
    /// A track changed position
    TrackMoved {
        /// Moved track
        track: TrackId,
        /// Previous position
        from: usize,
        /// New position
        to: usize,
    },
    /// A clip was attached to a track
    ClipAdded {
        /// Owning track
        track: TrackId,
        /// New clip
        clip: ClipId,
    },
    /// A clip was detached from a track
    ClipRemoved {
        /// Previous owner
        track: TrackId,
        /// Removed clip
        clip: ClipId,
    },
    /// A clip changed owner
    ClipMoved {
        /// Moved clip
        clip: ClipId,
        /// Previous owner
        from: TrackId,
        /// New owner
        to: TrackId,
    },
    /// A clip's span changed
    ClipSpanChanged {
        /// Owning track
        track: TrackId,
        /// Changed clip
        clip: ClipId,
        /// Span before the edit
        old: FrameSpan,
        /// Span after the edit
        new: FrameSpan,
    },
    /// The whole model was replaced
    Reloaded,
}

impl TimelineEvent {
    /// Track the event refers to, if any
    pub fn track(&self) -> Option<TrackId> {
        match self {
            Self::TrackAdded { track, .. }
            | Self::TrackMoved { track, .. }
            | Self::ClipAdded { track, .. }
            | Self::ClipRemoved { track, .. }
            | Self::ClipSpanChanged { track, .. }
            | Self::TrackRemoved(track) => Some(*track),
            Self::ClipMoved { to, .. } => Some(*to),
            Self::Reloaded => None,
        }
    }
}
