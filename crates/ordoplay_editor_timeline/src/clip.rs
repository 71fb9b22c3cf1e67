// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clips: span-bounded units of media placed on a track.

use crate::automation::{AutomationData, EvalPhase};
use crate::engine::HolderRef;
use crate::error::{Result, TimelineError};
use crate::parameter::Parameter;
use crate::span::FrameSpan;
use crate::track::TrackId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Create a new random clip ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind of media a clip carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClipKind {
    /// Picture
    Video,
    /// Sound
    Audio,
}

impl ClipKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Audio => "Audio",
        }
    }
}

/// What a clip plays
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ClipContent {
    /// Nothing; renders transparent and silent
    #[default]
    Empty,
    /// Flat color
    Solid {
        /// RGBA color
        color: [f32; 4],
    },
    /// Vertical gradient
    Gradient {
        /// Color of the first row
        top: [f32; 4],
        /// Color of the last row
        bottom: [f32; 4],
    },
    /// Sine tone
    Tone {
        /// Frequency in Hz
        frequency: f32,
        /// Peak amplitude
        amplitude: f32,
    },
    /// External media file, decoded by the host
    Media {
        /// Path to the media file
        path: PathBuf,
    },
}

/// A span-bounded unit of media owned by one track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,
    /// Display name
    pub name: String,
    kind: ClipKind,
    span: FrameSpan,
    content: ClipContent,
    /// Source frame shown at the clip's first frame
    media_offset: i64,
    automation: AutomationData,
    #[serde(skip)]
    track: Option<TrackId>,
    #[serde(skip)]
    phase: EvalPhase,
}

impl Clip {
    /// Create a detached clip with default automation
    pub fn new(name: impl Into<String>, kind: ClipKind, span: FrameSpan) -> Self {
        Self {
            id: ClipId::new(),
            name: name.into(),
            kind,
            span,
            content: ClipContent::Empty,
            media_offset: 0,
            automation: AutomationData::new(Parameter::for_clip(kind)),
            track: None,
            phase: EvalPhase::Idle,
        }
    }

    /// Builder: set the content
    pub fn with_content(mut self, content: ClipContent) -> Self {
        self.content = content;
        self
    }

    /// Builder: set the source frame shown at the clip's first frame
    pub fn with_media_offset(mut self, media_offset: i64) -> Self {
        self.media_offset = media_offset.max(0);
        self
    }

    /// Kind of media
    pub fn kind(&self) -> ClipKind {
        self.kind
    }

    /// Frames covered on the timeline
    pub fn span(&self) -> FrameSpan {
        self.span
    }

    /// Content played by this clip
    pub fn content(&self) -> &ClipContent {
        &self.content
    }

    /// Replace the content
    pub fn set_content(&mut self, content: ClipContent) -> Result<()> {
        self.ensure_idle()?;
        self.content = content;
        Ok(())
    }

    /// Source frame at the clip's first frame
    pub fn media_offset(&self) -> i64 {
        self.media_offset
    }

    /// Automation owned by this clip
    pub fn automation(&self) -> &AutomationData {
        &self.automation
    }

    /// Mutable automation, refused while the clip is being evaluated
    pub fn automation_mut(&mut self) -> Result<&mut AutomationData> {
        self.ensure_idle()?;
        Ok(&mut self.automation)
    }

    /// Owning track, if attached
    pub fn track(&self) -> Option<TrackId> {
        self.track
    }

    /// Whether the clip is owned by a track
    pub fn is_attached(&self) -> bool {
        self.track.is_some()
    }

    /// Current evaluation phase
    pub fn phase(&self) -> EvalPhase {
        self.phase
    }

    /// Frame relative to the clip's begin
    pub fn relative_frame(&self, frame: i64) -> i64 {
        frame - self.span.begin()
    }

    /// Source media frame shown at timeline `frame`, including the
    /// automated frame offset
    pub fn source_frame(&self, frame: i64) -> i64 {
        let offset = self.automation.long(Parameter::FrameOffset).unwrap_or(0);
        self.media_offset + self.relative_frame(frame) + offset
    }

    /// Whether the clip is silenced or hidden by its own automation
    pub fn is_muted(&self) -> bool {
        self.automation.bool(Parameter::Muted).unwrap_or(false)
    }

    /// Fail with `EditDuringEvaluation` while the engine is pushing values
    pub fn ensure_idle(&self) -> Result<()> {
        if self.phase.is_evaluating() {
            tracing::error!("Clip '{}' edited while its automation is being evaluated", self.name);
            return Err(TimelineError::EditDuringEvaluation(HolderRef::Clip(self.id)));
        }
        Ok(())
    }

    pub(crate) fn set_span(&mut self, span: FrameSpan) {
        self.span = span;
    }

    pub(crate) fn set_track(&mut self, track: Option<TrackId>) {
        self.track = track;
    }

    pub(crate) fn set_phase(&mut self, phase: EvalPhase) {
        self.phase = phase;
    }

    pub(crate) fn automation_data_mut(&mut self) -> &mut AutomationData {
        &mut self.automation
    }

    /// Move the clip's origin forward by `shift` frames while keeping its
    /// content aligned with the timeline
    pub(crate) fn rebase(&mut self, shift: i64) {
        self.automation.shift_key_frames(-shift);
        self.media_offset += shift;
    }

    /// Detached deep copy with fresh identities
    pub(crate) fn duplicate(&self) -> Self {
        Self {
            id: ClipId::new(),
            name: self.name.clone(),
            kind: self.kind,
            span: self.span,
            content: self.content.clone(),
            media_offset: self.media_offset,
            automation: self.automation.duplicate(),
            track: None,
            phase: EvalPhase::Idle,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.media_offset < 0 {
            return Err(TimelineError::InvalidState(format!(
                "clip '{}' has negative media offset {}",
                self.name, self.media_offset
            )));
        }
        self.automation.validate(Parameter::for_clip(self.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::AutomationValue;

    fn span(begin: i64, duration: i64) -> FrameSpan {
        FrameSpan::new(begin, duration).unwrap()
    }

    #[test]
    fn test_clip_parameter_sets() {
        let video = Clip::new("v", ClipKind::Video, span(0, 10));
        let audio = Clip::new("a", ClipKind::Audio, span(0, 10));
        assert!(video.automation().has_parameter(Parameter::Opacity));
        assert!(!video.automation().has_parameter(Parameter::Volume));
        assert!(audio.automation().has_parameter(Parameter::Volume));
        assert!(!video.is_attached());
    }

    #[test]
    fn test_rebase_keeps_content_aligned() {
        let mut clip = Clip::new("v", ClipKind::Video, span(10, 40));
        clip.automation_mut()
            .unwrap()
            .sequence_mut(Parameter::Opacity)
            .unwrap()
            .add_key_frame(30, AutomationValue::Double(0.5))
            .unwrap();

        // Timeline frame 40 maps to relative 30 before the trim
        let before = clip.source_frame(40);
        clip.set_span(span(30, 20));
        clip.rebase(20);

        let seq = clip.automation().sequence(Parameter::Opacity).unwrap();
        assert_eq!(seq.key_frames()[0].frame(), 10);
        assert_eq!(clip.relative_frame(40), 10);
        assert_eq!(clip.source_frame(40), before);
    }

    #[test]
    fn test_edits_refused_while_evaluating() {
        let mut clip = Clip::new("v", ClipKind::Video, span(0, 10));
        clip.set_phase(EvalPhase::Evaluating);
        assert_eq!(
            clip.automation_mut().err(),
            Some(TimelineError::EditDuringEvaluation(HolderRef::Clip(clip.id)))
        );
        clip.set_phase(EvalPhase::Idle);
        assert!(clip.set_content(ClipContent::Solid { color: [1.0; 4] }).is_ok());
    }

    #[test]
    fn test_duplicate_has_new_identity() {
        let mut clip = Clip::new("v", ClipKind::Video, span(0, 10));
        clip.set_track(Some(TrackId::new()));
        let copy = clip.duplicate();
        assert_ne!(copy.id, clip.id);
        assert!(!copy.is_attached());
        assert_eq!(copy.span(), clip.span());
    }
}
