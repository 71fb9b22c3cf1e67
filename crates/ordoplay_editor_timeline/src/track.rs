// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tracks: ordered, non-overlapping clips of one kind.

use crate::automation::{AutomationData, EvalPhase};
use crate::clip::{Clip, ClipId, ClipKind};
use crate::engine::HolderRef;
use crate::error::{Result, TimelineError};
use crate::parameter::Parameter;
use crate::span::FrameSpan;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

/// A track on the timeline.
///
/// Clips are kept sorted by begin frame and their spans never overlap.
/// The track owns its clips; each clip carries the track's ID as a
/// non-owning back reference. Adding, removing, resizing and splitting
/// clips goes through [`Timeline`](crate::Timeline), which reports each
/// change as a [`TimelineEvent`](crate::TimelineEvent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
    kind: ClipKind,
    clips: Vec<Clip>,
    automation: AutomationData,
    /// Whether the track is skipped by render and produce
    pub muted: bool,
    /// Whether the track rejects structural edits
    pub locked: bool,
    #[serde(skip)]
    phase: EvalPhase,
}

impl Track {
    /// Create an empty track accepting `kind` clips
    pub fn new(name: impl Into<String>, kind: ClipKind) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            kind,
            clips: Vec::new(),
            automation: AutomationData::new(Parameter::for_track(kind)),
            muted: false,
            locked: false,
            phase: EvalPhase::Idle,
        }
    }

    /// Kind of clip this track accepts
    pub fn kind(&self) -> ClipKind {
        self.kind
    }

    /// Clips in begin order
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Number of clips
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether the track has no clips
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Get a clip by ID
    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    /// Get a clip by ID for non-structural edits (name, content, automation)
    pub fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == id)
    }

    /// Position of a clip in begin order
    pub fn clip_index(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id == id)
    }

    /// Whether this track owns the clip
    pub fn contains_clip(&self, id: ClipId) -> bool {
        self.clip_index(id).is_some()
    }

    /// Automation owned by this track
    pub fn automation(&self) -> &AutomationData {
        &self.automation
    }

    /// Mutable automation, refused while the track is being evaluated
    pub fn automation_mut(&mut self) -> Result<&mut AutomationData> {
        self.ensure_idle()?;
        Ok(&mut self.automation)
    }

    /// Current evaluation phase
    pub fn phase(&self) -> EvalPhase {
        self.phase
    }

    /// Fail with `EditDuringEvaluation` while the engine is pushing values
    pub fn ensure_idle(&self) -> Result<()> {
        if self.phase.is_evaluating() {
            tracing::error!("Track '{}' edited while its automation is being evaluated", self.name);
            return Err(TimelineError::EditDuringEvaluation(HolderRef::Track(self.id)));
        }
        Ok(())
    }

    /// Idle and unlocked: the precondition of every structural edit
    pub fn ensure_editable(&self) -> Result<()> {
        self.ensure_idle()?;
        if self.locked {
            tracing::warn!("Track '{}' is locked", self.name);
            return Err(TimelineError::TrackLocked(self.id));
        }
        Ok(())
    }

    /// Check that a clip of `kind` could occupy `span` on this track.
    ///
    /// `ignore` names a clip already on the track that is being moved and
    /// must not collide with itself.
    pub fn check_placement(&self, clip: ClipId, kind: ClipKind, span: FrameSpan, ignore: Option<ClipId>) -> Result<()> {
        if kind != self.kind {
            return Err(TimelineError::ClipKindMismatch {
                expected: self.kind,
                found: kind,
            });
        }
        let conflict = self
            .clips
            .iter()
            .filter(|c| Some(c.id) != ignore)
            .find(|c| c.span().intersects(&span));
        if let Some(existing) = conflict {
            return Err(TimelineError::Overlap {
                clip,
                span,
                existing: existing.id,
                existing_span: existing.span(),
            });
        }
        Ok(())
    }

    /// Add a detached clip.
    ///
    /// Fails when the clip's span intersects a sibling, leaving the track
    /// unchanged.
    pub(crate) fn add_clip(&mut self, clip: Clip) -> Result<ClipId> {
        self.ensure_editable()?;
        if clip.is_attached() || self.contains_clip(clip.id) {
            return Err(TimelineError::ClipAlreadyAttached(clip.id));
        }
        if let Err(err) = self.check_placement(clip.id, clip.kind(), clip.span(), None) {
            tracing::warn!("Track '{}': {}", self.name, err);
            return Err(err);
        }

        let id = clip.id;
        tracing::debug!("Track '{}': add clip '{}' at {}", self.name, clip.name, clip.span());
        self.insert_sorted(clip);
        Ok(id)
    }

    /// Detach and return a clip
    pub(crate) fn remove_clip(&mut self, id: ClipId) -> Result<Clip> {
        self.ensure_editable()?;
        let idx = self.clip_index(id).ok_or(TimelineError::ClipNotFound(id))?;
        self.clips[idx].ensure_idle()?;

        let mut clip = self.clips.remove(idx);
        clip.set_track(None);
        tracing::debug!("Track '{}': removed clip '{}'", self.name, clip.name);
        Ok(clip)
    }

    /// Move or resize a clip without touching its automation
    pub(crate) fn set_clip_span(&mut self, id: ClipId, span: FrameSpan) -> Result<()> {
        self.ensure_editable()?;
        let idx = self.clip_index(id).ok_or(TimelineError::ClipNotFound(id))?;
        self.clips[idx].ensure_idle()?;
        self.check_placement(id, self.kind, span, Some(id))?;

        let mut clip = self.clips.remove(idx);
        clip.set_span(span);
        self.insert_sorted(clip);
        Ok(())
    }

    /// Collect the clips containing `frame`, in track order.
    ///
    /// Returns the number of clips appended to `dest`.
    pub fn extract_clips_at<'a>(&'a self, dest: &mut Vec<&'a Clip>, frame: i64) -> usize {
        let (lo, hi) = self.range_at(frame);
        let before = dest.len();
        dest.extend(self.clips[lo..hi].iter().filter(|c| c.span().contains(frame)));
        dest.len() - before
    }

    /// Clips containing `frame`
    pub fn clips_at(&self, frame: i64) -> impl Iterator<Item = &Clip> {
        let (lo, hi) = self.range_at(frame);
        self.clips[lo..hi].iter().filter(move |c| c.span().contains(frame))
    }

    /// End index of the last clip, or 0 for an empty track
    pub fn largest_frame_in_use(&self) -> i64 {
        self.clips.iter().map(|c| c.span().end_index()).max().unwrap_or(0)
    }

    /// Index window of clips that may contain `frame`.
    ///
    /// Clips are sorted by begin and non-empty clips are disjoint, so only the
    /// nearest non-empty clip starting at or before `frame` can contain it.
    pub(crate) fn range_at(&self, frame: i64) -> (usize, usize) {
        let hi = self.clips.partition_point(|c| c.span().begin() <= frame);
        let mut lo = hi;
        while lo > 0 {
            let span = self.clips[lo - 1].span();
            if span.is_empty() {
                lo -= 1;
                continue;
            }
            if span.contains(frame) {
                lo -= 1;
            }
            break;
        }
        (lo, hi)
    }

    pub(crate) fn insert_sorted(&mut self, mut clip: Clip) {
        clip.set_track(Some(self.id));
        let begin = clip.span().begin();
        let idx = self.clips.partition_point(|c| c.span().begin() <= begin);
        self.clips.insert(idx, clip);
    }

    pub(crate) fn clips_mut(&mut self) -> &mut Vec<Clip> {
        &mut self.clips
    }

    pub(crate) fn set_phase(&mut self, phase: EvalPhase) {
        self.phase = phase;
    }

    pub(crate) fn automation_data_mut(&mut self) -> &mut AutomationData {
        &mut self.automation
    }

    /// Check the decoded state and restore clip back references
    pub(crate) fn validate(&mut self) -> Result<()> {
        self.automation.validate(Parameter::for_track(self.kind))?;

        let mut covered_until = 0;
        let mut previous_begin = 0;
        for clip in &self.clips {
            if clip.kind() != self.kind {
                return Err(TimelineError::InvalidState(format!(
                    "track '{}' holds a {} clip",
                    self.name,
                    clip.kind().name()
                )));
            }
            let span = clip.span();
            if span.begin() < previous_begin {
                return Err(TimelineError::InvalidState(format!(
                    "track '{}' clips are not sorted",
                    self.name
                )));
            }
            previous_begin = span.begin();
            if !span.is_empty() {
                if span.begin() < covered_until {
                    return Err(TimelineError::InvalidState(format!(
                        "track '{}': clip '{}' at {} overlaps a sibling",
                        self.name, clip.name, span
                    )));
                }
                covered_until = span.end_index();
            }
            clip.validate()?;
        }

        let id = self.id;
        for clip in &mut self.clips {
            clip.set_track(Some(id));
        }
        Ok(())
    }
}
