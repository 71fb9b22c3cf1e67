// SPDX-License-Identifier: MIT OR Apache-2.0
//! Split, trim and range-removal edits.
//!
//! A single split turns one clip into up to two spans. Batches of cuts are
//! planned completely before anything is applied, so a batch either lands
//! in full or leaves the track untouched.

use crate::cancel::CancelFlag;
use crate::clip::{Clip, ClipId};
use crate::error::{Result, TimelineError};
use crate::span::FrameSpan;
use crate::track::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What a split did to a clip
#[derive(Debug, Clone)]
pub enum SplitOutcome {
    /// The clip was resized to the left span and a new clip holds the right span
    Split {
        /// Original clip, now covering the left span
        left: ClipId,
        /// New clip covering the right span
        right: ClipId,
    },
    /// Only the left span survived
    TrimmedEnd(ClipId),
    /// Only the right span survived; keyframes moved back by `shift`
    TrimmedStart {
        /// Trimmed clip
        clip: ClipId,
        /// Frames removed from the start
        shift: i64,
    },
    /// Neither span survived and the clip was detached
    Removed(Clip),
}

impl SplitOutcome {
    /// Clip that kept the original identity, if any
    pub fn surviving_clip(&self) -> Option<ClipId> {
        match self {
            Self::Split { left, .. } => Some(*left),
            Self::TrimmedEnd(id) => Some(*id),
            Self::TrimmedStart { clip, .. } => Some(*clip),
            Self::Removed(_) => None,
        }
    }
}

/// Remove frames `[cut_begin, cut_end)` from one clip.
///
/// The part before `cut_begin` becomes the left span and the part from
/// `cut_end` on becomes the right span. A slice is a cut with an empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutRequest {
    /// Clip to cut
    pub clip: ClipId,
    /// First removed frame
    pub cut_begin: i64,
    /// First kept frame after the removed range
    pub cut_end: i64,
}

impl CutRequest {
    /// Slice a clip in two at `frame`
    pub fn slice(clip: ClipId, frame: i64) -> Self {
        Self {
            clip,
            cut_begin: frame,
            cut_end: frame,
        }
    }

    /// Remove `range` from a clip
    pub fn remove(clip: ClipId, range: FrameSpan) -> Self {
        Self {
            clip,
            cut_begin: range.begin(),
            cut_end: range.end_index(),
        }
    }

    /// Left and right spans this cut leaves of `clip`
    pub fn spans_for(&self, clip: &Clip) -> Result<(FrameSpan, FrameSpan)> {
        if self.cut_end < self.cut_begin {
            return Err(TimelineError::InvalidSplit {
                clip: clip.id,
                reason: format!("cut range {}..{} is reversed", self.cut_begin, self.cut_end),
            });
        }
        let span = clip.span();
        let left_duration = self.cut_begin - span.begin();
        let right_duration = span.end_index() - self.cut_end;
        for duration in [left_duration, right_duration] {
            if duration < 0 {
                return Err(TimelineError::NegativeDuration { clip: clip.id, duration });
            }
        }
        Ok((
            span.with_duration(left_duration)?,
            FrameSpan::new(self.cut_end, right_duration)?,
        ))
    }
}

/// Validated action for one clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitAction {
    Split { left: FrameSpan, right: FrameSpan },
    TrimEnd(FrameSpan),
    TrimStart(FrameSpan),
    Remove,
}

impl SplitAction {
    /// Spans left on the track after the action
    fn surviving_spans(&self) -> impl Iterator<Item = FrameSpan> {
        let (a, b) = match *self {
            Self::Split { left, right } => (Some(left), Some(right)),
            Self::TrimEnd(span) | Self::TrimStart(span) => (Some(span), None),
            Self::Remove => (None, None),
        };
        a.into_iter().chain(b)
    }
}

/// Decide what splitting `clip` into `left` and `right` means.
///
/// A non-empty left span must start where the clip starts and a non-empty
/// right span must end where the clip ends. Both stay inside the clip and
/// may not overlap each other.
fn plan_split(clip: &Clip, left: FrameSpan, right: FrameSpan) -> Result<SplitAction> {
    let span = clip.span();
    let invalid = |reason: String| TimelineError::InvalidSplit { clip: clip.id, reason };

    if !left.is_empty() && (left.begin() != span.begin() || left.end_index() > span.end_index()) {
        return Err(invalid(format!("left span {left} does not start clip {span}")));
    }
    if !right.is_empty() && (right.end_index() != span.end_index() || right.begin() < span.begin()) {
        return Err(invalid(format!("right span {right} does not end clip {span}")));
    }

    Ok(match (left.is_empty(), right.is_empty()) {
        (false, false) => {
            if left.end_index() > right.begin() {
                return Err(invalid(format!("left span {left} overlaps right span {right}")));
            }
            SplitAction::Split { left, right }
        }
        (false, true) => SplitAction::TrimEnd(left),
        (true, false) => SplitAction::TrimStart(right),
        (true, true) => SplitAction::Remove,
    })
}

/// A validated batch of cuts on one track
#[derive(Debug, Clone)]
pub(crate) struct CutPlan {
    track: TrackId,
    steps: Vec<(ClipId, SplitAction)>,
}

impl CutPlan {
    pub(crate) fn track(&self) -> TrackId {
        self.track
    }
}

impl Track {
    /// Split a clip into `left` and `right`.
    ///
    /// Both non-empty: the clip is resized to `left` and a copy holding
    /// `right` is added, its keyframes rebased to the new begin. Only `left`:
    /// right trim. Only `right`: left trim with keyframes rebased by the
    /// removed frames. Neither: the clip is removed.
    pub(crate) fn split_clip(&mut self, id: ClipId, left: FrameSpan, right: FrameSpan) -> Result<SplitOutcome> {
        self.ensure_editable()?;
        let clip = self.clip(id).ok_or(TimelineError::ClipNotFound(id))?;
        clip.ensure_idle()?;
        let action = plan_split(clip, left, right).inspect_err(|err| {
            tracing::warn!("Track '{}': {}", self.name, err);
        })?;
        self.apply_action(id, action)
    }

    /// Validate a batch of cuts without applying it.
    ///
    /// Each request is paired with its index in the caller's batch so a
    /// failure can name the sub-operation. Cancellation is checked before
    /// each request; a cancelled plan applies nothing.
    pub(crate) fn plan_cuts(&self, requests: &[(usize, CutRequest)], total: usize, cancel: &CancelFlag) -> Result<CutPlan> {
        self.ensure_editable()?;

        let mut seen = HashSet::with_capacity(requests.len());
        let mut steps = Vec::with_capacity(requests.len());
        for (index, request) in requests {
            if cancel.is_cancelled() {
                tracing::debug!("Track '{}': cut planning cancelled at request {index}", self.name);
                return Err(TimelineError::Cancelled { completed: *index, total });
            }
            let reject = |reason: TimelineError| TimelineError::BatchRejected {
                index: *index,
                clip: request.clip,
                reason: Box::new(reason),
            };

            if !seen.insert(request.clip) {
                return Err(reject(TimelineError::InvalidSplit {
                    clip: request.clip,
                    reason: "clip appears twice in the batch".to_string(),
                }));
            }
            let clip = self
                .clip(request.clip)
                .ok_or_else(|| reject(TimelineError::ClipNotFound(request.clip)))?;
            clip.ensure_idle().map_err(reject)?;
            let (left, right) = request.spans_for(clip).map_err(reject)?;
            let action = plan_split(clip, left, right).map_err(reject)?;
            steps.push((*index, request.clip, action));
        }

        self.check_planned_spans(&steps)?;

        Ok(CutPlan {
            track: self.id,
            steps: steps.into_iter().map(|(_, clip, action)| (clip, action)).collect(),
        })
    }

    /// Apply a plan made by `plan_cuts` with no edit in between
    pub(crate) fn apply_plan(&mut self, plan: CutPlan) -> Result<Vec<SplitOutcome>> {
        if plan.track != self.id {
            return Err(TimelineError::TrackNotFound(plan.track));
        }
        let outcomes = plan
            .steps
            .into_iter()
            .map(|(clip, action)| self.apply_action(clip, action))
            .collect::<Result<Vec<SplitOutcome>>>()?;
        tracing::debug!("Track '{}': applied {} cuts", self.name, outcomes.len());
        Ok(outcomes)
    }

    /// The planned spans plus every untouched clip must stay disjoint
    fn check_planned_spans(&self, steps: &[(usize, ClipId, SplitAction)]) -> Result<()> {
        let touched: HashSet<ClipId> = steps.iter().map(|(_, clip, _)| *clip).collect();
        let mut spans: Vec<(FrameSpan, Option<usize>, ClipId)> = self
            .clips()
            .iter()
            .filter(|c| !touched.contains(&c.id))
            .map(|c| (c.span(), None, c.id))
            .collect();
        for (index, clip, action) in steps {
            spans.extend(action.surviving_spans().map(|s| (s, Some(*index), *clip)));
        }
        spans.retain(|(span, _, _)| !span.is_empty());
        spans.sort_by_key(|(span, _, _)| span.begin());

        for pair in spans.windows(2) {
            let (prev, _, prev_clip) = pair[0];
            let (next, index, clip) = pair[1];
            if prev.intersects(&next) {
                let reason = TimelineError::Overlap {
                    clip,
                    span: next,
                    existing: prev_clip,
                    existing_span: prev,
                };
                return Err(TimelineError::BatchRejected {
                    index: index.or(pair[0].1).unwrap_or(0),
                    clip,
                    reason: Box::new(reason),
                });
            }
        }
        Ok(())
    }

    /// Apply a validated action
    fn apply_action(&mut self, id: ClipId, action: SplitAction) -> Result<SplitOutcome> {
        let idx = self.clip_index(id).ok_or(TimelineError::ClipNotFound(id))?;
        let mut clip = self.clips_mut().remove(idx);
        let old_begin = clip.span().begin();

        match action {
            SplitAction::Split { left, right } => {
                let mut tail = clip.duplicate();
                tail.set_span(right);
                tail.rebase(right.begin() - old_begin);
                clip.set_span(left);
                let right_id = tail.id;
                tracing::debug!("Track '{}': split '{}' into {} and {}", self.name, clip.name, left, right);
                self.insert_sorted(clip);
                self.insert_sorted(tail);
                Ok(SplitOutcome::Split { left: id, right: right_id })
            }
            SplitAction::TrimEnd(left) => {
                clip.set_span(left);
                self.insert_sorted(clip);
                Ok(SplitOutcome::TrimmedEnd(id))
            }
            SplitAction::TrimStart(right) => {
                let shift = right.begin() - old_begin;
                clip.set_span(right);
                clip.rebase(shift);
                self.insert_sorted(clip);
                Ok(SplitOutcome::TrimmedStart { clip: id, shift })
            }
            SplitAction::Remove => {
                clip.set_track(None);
                tracing::debug!("Track '{}': cut removed clip '{}'", self.name, clip.name);
                Ok(SplitOutcome::Removed(clip))
            }
        }
    }
}
