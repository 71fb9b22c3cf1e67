// SPDX-License-Identifier: MIT OR Apache-2.0
//! The timeline: root of the model and of frame evaluation.

use crate::automation::{AutomationData, EvalPhase};
use crate::cancel::CancelFlag;
use crate::clip::{Clip, ClipId};
use crate::edit::{CutRequest, SplitOutcome};
use crate::engine::HolderRef;
use crate::error::{Result, TimelineError};
use crate::event::TimelineEvent;
use crate::parameter::TIMELINE_PARAMETERS;
use crate::span::FrameSpan;
use crate::track::{Track, TrackId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default frames per second for new timelines
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// An ordered collection of tracks plus project-level automation.
///
/// Track 0 is the topmost video layer. Every structural edit goes through
/// the timeline (or a track borrowed from it) and is refused while an
/// automation pass is running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    frame_rate: f64,
    tracks: Vec<Track>,
    automation: AutomationData,
    #[serde(skip)]
    phase: EvalPhase,
    #[serde(skip)]
    pending_events: Vec<TimelineEvent>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_RATE)
    }
}

impl Timeline {
    /// Create an empty timeline
    pub fn new(frame_rate: f64) -> Self {
        let frame_rate = if frame_rate.is_finite() && frame_rate > 0.0 {
            frame_rate
        } else {
            DEFAULT_FRAME_RATE
        };
        Self {
            frame_rate,
            tracks: Vec::new(),
            automation: AutomationData::new(TIMELINE_PARAMETERS),
            phase: EvalPhase::Idle,
            pending_events: Vec::new(),
        }
    }

    /// Frames per second
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Current evaluation phase
    pub fn phase(&self) -> EvalPhase {
        self.phase
    }

    /// Fail with `EditDuringEvaluation` while an automation pass runs
    pub fn ensure_idle(&self) -> Result<()> {
        if self.phase.is_evaluating() {
            tracing::error!("Timeline edited while automation is being evaluated");
            return Err(TimelineError::EditDuringEvaluation(HolderRef::Timeline));
        }
        Ok(())
    }

    /// Project-level automation
    pub fn automation(&self) -> &AutomationData {
        &self.automation
    }

    /// Mutable project-level automation
    pub fn automation_mut(&mut self) -> Result<&mut AutomationData> {
        self.ensure_idle()?;
        Ok(&mut self.automation)
    }

    // ---- Tracks ----

    /// Tracks, top layer first
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Get a track by ID
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Position of a track
    pub fn track_index(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Borrow a track for editing
    pub fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.ensure_idle()?;
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TimelineError::TrackNotFound(id))
    }

    /// Append a track below the existing ones
    pub fn add_track(&mut self, track: Track) -> Result<TrackId> {
        let index = self.tracks.len();
        self.insert_track(index, track)
    }

    /// Insert a track at `index` (clamped to the track count)
    pub fn insert_track(&mut self, index: usize, track: Track) -> Result<TrackId> {
        self.ensure_idle()?;
        if self.track(track.id).is_some() {
            return Err(TimelineError::InvalidState(format!(
                "track {:?} is already on the timeline",
                track.id
            )));
        }
        if let Some(clip) = track.clips().iter().find(|c| self.find_clip(c.id).is_some()) {
            return Err(TimelineError::ClipAlreadyAttached(clip.id));
        }
        let index = index.min(self.tracks.len());
        let id = track.id;
        tracing::debug!("Insert track '{}' at {}", track.name, index);
        self.tracks.insert(index, track);
        self.pending_events.push(TimelineEvent::TrackAdded { track: id, index });
        Ok(id)
    }

    /// Remove a track together with its clips
    pub fn remove_track(&mut self, id: TrackId) -> Result<Track> {
        self.ensure_idle()?;
        let index = self.track_index(id).ok_or(TimelineError::TrackNotFound(id))?;
        self.tracks[index].ensure_editable()?;
        let track = self.tracks.remove(index);
        tracing::debug!("Removed track '{}' with {} clips", track.name, track.len());
        self.pending_events.push(TimelineEvent::TrackRemoved(id));
        Ok(track)
    }

    /// Move a track to position `to` (clamped)
    pub fn move_track(&mut self, id: TrackId, to: usize) -> Result<()> {
        self.ensure_idle()?;
        let from = self.track_index(id).ok_or(TimelineError::TrackNotFound(id))?;
        let to = to.min(self.tracks.len() - 1);
        if from == to {
            return Ok(());
        }
        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);
        self.pending_events.push(TimelineEvent::TrackMoved { track: id, from, to });
        Ok(())
    }

    // ---- Clips ----

    /// Find a clip and its owning track
    pub fn find_clip(&self, id: ClipId) -> Option<(&Track, &Clip)> {
        self.tracks
            .iter()
            .find_map(|track| track.clip(id).map(|clip| (track, clip)))
    }

    /// Get a clip by ID
    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.find_clip(id).map(|(_, clip)| clip)
    }

    /// Borrow a clip for non-structural edits
    pub fn clip_mut(&mut self, id: ClipId) -> Result<&mut Clip> {
        self.ensure_idle()?;
        self.tracks
            .iter_mut()
            .find_map(|track| track.clip_mut(id))
            .ok_or(TimelineError::ClipNotFound(id))
    }

    /// Track owning a clip
    pub fn owner_of(&self, id: ClipId) -> Option<TrackId> {
        self.find_clip(id).map(|(track, _)| track.id)
    }

    /// Add a detached clip to a track.
    ///
    /// A clip ID may appear on at most one track, so a clone of a clip that
    /// is already placed is rejected.
    pub fn add_clip(&mut self, track: TrackId, clip: Clip) -> Result<ClipId> {
        if self.find_clip(clip.id).is_some() {
            return Err(TimelineError::ClipAlreadyAttached(clip.id));
        }
        let id = self.track_mut(track)?.add_clip(clip)?;
        self.pending_events.push(TimelineEvent::ClipAdded { track, clip: id });
        Ok(id)
    }

    /// Detach a clip from its track and return it
    pub fn remove_clip(&mut self, id: ClipId) -> Result<Clip> {
        let owner = self.owner_of(id).ok_or(TimelineError::ClipNotFound(id))?;
        let clip = self.track_mut(owner)?.remove_clip(id)?;
        self.pending_events.push(TimelineEvent::ClipRemoved { track: owner, clip: id });
        Ok(clip)
    }

    /// Transfer a clip to another track, keeping its span.
    ///
    /// The target is validated before the clip leaves its source, so a
    /// rejected move leaves both tracks unchanged.
    pub fn move_clip_to_track(&mut self, id: ClipId, target: TrackId) -> Result<()> {
        let span = self.clip(id).ok_or(TimelineError::ClipNotFound(id))?.span();
        self.move_clip(id, target, span.begin())
    }

    /// Drag a clip to `begin` on `target` (which may be its current track).
    ///
    /// Keyframes stay relative to the clip and are not rebased.
    pub fn move_clip(&mut self, id: ClipId, target: TrackId, begin: i64) -> Result<()> {
        self.ensure_idle()?;
        let (source, clip) = self.find_clip(id).ok_or(TimelineError::ClipNotFound(id))?;
        let source = source.id;
        let old = clip.span();
        let kind = clip.kind();
        clip.ensure_idle()?;
        let new = old.with_begin(begin)?;

        if source == target {
            return self.set_clip_span(id, new);
        }

        let source_index = self.track_index(source).ok_or(TimelineError::TrackNotFound(source))?;
        let target_index = self.track_index(target).ok_or(TimelineError::TrackNotFound(target))?;
        self.tracks[source_index].ensure_editable()?;
        let target_track = &self.tracks[target_index];
        target_track.ensure_editable()?;
        if let Err(err) = target_track.check_placement(id, kind, new, None) {
            tracing::warn!("Cannot move clip to track '{}': {}", target_track.name, err);
            return Err(err);
        }

        let mut clip = self.tracks[source_index].remove_clip(id)?;
        clip.set_span(new);
        self.tracks[target_index].insert_sorted(clip);
        tracing::debug!("Moved clip {:?} to track '{}' at {}", id, self.tracks[target_index].name, new);

        self.pending_events.push(TimelineEvent::ClipMoved {
            clip: id,
            from: source,
            to: target,
        });
        if old != new {
            self.pending_events.push(TimelineEvent::ClipSpanChanged {
                track: target,
                clip: id,
                old,
                new,
            });
        }
        Ok(())
    }

    /// Move or resize a clip on its track without rebasing its keyframes
    pub fn set_clip_span(&mut self, id: ClipId, span: FrameSpan) -> Result<()> {
        let owner = self.owner_of(id).ok_or(TimelineError::ClipNotFound(id))?;
        let track = self.track_mut(owner)?;
        let old = track.clip(id).map(Clip::span).ok_or(TimelineError::ClipNotFound(id))?;
        if let Err(err) = track.set_clip_span(id, span) {
            tracing::warn!("Cannot place clip at {}: {}", span, err);
            return Err(err);
        }
        if old != span {
            self.pending_events.push(TimelineEvent::ClipSpanChanged {
                track: owner,
                clip: id,
                old,
                new: span,
            });
        }
        Ok(())
    }

    /// Split a clip into `left` and `right` and report the change
    pub fn split_clip(&mut self, id: ClipId, left: FrameSpan, right: FrameSpan) -> Result<SplitOutcome> {
        let owner = self.owner_of(id).ok_or(TimelineError::ClipNotFound(id))?;
        let track = self.track_mut(owner)?;
        let old = track.clip(id).map(Clip::span).ok_or(TimelineError::ClipNotFound(id))?;
        let outcome = track.split_clip(id, left, right)?;
        self.record_outcome(owner, id, old, &outcome);
        Ok(outcome)
    }

    /// Slice every clip under `frame` in two, skipping locked tracks
    pub fn slice_at(&mut self, frame: i64, cancel: &CancelFlag) -> Result<Vec<SplitOutcome>> {
        if frame < 0 {
            return Err(TimelineError::NegativeFrame(frame));
        }
        let requests: Vec<CutRequest> = self
            .tracks
            .iter()
            .filter(|t| !t.locked)
            .flat_map(|t| t.clips_at(frame))
            .filter(|c| c.span().begin() < frame)
            .map(|c| CutRequest::slice(c.id, frame))
            .collect();
        self.apply_cuts(&requests, cancel)
    }

    /// Remove `range` from every clip it touches, skipping locked tracks
    pub fn remove_range(&mut self, range: FrameSpan, cancel: &CancelFlag) -> Result<Vec<SplitOutcome>> {
        let requests: Vec<CutRequest> = self
            .tracks
            .iter()
            .filter(|t| !t.locked)
            .flat_map(|t| t.clips().iter())
            .filter_map(|c| {
                let cut = c.span().intersection(&range)?;
                Some(CutRequest::remove(c.id, cut))
            })
            .collect();
        self.apply_cuts(&requests, cancel)
    }

    /// Apply a batch of cuts across tracks, all or nothing.
    ///
    /// Every request is validated on every track before any track is
    /// modified. A failure names the index of the offending request.
    pub fn apply_cuts(&mut self, requests: &[CutRequest], cancel: &CancelFlag) -> Result<Vec<SplitOutcome>> {
        self.ensure_idle()?;
        let total = requests.len();

        let mut per_track: IndexMap<TrackId, Vec<(usize, CutRequest)>> = IndexMap::new();
        let mut old_spans = Vec::with_capacity(total);
        for (index, request) in requests.iter().enumerate() {
            let Some((track, clip)) = self.find_clip(request.clip) else {
                return Err(TimelineError::BatchRejected {
                    index,
                    clip: request.clip,
                    reason: Box::new(TimelineError::ClipNotFound(request.clip)),
                });
            };
            old_spans.push((track.id, clip.id, clip.span()));
            per_track.entry(track.id).or_default().push((index, *request));
        }

        let mut plans = Vec::with_capacity(per_track.len());
        for (track_id, track_requests) in &per_track {
            let track = self.track(*track_id).ok_or(TimelineError::TrackNotFound(*track_id))?;
            match track.plan_cuts(track_requests, total, cancel) {
                Ok(plan) => plans.push(plan),
                Err(err) => {
                    tracing::warn!("Cut batch of {total} rejected: {err}");
                    return Err(err);
                }
            }
        }

        let mut outcomes = Vec::with_capacity(total);
        for plan in plans {
            let track_id = plan.track();
            let track = self.track_mut(track_id)?;
            outcomes.extend(track.apply_plan(plan)?);
        }

        // Outcomes come out grouped by track; restore request order
        let mut ordered = Vec::with_capacity(total);
        for (track, clip, old) in old_spans {
            let position = outcomes.iter().position(|o| match o {
                SplitOutcome::Removed(removed) => removed.id == clip,
                other => other.surviving_clip() == Some(clip),
            });
            if let Some(position) = position {
                let outcome = outcomes.swap_remove(position);
                self.record_outcome(track, clip, old, &outcome);
                ordered.push(outcome);
            }
        }
        tracing::debug!("Applied {} cuts", ordered.len());
        Ok(ordered)
    }

    /// End index of the last clip on any track
    pub fn largest_frame_in_use(&self) -> i64 {
        self.tracks.iter().map(Track::largest_frame_in_use).max().unwrap_or(0)
    }

    /// Drain queued structural change events
    pub fn take_events(&mut self) -> Vec<TimelineEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Whether events are waiting to be drained
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    /// Replace the whole model with `other`, for undo and reload.
    ///
    /// `other` is validated first; on failure nothing changes. Undrained
    /// events are kept and a `Reloaded` event is queued.
    pub fn replace_with(&mut self, mut other: Timeline) -> Result<()> {
        self.ensure_idle()?;
        other.validate()?;
        let mut events = std::mem::take(&mut self.pending_events);
        events.push(TimelineEvent::Reloaded);
        *self = other;
        self.pending_events = events;
        Ok(())
    }

    fn record_outcome(&mut self, track: TrackId, clip: ClipId, old: FrameSpan, outcome: &SplitOutcome) {
        match outcome {
            SplitOutcome::Removed(_) => {
                self.pending_events.push(TimelineEvent::ClipRemoved { track, clip });
            }
            SplitOutcome::Split { left, right } => {
                if let Some(new) = self.clip(*left).map(Clip::span) {
                    self.pending_events.push(TimelineEvent::ClipSpanChanged {
                        track,
                        clip: *left,
                        old,
                        new,
                    });
                }
                self.pending_events.push(TimelineEvent::ClipAdded { track, clip: *right });
            }
            SplitOutcome::TrimmedEnd(id) | SplitOutcome::TrimmedStart { clip: id, .. } => {
                if let Some(new) = self.clip(*id).map(Clip::span) {
                    if new != old {
                        self.pending_events.push(TimelineEvent::ClipSpanChanged {
                            track,
                            clip: *id,
                            old,
                            new,
                        });
                    }
                }
            }
        }
    }

    pub(crate) fn set_phase(&mut self, phase: EvalPhase) {
        self.phase = phase;
    }

    pub(crate) fn tracks_mut(&mut self) -> &mut [Track] {
        &mut self.tracks
    }

    pub(crate) fn automation_data_mut(&mut self) -> &mut AutomationData {
        &mut self.automation
    }

    pub(crate) fn push_event(&mut self, event: TimelineEvent) {
        self.pending_events.push(event);
    }

    /// Check the decoded state and restore back references
    pub(crate) fn validate(&mut self) -> Result<()> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(TimelineError::InvalidState(format!(
                "frame rate {} is not positive",
                self.frame_rate
            )));
        }
        self.automation.validate(TIMELINE_PARAMETERS)?;

        let mut seen_tracks = std::collections::HashSet::new();
        let mut seen_clips = std::collections::HashSet::new();
        for track in &mut self.tracks {
            if !seen_tracks.insert(track.id) {
                return Err(TimelineError::InvalidState(format!("duplicate track {:?}", track.id)));
            }
            track.validate()?;
            for clip in track.clips() {
                if !seen_clips.insert(clip.id) {
                    return Err(TimelineError::InvalidState(format!("duplicate clip {:?}", clip.id)));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipKind;

    fn span(begin: i64, duration: i64) -> FrameSpan {
        FrameSpan::new(begin, duration).unwrap()
    }

    fn setup() -> (Timeline, TrackId, TrackId) {
        let mut timeline = Timeline::default();
        let v1 = timeline.add_track(Track::new("V1", ClipKind::Video)).unwrap();
        let v2 = timeline.add_track(Track::new("V2", ClipKind::Video)).unwrap();
        timeline.take_events();
        (timeline, v1, v2)
    }

    #[test]
    fn test_track_management_events() {
        let mut timeline = Timeline::default();
        let a = timeline.add_track(Track::new("A", ClipKind::Video)).unwrap();
        let b = timeline.insert_track(0, Track::new("B", ClipKind::Audio)).unwrap();
        timeline.move_track(a, 0).unwrap();
        timeline.remove_track(b).unwrap();

        assert_eq!(
            timeline.take_events(),
            vec![
                TimelineEvent::TrackAdded { track: a, index: 0 },
                TimelineEvent::TrackAdded { track: b, index: 0 },
                TimelineEvent::TrackMoved { track: a, from: 1, to: 0 },
                TimelineEvent::TrackRemoved(b),
            ]
        );
        assert!(!timeline.has_pending_events());
    }

    #[test]
    fn test_move_clip_to_track_is_atomic() {
        let (mut timeline, v1, v2) = setup();
        let clip = timeline.add_clip(v1, Clip::new("a", ClipKind::Video, span(0, 20))).unwrap();
        let blocker = timeline.add_clip(v2, Clip::new("b", ClipKind::Video, span(10, 20))).unwrap();

        let err = timeline.move_clip_to_track(clip, v2).unwrap_err();
        assert!(matches!(err, TimelineError::Overlap { existing, .. } if existing == blocker));
        assert_eq!(timeline.owner_of(clip), Some(v1));
        assert_eq!(timeline.track(v2).unwrap().len(), 1);

        timeline.set_clip_span(blocker, span(30, 20)).unwrap();
        timeline.move_clip_to_track(clip, v2).unwrap();
        assert_eq!(timeline.owner_of(clip), Some(v2));
        assert!(timeline.track(v1).unwrap().is_empty());
        assert_eq!(timeline.clip(clip).unwrap().track(), Some(v2));
    }

    #[test]
    fn test_move_clip_does_not_rebase() {
        let (mut timeline, v1, v2) = setup();
        let clip = timeline.add_clip(v1, Clip::new("a", ClipKind::Video, span(0, 20))).unwrap();
        timeline.take_events();

        timeline.move_clip(clip, v2, 40).unwrap();
        let moved = timeline.clip(clip).unwrap();
        assert_eq!(moved.span(), span(40, 20));
        assert_eq!(moved.media_offset(), 0);
        assert_eq!(
            timeline.take_events(),
            vec![
                TimelineEvent::ClipMoved { clip, from: v1, to: v2 },
                TimelineEvent::ClipSpanChanged {
                    track: v2,
                    clip,
                    old: span(0, 20),
                    new: span(40, 20)
                },
            ]
        );
    }

    #[test]
    fn test_slice_at_playhead() {
        let (mut timeline, v1, v2) = setup();
        timeline.add_clip(v1, Clip::new("a", ClipKind::Video, span(0, 20))).unwrap();
        timeline.add_clip(v2, Clip::new("b", ClipKind::Video, span(5, 20))).unwrap();
        timeline.add_clip(v2, Clip::new("c", ClipKind::Video, span(30, 20))).unwrap();

        let outcomes = timeline.slice_at(10, &CancelFlag::new()).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(timeline.track(v1).unwrap().len(), 2);
        assert_eq!(timeline.track(v2).unwrap().len(), 3);
        assert_eq!(timeline.largest_frame_in_use(), 50);
    }

    #[test]
    fn test_remove_range_trims_and_removes() {
        let (mut timeline, v1, _) = setup();
        let a = timeline.add_clip(v1, Clip::new("a", ClipKind::Video, span(0, 20))).unwrap();
        let b = timeline.add_clip(v1, Clip::new("b", ClipKind::Video, span(20, 5))).unwrap();
        let c = timeline.add_clip(v1, Clip::new("c", ClipKind::Video, span(25, 20))).unwrap();

        timeline.remove_range(span(10, 20), &CancelFlag::new()).unwrap();
        assert_eq!(timeline.clip(a).unwrap().span(), span(0, 10));
        assert!(timeline.clip(b).is_none());
        assert_eq!(timeline.clip(c).unwrap().span(), span(30, 15));
        assert_eq!(timeline.clip(c).unwrap().media_offset(), 5);
    }

    #[test]
    fn test_locked_tracks_are_skipped_by_slice() {
        let (mut timeline, v1, _) = setup();
        timeline.add_clip(v1, Clip::new("a", ClipKind::Video, span(0, 20))).unwrap();
        timeline.track_mut(v1).unwrap().locked = true;
        assert!(timeline.slice_at(10, &CancelFlag::new()).unwrap().is_empty());
        assert_eq!(timeline.track(v1).unwrap().len(), 1);
    }

    #[test]
    fn test_replace_with_restores_links() {
        let (mut timeline, v1, _) = setup();
        let clip = timeline.add_clip(v1, Clip::new("a", ClipKind::Video, span(0, 20))).unwrap();
        let mut copy = timeline.clone();
        copy.tracks_mut()[0].clips_mut()[0].set_track(None);
        timeline.remove_clip(clip).unwrap();

        timeline.replace_with(copy).unwrap();
        assert_eq!(timeline.clip(clip).unwrap().track(), Some(v1));
        assert_eq!(timeline.take_events().last(), Some(&TimelineEvent::Reloaded));
    }

    #[test]
    fn test_cloned_clip_cannot_join_a_second_track() {
        let (mut timeline, v1, v2) = setup();
        let id = timeline.add_clip(v1, Clip::new("a", ClipKind::Video, span(0, 20))).unwrap();
        let detached = timeline.remove_clip(id).unwrap();
        timeline.add_clip(v1, detached.clone()).unwrap();

        assert_eq!(
            timeline.add_clip(v2, detached).unwrap_err(),
            TimelineError::ClipAlreadyAttached(id)
        );
        assert!(timeline.track(v2).unwrap().is_empty());
        assert_eq!(timeline.owner_of(id), Some(v1));

        let mut stray = Track::new("V3", ClipKind::Video);
        let mut copy = timeline.clip(id).unwrap().clone();
        copy.set_track(None);
        stray.add_clip(copy).unwrap();
        assert_eq!(
            timeline.add_track(stray).unwrap_err(),
            TimelineError::ClipAlreadyAttached(id)
        );

        let reopened = Timeline::read_state(&timeline.write_state().unwrap()).unwrap();
        assert_eq!(reopened.owner_of(id), Some(v1));
    }

    #[test]
    fn test_clip_edits_report_events() {
        let (mut timeline, v1, _) = setup();
        let id = timeline.add_clip(v1, Clip::new("a", ClipKind::Video, span(0, 20))).unwrap();
        timeline.remove_clip(id).unwrap();
        assert_eq!(
            timeline.take_events(),
            vec![
                TimelineEvent::ClipAdded { track: v1, clip: id },
                TimelineEvent::ClipRemoved { track: v1, clip: id },
            ]
        );
    }

    #[test]
    fn test_cancelled_batch_applies_nothing() {
        let (mut timeline, v1, _) = setup();
        let a = timeline.add_clip(v1, Clip::new("a", ClipKind::Video, span(0, 20))).unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = timeline.slice_at(10, &cancel).unwrap_err();
        assert!(matches!(err, TimelineError::Cancelled { completed: 0, total: 1 }));
        assert_eq!(timeline.clip(a).unwrap().span(), span(0, 20));
    }
}
