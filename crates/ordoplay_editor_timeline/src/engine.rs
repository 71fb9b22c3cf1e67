// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame evaluation: pushes interpolated automation values into the model.

use crate::automation::EvalPhase;
use crate::clip::ClipId;
use crate::error::{Result, TimelineError};
use crate::keyframe::AutomationValue;
use crate::parameter::Parameter;
use crate::timeline::Timeline;
use crate::track::TrackId;

/// Names one automation holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HolderRef {
    /// The timeline itself
    Timeline,
    /// A track
    Track(TrackId),
    /// A clip
    Clip(ClipId),
}

/// A live value that changed during an evaluation pass
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    /// Holder owning the parameter
    pub holder: HolderRef,
    /// Changed parameter
    pub parameter: Parameter,
    /// New live value
    pub value: AutomationValue,
    /// Timeline frame being evaluated
    pub frame: i64,
}

/// Receives value changes while a pass is running.
///
/// The changed holder is still flagged as evaluating when the observer runs,
/// so any structural edit it attempts fails with `EditDuringEvaluation`.
pub trait AutomationObserver {
    /// Called once per changed value, in evaluation order
    fn value_changed(&mut self, timeline: &mut Timeline, change: &ValueChange);
}

impl<F> AutomationObserver for F
where
    F: FnMut(&mut Timeline, &ValueChange),
{
    fn value_changed(&mut self, timeline: &mut Timeline, change: &ValueChange) {
        self(timeline, change)
    }
}

/// Counters for one evaluation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    /// Evaluated frame
    pub frame: i64,
    /// Timeline, tracks and clips visited
    pub holders_visited: usize,
    /// In-use sequences evaluated
    pub sequences_evaluated: usize,
    /// Live values that changed
    pub values_changed: usize,
    /// Clips not containing the frame
    pub clips_skipped: usize,
}

/// Drives automation evaluation over a timeline.
///
/// Evaluation order is fixed: timeline sequences, then every track's
/// sequences in track order, then the clips containing the frame in track
/// and clip order. Clip sequences are evaluated at the clip-relative frame.
#[derive(Debug, Default)]
pub struct AutomationEngine {
    last_frame: Option<i64>,
    passes: u64,
}

impl AutomationEngine {
    /// Create an engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame of the last completed pass
    pub fn last_frame(&self) -> Option<i64> {
        self.last_frame
    }

    /// Number of completed passes
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Evaluate every in-use sequence at `frame`
    pub fn update_at(&mut self, timeline: &mut Timeline, frame: i64) -> Result<EvaluationStats> {
        self.update_at_with(timeline, frame, &mut |_: &mut Timeline, _: &ValueChange| {})
    }

    /// Evaluate at `frame`, reporting each changed value to `observer`
    pub fn update_at_with(
        &mut self,
        timeline: &mut Timeline,
        frame: i64,
        observer: &mut dyn AutomationObserver,
    ) -> Result<EvaluationStats> {
        if timeline.phase().is_evaluating() {
            tracing::error!("Automation pass for frame {frame} started while another pass is running");
            return Err(TimelineError::EditDuringEvaluation(HolderRef::Timeline));
        }

        let mut stats = EvaluationStats {
            frame,
            ..Default::default()
        };
        let mut pass = Pass {
            frame,
            changes: Vec::new(),
            stats: &mut stats,
            observer,
        };

        timeline.set_phase(EvalPhase::Evaluating);

        let evaluated = timeline.automation_data_mut().update_at(frame, &mut pass.changes);
        pass.visited(evaluated);
        pass.notify(timeline, HolderRef::Timeline);

        let track_count = timeline.tracks().len();
        for ti in 0..track_count {
            let track = &mut timeline.tracks_mut()[ti];
            let holder = HolderRef::Track(track.id);
            track.set_phase(EvalPhase::Evaluating);
            let evaluated = track.automation_data_mut().update_at(frame, &mut pass.changes);
            pass.visited(evaluated);
            pass.notify(timeline, holder);
            timeline.tracks_mut()[ti].set_phase(EvalPhase::Idle);
        }

        for ti in 0..track_count {
            let track = &timeline.tracks()[ti];
            let (lo, hi) = track.range_at(frame);
            let mut visited = 0;
            for ci in lo..hi {
                let clip = &mut timeline.tracks_mut()[ti].clips_mut()[ci];
                if !clip.span().contains(frame) {
                    continue;
                }
                visited += 1;
                let holder = HolderRef::Clip(clip.id);
                let relative = clip.relative_frame(frame);
                clip.set_phase(EvalPhase::Evaluating);
                let evaluated = clip.automation_data_mut().update_at(relative, &mut pass.changes);
                pass.visited(evaluated);
                pass.notify(timeline, holder);
                timeline.tracks_mut()[ti].clips_mut()[ci].set_phase(EvalPhase::Idle);
            }
            pass.stats.clips_skipped += timeline.tracks()[ti].len() - visited;
        }

        timeline.set_phase(EvalPhase::Idle);
        self.last_frame = Some(frame);
        self.passes += 1;

        tracing::trace!(
            "Evaluated frame {}: {} sequences, {} changes, {} clips skipped",
            frame,
            stats.sequences_evaluated,
            stats.values_changed,
            stats.clips_skipped
        );
        Ok(stats)
    }
}

/// State of one running pass
struct Pass<'a> {
    frame: i64,
    changes: Vec<(Parameter, AutomationValue)>,
    stats: &'a mut EvaluationStats,
    observer: &'a mut dyn AutomationObserver,
}

impl Pass<'_> {
    fn visited(&mut self, sequences: usize) {
        self.stats.holders_visited += 1;
        self.stats.sequences_evaluated += sequences;
    }

    fn notify(&mut self, timeline: &mut Timeline, holder: HolderRef) {
        self.stats.values_changed += self.changes.len();
        for (parameter, value) in self.changes.drain(..) {
            let change = ValueChange {
                holder,
                parameter,
                value,
                frame: self.frame,
            };
            self.observer.value_changed(timeline, &change);
        }
    }
}
