// SPDX-License-Identifier: MIT OR Apache-2.0
//! Automation sequences: the keyframes driving one parameter.

use crate::error::{Result, TimelineError};
use crate::keyframe::{AutomationValue, InterpolationMode, KeyFrame, KeyFrameId, ValueKind};
use crate::parameter::Parameter;
use crate::span::FrameSpan;
use serde::{Deserialize, Serialize};

/// Ordered keyframes plus an override value for one parameter.
///
/// Keyframes are kept strictly increasing by frame; a second keyframe at an
/// occupied frame replaces the first one's value. The sequence also holds the
/// parameter's live value, written by [`AutomationSequence::do_update_value`]
/// and read by everything downstream of automation evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationSequence {
    parameter: Parameter,
    keyframes: Vec<KeyFrame>,
    override_value: AutomationValue,
    override_enabled: bool,
    mode: InterpolationMode,
    #[serde(skip)]
    live: Option<AutomationValue>,
}

impl AutomationSequence {
    /// Create an empty sequence holding the parameter's default value
    pub fn new(parameter: Parameter) -> Self {
        Self {
            parameter,
            keyframes: Vec::new(),
            override_value: parameter.default_value(),
            override_enabled: false,
            mode: InterpolationMode::Linear,
            live: None,
        }
    }

    /// Parameter driven by this sequence
    pub fn parameter(&self) -> Parameter {
        self.parameter
    }

    /// Kind of value stored by this sequence
    pub fn kind(&self) -> ValueKind {
        self.parameter.kind()
    }

    /// Interpolation used between keyframes
    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    /// Set the interpolation used between keyframes
    pub fn set_mode(&mut self, mode: InterpolationMode) {
        self.mode = mode;
    }

    /// All keyframes in frame order
    pub fn key_frames(&self) -> &[KeyFrame] {
        &self.keyframes
    }

    /// Whether the sequence has any keyframes
    pub fn has_key_frames(&self) -> bool {
        !self.keyframes.is_empty()
    }

    /// Get keyframe by ID
    pub fn key_frame(&self, id: KeyFrameId) -> Option<&KeyFrame> {
        self.keyframes.iter().find(|k| k.id == id)
    }

    /// Get the keyframe stored exactly at `frame`
    pub fn key_frame_at(&self, frame: i64) -> Option<&KeyFrame> {
        self.search(frame).ok().map(|idx| &self.keyframes[idx])
    }

    /// Keyframes whose frame lies inside `span`
    pub fn key_frames_in_range(&self, span: FrameSpan) -> &[KeyFrame] {
        let start = self.keyframes.partition_point(|k| k.frame() < span.begin());
        let end = self.keyframes.partition_point(|k| k.frame() < span.end_index());
        &self.keyframes[start..end]
    }

    /// Value used when no keyframes exist or the override is enabled
    pub fn override_value(&self) -> &AutomationValue {
        &self.override_value
    }

    /// Whether the override value is forced over the keyframes
    pub fn is_override_enabled(&self) -> bool {
        self.override_enabled
    }

    /// True when the engine has to evaluate this sequence
    pub fn is_automation_in_use(&self) -> bool {
        self.has_key_frames() || self.override_enabled
    }

    /// Value most recently pushed by the automation engine, or the override
    /// value while nothing drives the parameter
    pub fn live_value(&self) -> &AutomationValue {
        self.live.as_ref().unwrap_or(&self.override_value)
    }

    /// Set the override value
    pub fn set_override_value(&mut self, value: AutomationValue) -> Result<()> {
        self.check_kind(&value)?;
        self.override_value = value;
        if !self.has_key_frames() || self.override_enabled {
            self.live = Some(self.override_value.clone());
        }
        Ok(())
    }

    /// Force the override value over the keyframes (or release it)
    pub fn set_override_enabled(&mut self, enabled: bool) {
        self.override_enabled = enabled;
        if enabled {
            self.live = Some(self.override_value.clone());
        }
    }

    /// Insert a keyframe, or replace the value of the one already at `frame`.
    ///
    /// Returns the ID of the stored keyframe.
    pub fn add_key_frame(&mut self, frame: i64, value: AutomationValue) -> Result<KeyFrameId> {
        if frame < 0 {
            return Err(TimelineError::NegativeFrame(frame));
        }
        self.check_kind(&value)?;

        match self.search(frame) {
            Ok(idx) => {
                let kf = &mut self.keyframes[idx];
                kf.set_value(value);
                Ok(kf.id)
            }
            Err(idx) => {
                let kf = KeyFrame::new(frame, value);
                let id = kf.id;
                self.keyframes.insert(idx, kf);
                Ok(id)
            }
        }
    }

    /// Remove a keyframe by identity. Returns `false` when it was not present.
    pub fn remove_key_frame(&mut self, id: KeyFrameId) -> bool {
        let Some(idx) = self.keyframes.iter().position(|k| k.id == id) else {
            tracing::debug!("{:?}: keyframe {:?} not present, nothing removed", self.parameter, id);
            return false;
        };
        self.keyframes.remove(idx);
        if self.keyframes.is_empty() {
            self.live = Some(self.override_value.clone());
        }
        true
    }

    /// Move a keyframe to another frame. The target frame must be free.
    pub fn move_key_frame(&mut self, id: KeyFrameId, frame: i64) -> Result<()> {
        if frame < 0 {
            return Err(TimelineError::NegativeFrame(frame));
        }
        let Some(idx) = self.keyframes.iter().position(|k| k.id == id) else {
            return Err(TimelineError::KeyFrameNotFound(id));
        };
        if self.keyframes[idx].frame() == frame {
            return Ok(());
        }
        if self.search(frame).is_ok() {
            return Err(TimelineError::DuplicateKeyFrame(frame));
        }

        let mut kf = self.keyframes.remove(idx);
        kf.set_frame(frame);
        let insert_at = self.keyframes.partition_point(|k| k.frame() < frame);
        self.keyframes.insert(insert_at, kf);
        Ok(())
    }

    /// Remove all keyframes
    pub fn clear(&mut self) {
        self.keyframes.clear();
        self.live = Some(self.override_value.clone());
    }

    /// Compute the parameter value at `frame`.
    ///
    /// Frames before the first keyframe take the first value, frames after the
    /// last take the last value. A frame exactly on a keyframe yields that
    /// keyframe's value without interpolation.
    pub fn value_at(&self, frame: i64) -> AutomationValue {
        if self.override_enabled {
            return self.override_value.clone();
        }
        let (Some(first), Some(last)) = (self.keyframes.first(), self.keyframes.last()) else {
            return self.override_value.clone();
        };
        if frame <= first.frame() {
            return first.value().clone();
        }
        if frame >= last.frame() {
            return last.value().clone();
        }

        // first.frame < frame < last.frame, so 1 <= next < len
        let next = self.keyframes.partition_point(|k| k.frame() <= frame);
        let a = &self.keyframes[next - 1];
        let b = &self.keyframes[next];
        if a.frame() == frame {
            return a.value().clone();
        }
        let t = (frame - a.frame()) as f64 / (b.frame() - a.frame()) as f64;
        a.value()
            .interpolate(b.value(), t, self.mode)
            .unwrap_or_else(|| a.value().clone())
    }

    /// Evaluate at `frame` and push the result into the live value.
    ///
    /// Returns the new value when it differs from the previous live value.
    pub fn do_update_value(&mut self, frame: i64) -> Option<AutomationValue> {
        let value = self.value_at(frame);
        if self.live.as_ref() == Some(&value) {
            return None;
        }
        self.live = Some(value.clone());
        Some(value)
    }

    /// Shift every keyframe by `delta` frames.
    ///
    /// Used when the holder's origin moves; keyframes may end up before
    /// frame 0, where they still anchor interpolation.
    pub(crate) fn shift_key_frames(&mut self, delta: i64) {
        for kf in &mut self.keyframes {
            kf.set_frame(kf.frame() + delta);
        }
    }

    /// Give every keyframe a fresh identity (used when duplicating a holder)
    pub(crate) fn regenerate_ids(&mut self) {
        for kf in &mut self.keyframes {
            kf.id = KeyFrameId::new();
        }
    }

    /// Check the decoded state against the sequence invariants
    pub(crate) fn validate(&self) -> Result<()> {
        self.check_kind(&self.override_value)?;
        for pair in self.keyframes.windows(2) {
            if pair[0].frame() >= pair[1].frame() {
                return Err(TimelineError::InvalidState(format!(
                    "{:?}: keyframes at {} and {} are out of order",
                    self.parameter,
                    pair[0].frame(),
                    pair[1].frame()
                )));
            }
        }
        for kf in &self.keyframes {
            self.check_kind(kf.value())?;
        }
        Ok(())
    }

    fn search(&self, frame: i64) -> std::result::Result<usize, usize> {
        self.keyframes.binary_search_by(|k| k.frame().cmp(&frame))
    }

    fn check_kind(&self, value: &AutomationValue) -> Result<()> {
        let expected = self.kind();
        let found = value.kind();
        if expected != found {
            return Err(TimelineError::TypeMismatch {
                parameter: self.parameter,
                expected,
                found,
            });
        }
        Ok(())
    }
}
