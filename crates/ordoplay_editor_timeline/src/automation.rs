// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-holder automation data.

use crate::error::{Result, TimelineError};
use crate::keyframe::AutomationValue;
use crate::parameter::Parameter;
use crate::sequence::AutomationSequence;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Evaluation state of a holder.
///
/// Mutating APIs refuse to run while their holder is `Evaluating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalPhase {
    /// Free to edit
    #[default]
    Idle,
    /// The automation engine is pushing values into this holder
    Evaluating,
}

impl EvalPhase {
    /// Whether the holder is mid-evaluation
    pub fn is_evaluating(self) -> bool {
        self == Self::Evaluating
    }
}

/// The fixed set of automation sequences owned by one timeline, track or clip.
///
/// The parameter set is decided at construction and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationData {
    sequences: IndexMap<Parameter, AutomationSequence>,
}

impl AutomationData {
    /// Create one sequence per parameter
    pub fn new(parameters: &[Parameter]) -> Self {
        let sequences = parameters
            .iter()
            .map(|p| (*p, AutomationSequence::new(*p)))
            .collect();
        Self { sequences }
    }

    /// Get the sequence for a parameter
    pub fn sequence(&self, parameter: Parameter) -> Option<&AutomationSequence> {
        self.sequences.get(&parameter)
    }

    /// Get the sequence for a parameter, failing when the holder lacks it
    pub fn sequence_mut(&mut self, parameter: Parameter) -> Result<&mut AutomationSequence> {
        self.sequences
            .get_mut(&parameter)
            .ok_or(TimelineError::UnknownParameter(parameter))
    }

    /// All sequences in declaration order
    pub fn sequences(&self) -> impl Iterator<Item = &AutomationSequence> {
        self.sequences.values()
    }

    /// Parameters owned by this holder
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + '_ {
        self.sequences.keys().copied()
    }

    /// Whether this holder owns `parameter`
    pub fn has_parameter(&self, parameter: Parameter) -> bool {
        self.sequences.contains_key(&parameter)
    }

    /// Whether any sequence needs evaluation
    pub fn is_automated(&self) -> bool {
        self.sequences.values().any(AutomationSequence::is_automation_in_use)
    }

    /// Live value of a parameter
    pub fn value(&self, parameter: Parameter) -> Option<&AutomationValue> {
        self.sequence(parameter).map(AutomationSequence::live_value)
    }

    /// Live value of a float parameter
    pub fn float(&self, parameter: Parameter) -> Option<f32> {
        self.value(parameter).and_then(AutomationValue::as_float)
    }

    /// Live value of a double parameter
    pub fn double(&self, parameter: Parameter) -> Option<f64> {
        self.value(parameter).and_then(AutomationValue::as_double)
    }

    /// Live value of an integer parameter
    pub fn long(&self, parameter: Parameter) -> Option<i64> {
        self.value(parameter).and_then(AutomationValue::as_long)
    }

    /// Live value of a boolean parameter
    pub fn bool(&self, parameter: Parameter) -> Option<bool> {
        self.value(parameter).and_then(AutomationValue::as_bool)
    }

    /// Live value of a Vec2 parameter
    pub fn vec2(&self, parameter: Parameter) -> Option<[f32; 2]> {
        self.value(parameter).and_then(AutomationValue::as_vec2)
    }

    /// Live value of a color parameter
    pub fn color(&self, parameter: Parameter) -> Option<[f32; 4]> {
        self.value(parameter).and_then(AutomationValue::as_color)
    }

    /// Evaluate every in-use sequence at `frame`, recording changed values.
    ///
    /// Returns the number of sequences evaluated.
    pub(crate) fn update_at(&mut self, frame: i64, changes: &mut Vec<(Parameter, AutomationValue)>) -> usize {
        let mut evaluated = 0;
        for sequence in self.sequences.values_mut() {
            if !sequence.is_automation_in_use() {
                continue;
            }
            evaluated += 1;
            if let Some(value) = sequence.do_update_value(frame) {
                changes.push((sequence.parameter(), value));
            }
        }
        evaluated
    }

    /// Move every keyframe by `delta` frames
    pub(crate) fn shift_key_frames(&mut self, delta: i64) {
        if delta == 0 {
            return;
        }
        for sequence in self.sequences.values_mut() {
            sequence.shift_key_frames(delta);
        }
    }

    /// Deep copy with fresh keyframe identities
    pub(crate) fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        for sequence in copy.sequences.values_mut() {
            sequence.regenerate_ids();
        }
        copy
    }

    /// Check the decoded state: exactly the expected parameters, each valid
    pub(crate) fn validate(&self, expected: &[Parameter]) -> Result<()> {
        if self.sequences.len() != expected.len() || expected.iter().any(|p| !self.has_parameter(*p)) {
            let found: Vec<Parameter> = self.parameters().collect();
            return Err(TimelineError::InvalidState(format!(
                "expected parameters {expected:?}, found {found:?}"
            )));
        }
        for (parameter, sequence) in &self.sequences {
            if sequence.parameter() != *parameter {
                return Err(TimelineError::InvalidState(format!(
                    "sequence for {:?} stored under {parameter:?}",
                    sequence.parameter()
                )));
            }
            sequence.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{TIMELINE_PARAMETERS, VIDEO_CLIP_PARAMETERS};

    #[test]
    fn test_fixed_parameter_set() {
        let mut data = AutomationData::new(TIMELINE_PARAMETERS);
        assert!(data.has_parameter(Parameter::MasterVolume));
        assert!(!data.has_parameter(Parameter::Opacity));
        assert_eq!(
            data.sequence_mut(Parameter::Opacity).err(),
            Some(TimelineError::UnknownParameter(Parameter::Opacity))
        );
        assert_eq!(data.float(Parameter::MasterVolume), Some(1.0));
    }

    #[test]
    fn test_update_skips_unused_sequences() {
        let mut data = AutomationData::new(VIDEO_CLIP_PARAMETERS);
        data.sequence_mut(Parameter::Opacity)
            .unwrap()
            .add_key_frame(0, AutomationValue::Double(0.5))
            .unwrap();

        let mut changes = Vec::new();
        let evaluated = data.update_at(10, &mut changes);
        assert_eq!(evaluated, 1);
        assert_eq!(changes, vec![(Parameter::Opacity, AutomationValue::Double(0.5))]);
        assert_eq!(data.double(Parameter::Opacity), Some(0.5));
    }

    #[test]
    fn test_shift_and_duplicate() {
        let mut data = AutomationData::new(VIDEO_CLIP_PARAMETERS);
        let seq = data.sequence_mut(Parameter::Opacity).unwrap();
        let id = seq.add_key_frame(20, AutomationValue::Double(0.0)).unwrap();

        let copy = data.duplicate();
        data.shift_key_frames(-15);

        let moved = data.sequence(Parameter::Opacity).unwrap();
        assert_eq!(moved.key_frames()[0].frame(), 5);
        let copied = copy.sequence(Parameter::Opacity).unwrap();
        assert_eq!(copied.key_frames()[0].frame(), 20);
        assert_ne!(copied.key_frames()[0].id, id);
    }

    #[test]
    fn test_validate_rejects_foreign_sets() {
        let data = AutomationData::new(TIMELINE_PARAMETERS);
        assert!(data.validate(TIMELINE_PARAMETERS).is_ok());
        assert!(data.validate(VIDEO_CLIP_PARAMETERS).is_err());
    }
}
