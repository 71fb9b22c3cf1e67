// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe values and interpolation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyFrameId(pub Uuid);

impl KeyFrameId {
    /// Create a new random keyframe ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyFrameId {
    fn default() -> Self {
        Self::new()
    }
}

/// How a sequence blends between two neighbouring keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InterpolationMode {
    /// Hold the earlier keyframe's value until the next keyframe
    Discrete,
    /// Straight line between the two values
    #[default]
    Linear,
    /// Smoothstep ease in and out
    Smooth,
}

impl InterpolationMode {
    /// Remap a linear blend factor according to the mode
    pub fn ease(self, t: f64) -> f64 {
        match self {
            Self::Discrete => 0.0,
            Self::Linear => t,
            Self::Smooth => Interpolation::smoothstep(t),
        }
    }
}

/// The kinds of value a parameter can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// 64-bit integer
    Long,
    /// Boolean
    Bool,
    /// 2D vector
    Vec2,
    /// RGBA color
    Color,
}

type LerpFn = fn(&AutomationValue, &AutomationValue, f64) -> AutomationValue;

impl ValueKind {
    /// Blend function for this kind. Both operands must be of this kind.
    fn lerp_fn(self) -> LerpFn {
        match self {
            Self::Float => |a, b, t| match (a, b) {
                (AutomationValue::Float(a), AutomationValue::Float(b)) => {
                    AutomationValue::Float(Interpolation::lerp(*a, *b, t as f32))
                }
                _ => a.clone(),
            },
            Self::Double => |a, b, t| match (a, b) {
                (AutomationValue::Double(a), AutomationValue::Double(b)) => {
                    AutomationValue::Double(Interpolation::lerp_f64(*a, *b, t))
                }
                _ => a.clone(),
            },
            Self::Long => |a, b, t| match (a, b) {
                (AutomationValue::Long(a), AutomationValue::Long(b)) => {
                    AutomationValue::Long(Interpolation::lerp_i64(*a, *b, t))
                }
                _ => a.clone(),
            },
            // Booleans never blend
            Self::Bool => |a, _, _| a.clone(),
            Self::Vec2 => |a, b, t| match (a, b) {
                (AutomationValue::Vec2(a), AutomationValue::Vec2(b)) => {
                    AutomationValue::Vec2(Interpolation::lerp_vec2(*a, *b, t as f32))
                }
                _ => a.clone(),
            },
            Self::Color => |a, b, t| match (a, b) {
                (AutomationValue::Color(a), AutomationValue::Color(b)) => {
                    AutomationValue::Color(Interpolation::lerp_vec4(*a, *b, t as f32))
                }
                _ => a.clone(),
            },
        }
    }
}

/// Value stored in a keyframe or pushed to a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AutomationValue {
    /// Float value
    Float(f32),
    /// Double value
    Double(f64),
    /// Integer value
    Long(i64),
    /// Boolean
    Bool(bool),
    /// 2D vector
    Vec2([f32; 2]),
    /// Color (RGBA)
    Color([f32; 4]),
}

impl AutomationValue {
    /// Kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::Long(_) => ValueKind::Long,
            Self::Bool(_) => ValueKind::Bool,
            Self::Vec2(_) => ValueKind::Vec2,
            Self::Color(_) => ValueKind::Color,
        }
    }

    /// Interpolate towards `other` by `t` in `[0, 1]`.
    ///
    /// Returns `None` when the two values are of different kinds.
    pub fn interpolate(&self, other: &AutomationValue, t: f64, mode: InterpolationMode) -> Option<AutomationValue> {
        let kind = self.kind();
        if kind != other.kind() {
            return None;
        }
        let t = mode.ease(t.clamp(0.0, 1.0));
        Some((kind.lerp_fn())(self, other, t))
    }

    /// Get as float if possible
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as double if possible
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as integer if possible
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as boolean if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as Vec2 if possible
    pub fn as_vec2(&self) -> Option<[f32; 2]> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as color if possible
    pub fn as_color(&self) -> Option<[f32; 4]> {
        match self {
            Self::Color(v) => Some(*v),
            _ => None,
        }
    }
}

/// A timestamped value inside an automation sequence.
///
/// The frame is fixed once the keyframe is stored; sequences move keyframes
/// through their own API so ordering stays intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFrame {
    /// Unique keyframe ID
    pub id: KeyFrameId,
    frame: i64,
    value: AutomationValue,
}

impl KeyFrame {
    pub(crate) fn new(frame: i64, value: AutomationValue) -> Self {
        Self {
            id: KeyFrameId::new(),
            frame,
            value,
        }
    }

    /// Frame of this keyframe, relative to its holder
    pub fn frame(&self) -> i64 {
        self.frame
    }

    /// Value at this keyframe
    pub fn value(&self) -> &AutomationValue {
        &self.value
    }

    pub(crate) fn set_frame(&mut self, frame: i64) {
        self.frame = frame;
    }

    pub(crate) fn set_value(&mut self, value: AutomationValue) {
        self.value = value;
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Linear interpolation between two doubles
    pub fn lerp_f64(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }

    /// Linear interpolation between two integers, rounded to nearest
    pub fn lerp_i64(a: i64, b: i64, t: f64) -> i64 {
        a + ((b - a) as f64 * t).round() as i64
    }

    /// Interpolate Vec2
    pub fn lerp_vec2(a: [f32; 2], b: [f32; 2], t: f32) -> [f32; 2] {
        [Self::lerp(a[0], b[0], t), Self::lerp(a[1], b[1], t)]
    }

    /// Interpolate Vec4 / color
    pub fn lerp_vec4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
        [
            Self::lerp(a[0], b[0], t),
            Self::lerp(a[1], b[1], t),
            Self::lerp(a[2], b[2], t),
            Self::lerp(a[3], b[3], t),
        ]
    }

    /// Hermite smoothstep on `[0, 1]`
    pub fn smoothstep(t: f64) -> f64 {
        t * t * (3.0 - 2.0 * t)
    }
}
