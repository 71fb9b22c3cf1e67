// SPDX-License-Identifier: MIT OR Apache-2.0
//! Automatable parameters.
//!
//! Parameters form a closed set. Each one has a fixed value kind and belongs
//! to one holder scope, so two parameters can never collide even when they
//! share a display name.

use crate::clip::ClipKind;
use crate::keyframe::{AutomationValue, ValueKind};
use serde::{Deserialize, Serialize};

/// Which kind of holder owns a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HolderKind {
    /// Project-level parameters
    Timeline,
    /// Per-track parameters
    Track,
    /// Per-clip parameters
    Clip,
}

/// An automatable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    /// Output gain applied to the whole mix
    MasterVolume,
    /// Color the compositor clears each frame to
    BackgroundColor,
    /// Opacity multiplier for every clip on a video track
    TrackOpacity,
    /// Gain for every clip on an audio track
    TrackVolume,
    /// Clip opacity
    Opacity,
    /// Top-left corner of the clip's content, in output pixels
    MediaPosition,
    /// Scale of the clip's content
    MediaScale,
    /// Multiplicative tint of the clip's content
    Tint,
    /// Extra frames added to the source frame index
    FrameOffset,
    /// Clip gain
    Volume,
    /// Whether the clip is silenced or hidden
    Muted,
}

/// Parameters owned by a timeline
pub const TIMELINE_PARAMETERS: &[Parameter] = &[Parameter::MasterVolume, Parameter::BackgroundColor];

/// Parameters owned by a video track
pub const VIDEO_TRACK_PARAMETERS: &[Parameter] = &[Parameter::TrackOpacity];

/// Parameters owned by an audio track
pub const AUDIO_TRACK_PARAMETERS: &[Parameter] = &[Parameter::TrackVolume];

/// Parameters owned by a video clip
pub const VIDEO_CLIP_PARAMETERS: &[Parameter] = &[
    Parameter::Opacity,
    Parameter::MediaPosition,
    Parameter::MediaScale,
    Parameter::Tint,
    Parameter::FrameOffset,
    Parameter::Muted,
];

/// Parameters owned by an audio clip
pub const AUDIO_CLIP_PARAMETERS: &[Parameter] = &[Parameter::Volume, Parameter::FrameOffset, Parameter::Muted];

impl Parameter {
    /// Kind of value this parameter stores
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::MasterVolume | Self::TrackVolume | Self::Volume => ValueKind::Float,
            Self::TrackOpacity | Self::Opacity => ValueKind::Double,
            Self::FrameOffset => ValueKind::Long,
            Self::Muted => ValueKind::Bool,
            Self::MediaPosition | Self::MediaScale => ValueKind::Vec2,
            Self::BackgroundColor | Self::Tint => ValueKind::Color,
        }
    }

    /// Value used when nothing has been set
    pub fn default_value(&self) -> AutomationValue {
        match self {
            Self::MasterVolume | Self::TrackVolume | Self::Volume => AutomationValue::Float(1.0),
            Self::TrackOpacity | Self::Opacity => AutomationValue::Double(1.0),
            Self::BackgroundColor => AutomationValue::Color([0.0, 0.0, 0.0, 1.0]),
            Self::Tint => AutomationValue::Color([1.0, 1.0, 1.0, 1.0]),
            Self::MediaPosition => AutomationValue::Vec2([0.0, 0.0]),
            Self::MediaScale => AutomationValue::Vec2([1.0, 1.0]),
            Self::FrameOffset => AutomationValue::Long(0),
            Self::Muted => AutomationValue::Bool(false),
        }
    }

    /// Holder scope this parameter belongs to
    pub fn scope(&self) -> HolderKind {
        match self {
            Self::MasterVolume | Self::BackgroundColor => HolderKind::Timeline,
            Self::TrackOpacity | Self::TrackVolume => HolderKind::Track,
            _ => HolderKind::Clip,
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::MasterVolume => "Master Volume",
            Self::BackgroundColor => "Background",
            Self::TrackOpacity | Self::Opacity => "Opacity",
            Self::TrackVolume | Self::Volume => "Volume",
            Self::MediaPosition => "Position",
            Self::MediaScale => "Scale",
            Self::Tint => "Tint",
            Self::FrameOffset => "Frame Offset",
            Self::Muted => "Muted",
        }
    }

    /// The fixed parameter set of a track accepting `kind` clips
    pub fn for_track(kind: ClipKind) -> &'static [Parameter] {
        match kind {
            ClipKind::Video => VIDEO_TRACK_PARAMETERS,
            ClipKind::Audio => AUDIO_TRACK_PARAMETERS,
        }
    }

    /// The fixed parameter set of a `kind` clip
    pub fn for_clip(kind: ClipKind) -> &'static [Parameter] {
        match kind {
            ClipKind::Video => VIDEO_CLIP_PARAMETERS,
            ClipKind::Audio => AUDIO_CLIP_PARAMETERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_kinds() {
        let all = [
            TIMELINE_PARAMETERS,
            VIDEO_TRACK_PARAMETERS,
            AUDIO_TRACK_PARAMETERS,
            VIDEO_CLIP_PARAMETERS,
            AUDIO_CLIP_PARAMETERS,
        ];
        for set in all {
            for parameter in set {
                assert_eq!(parameter.default_value().kind(), parameter.kind(), "{parameter:?}");
            }
        }
    }

    #[test]
    fn test_same_name_distinct_identity() {
        assert_eq!(Parameter::TrackOpacity.name(), Parameter::Opacity.name());
        assert_ne!(Parameter::TrackOpacity, Parameter::Opacity);
        assert_eq!(Parameter::TrackOpacity.scope(), HolderKind::Track);
        assert_eq!(Parameter::Opacity.scope(), HolderKind::Clip);
    }
}
