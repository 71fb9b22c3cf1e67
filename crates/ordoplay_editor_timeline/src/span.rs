// SPDX-License-Identifier: MIT OR Apache-2.0
//! Half-open frame ranges.

use crate::error::{Result, TimelineError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An immutable `[begin, begin + duration)` range on the integer frame axis.
///
/// Both `begin` and `duration` are never negative. A zero-duration span is
/// legal but contains no frames and intersects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "SpanRepr")]
pub struct FrameSpan {
    begin: i64,
    duration: i64,
}

#[derive(Deserialize)]
#[serde(rename = "FrameSpan")]
struct SpanRepr {
    begin: i64,
    duration: i64,
}

impl TryFrom<SpanRepr> for FrameSpan {
    type Error = TimelineError;

    fn try_from(repr: SpanRepr) -> Result<Self> {
        Self::new(repr.begin, repr.duration)
    }
}

impl FrameSpan {
    /// Create a span, rejecting a negative begin or duration and an end
    /// frame past `i64::MAX`
    pub fn new(begin: i64, duration: i64) -> Result<Self> {
        if begin < 0 || duration < 0 || begin.checked_add(duration).is_none() {
            return Err(TimelineError::InvalidSpan { begin, duration });
        }
        Ok(Self { begin, duration })
    }

    /// Create a span from a begin frame and an exclusive end frame
    pub fn from_range(begin: i64, end: i64) -> Result<Self> {
        match end.checked_sub(begin) {
            Some(duration) => Self::new(begin, duration),
            None => Err(TimelineError::InvalidSpan {
                begin,
                duration: end.saturating_sub(begin),
            }),
        }
    }

    /// First frame of the span
    pub fn begin(&self) -> i64 {
        self.begin
    }

    /// Number of frames in the span
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Exclusive end frame (`begin + duration`)
    pub fn end_index(&self) -> i64 {
        self.begin + self.duration
    }

    /// Whether the span covers no frames
    pub fn is_empty(&self) -> bool {
        self.duration == 0
    }

    /// Whether `frame` lies in `[begin, end)`
    pub fn contains(&self, frame: i64) -> bool {
        frame >= self.begin && frame < self.end_index()
    }

    /// Whether the two half-open ranges share at least one frame
    pub fn intersects(&self, other: &FrameSpan) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.begin < other.end_index()
            && other.begin < self.end_index()
    }

    /// Whether `other` lies entirely inside this span
    pub fn encloses(&self, other: &FrameSpan) -> bool {
        other.begin >= self.begin && other.end_index() <= self.end_index()
    }

    /// The frames shared by both spans, if any
    pub fn intersection(&self, other: &FrameSpan) -> Option<FrameSpan> {
        if !self.intersects(other) {
            return None;
        }
        let begin = self.begin.max(other.begin);
        let end = self.end_index().min(other.end_index());
        Some(Self {
            begin,
            duration: end - begin,
        })
    }

    /// Same duration, new begin
    pub fn with_begin(&self, begin: i64) -> Result<Self> {
        Self::new(begin, self.duration)
    }

    /// Same begin, new duration
    pub fn with_duration(&self, duration: i64) -> Result<Self> {
        Self::new(self.begin, duration)
    }

    /// Shift the span by `delta` frames
    pub fn offset(&self, delta: i64) -> Result<Self> {
        match self.begin.checked_add(delta) {
            Some(begin) => Self::new(begin, self.duration),
            None => Err(TimelineError::InvalidSpan {
                begin: self.begin.saturating_add(delta),
                duration: self.duration,
            }),
        }
    }

    /// Iterate every frame of the span in order
    pub fn frames(&self) -> impl Iterator<Item = i64> {
        self.begin..self.end_index()
    }
}

impl fmt::Display for FrameSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end_index())
    }
}
