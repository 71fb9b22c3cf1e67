// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-indexed timeline model for `OrdoPlay` Editor.
//!
//! This crate provides the editing core of the video timeline:
//! - Half-open frame spans
//! - Keyframed automation sequences over typed values
//! - Tracks of non-overlapping clips
//! - Split, trim and range-removal edits
//! - Deterministic per-frame automation evaluation
//!
//! ## Architecture
//!
//! The model is a strict ownership tree:
//! - `Timeline` owns `Track`s, a `Track` owns `Clip`s
//! - Every holder owns a fixed `AutomationData` set
//! - Clips refer back to their track by ID only
//! - `AutomationEngine` walks the tree top-down for one frame

pub mod span;
pub mod keyframe;
pub mod parameter;
pub mod sequence;
pub mod automation;
pub mod clip;
pub mod track;
pub mod edit;
pub mod event;
pub mod timeline;
pub mod engine;
pub mod persist;
pub mod cancel;
pub mod error;

pub use span::FrameSpan;
pub use keyframe::{AutomationValue, Interpolation, InterpolationMode, KeyFrame, KeyFrameId, ValueKind};
pub use parameter::{HolderKind, Parameter};
pub use sequence::AutomationSequence;
pub use automation::{AutomationData, EvalPhase};
pub use clip::{Clip, ClipContent, ClipId, ClipKind};
pub use track::{Track, TrackId};
pub use edit::{CutRequest, SplitOutcome};
pub use event::TimelineEvent;
pub use timeline::{Timeline, DEFAULT_FRAME_RATE};
pub use engine::{AutomationEngine, AutomationObserver, EvaluationStats, HolderRef, ValueChange};
pub use persist::{TIMELINE_FILE_EXTENSION, TIMELINE_FORMAT_VERSION};
pub use cancel::CancelFlag;
pub use error::{Result, TimelineError};
