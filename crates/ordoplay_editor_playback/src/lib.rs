// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview, render and export pipeline for `OrdoPlay` Editor timelines.
//!
//! This crate plays a [`Timeline`](ordoplay_editor_timeline::Timeline):
//! - Video frames are prepared on the editing thread and composited on a
//!   pool of render threads
//! - Audio is captured into an immutable graph the audio thread mixes from
//! - An [`EditorSession`] owns the model, its automation engine and the
//!   undo/redo history
//! - [`export`](export::export) drives a frame range through all of it
//!
//! ## Threading
//!
//! Only the session's thread touches the model. Render threads see
//! [`FramePlan`]s, the audio thread sees [`AudioGraph`] snapshots. A frame is
//! always fully evaluated before it is prepared or mixed.

pub mod audio;
pub mod config;
pub mod error;
pub mod export;
pub mod frame;
pub mod history;
pub mod pool;
pub mod session;
pub mod sources;
pub mod video;

pub use audio::{AudioClipState, AudioFormat, AudioGraph, AudioGraphHandle, AudioMixer, AudioSource, AudioSources, AudioTrack};
pub use config::{PlaybackConfig, CONFIG_FILE_NAME, CONFIG_FORMAT_VERSION};
pub use error::{PlaybackError, Result};
pub use export::{export, ExportReport, ExportSettings, FrameSink};
pub use frame::{FrameBuffer, RenderArea};
pub use history::{EditId, History, HistoryEntry, HistoryError, HistoryStats, StateSnapshot, DEFAULT_HISTORY_DEPTH};
pub use pool::RenderPool;
pub use session::EditorSession;
pub use sources::{GeneratorFactory, SourceFactory};
pub use video::{ClipRenderInfo, FramePlan, LayerPlan, PreparedFrame, RenderedFrame, VideoRenderer, VideoSourceContext};
