// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor session: one timeline, its automation engine and edit history.
//!
//! The session is the only owner of the model. Edits go through
//! [`EditorSession::edit`], which snapshots the timeline so the change can be
//! undone, and every structural change re-evaluates the playhead frame so
//! live values, the audio graph and the preview stay in step.

use crate::audio::{AudioFormat, AudioGraph, AudioGraphHandle, AudioSources};
use crate::config::PlaybackConfig;
use crate::error::Result;
use crate::history::{History, StateSnapshot};
use crate::sources::SourceFactory;
use crate::video::{FramePlan, RenderedFrame, VideoRenderer};
use ordoplay_editor_timeline::{
    AutomationEngine, AutomationObserver, EvaluationStats, Timeline, TimelineError, TimelineEvent, ValueChange,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Owns a timeline and everything that plays it
pub struct EditorSession {
    timeline: Timeline,
    engine: AutomationEngine,
    history: History,
    renderer: VideoRenderer,
    audio_sources: AudioSources,
    audio: AudioGraphHandle,
    format: AudioFormat,
    playhead: i64,
    last_stats: Option<EvaluationStats>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl EditorSession {
    /// Create a session around `timeline`, evaluated at frame 0
    pub fn new(timeline: Timeline, config: &PlaybackConfig, factory: Arc<dyn SourceFactory>) -> Result<Self> {
        let format = config.audio_format(timeline.frame_rate());
        let mut session = Self {
            timeline,
            engine: AutomationEngine::new(),
            history: History::with_max_depth(config.history_depth),
            renderer: VideoRenderer::new(config.width, config.height, Arc::clone(&factory)),
            audio_sources: AudioSources::new(factory),
            audio: AudioGraphHandle::new(),
            format,
            playhead: 0,
            last_stats: None,
            path: None,
            dirty: false,
        };
        session.seek(0)?;
        Ok(session)
    }

    /// Open a timeline document
    pub fn open(path: &Path, config: &PlaybackConfig, factory: Arc<dyn SourceFactory>) -> Result<Self> {
        let timeline = Timeline::load_from(path)?;
        let mut session = Self::new(timeline, config, factory)?;
        session.path = Some(path.to_path_buf());
        Ok(session)
    }

    /// Save to `path` and remember it
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        self.timeline.save_to(path)?;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        Ok(())
    }

    /// Save to the remembered path
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| TimelineError::InvalidState("session has no file path".to_string()))?;
        self.save_as(&path)
    }

    /// The model
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// The automation engine
    pub fn engine(&self) -> &AutomationEngine {
        &self.engine
    }

    /// Edit history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Last evaluated frame
    pub fn playhead(&self) -> i64 {
        self.playhead
    }

    /// Statistics of the last evaluation pass
    pub fn last_stats(&self) -> Option<EvaluationStats> {
        self.last_stats
    }

    /// Audio layout used for mixing
    pub fn audio_format(&self) -> AudioFormat {
        self.format
    }

    /// Handle for the audio thread
    pub fn audio_handle(&self) -> AudioGraphHandle {
        self.audio.clone()
    }

    /// Document path, if the session was opened or saved
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether there are unsaved edits
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Output size of the video renderer
    pub fn output_size(&self) -> (u32, u32) {
        self.renderer.size()
    }

    /// Evaluate automation at `frame` and publish the audio graph.
    ///
    /// Negative frames are clamped to 0.
    pub fn seek(&mut self, frame: i64) -> Result<EvaluationStats> {
        self.seek_with(frame, &mut |_: &mut Timeline, _: &ValueChange| {})
    }

    /// Like [`EditorSession::seek`], reporting value changes to `observer`
    pub fn seek_with(&mut self, frame: i64, observer: &mut dyn AutomationObserver) -> Result<EvaluationStats> {
        let frame = frame.max(0);
        let stats = self.engine.update_at_with(&mut self.timeline, frame, observer)?;
        self.playhead = frame;
        self.last_stats = Some(stats);
        self.audio.publish(AudioGraph::capture(&self.timeline, &mut self.audio_sources));
        tracing::trace!("Seek to {frame}: {} values changed", stats.values_changed);
        Ok(stats)
    }

    /// Evaluate `frame` and prepare it for rendering
    pub fn prepare_frame(&mut self, frame: i64) -> Result<FramePlan> {
        self.seek(frame)?;
        Ok(self.renderer.prepare_frame(&self.timeline, self.playhead))
    }

    /// Render the playhead frame on the calling thread
    pub fn render_preview(&mut self) -> RenderedFrame {
        self.renderer.prepare_frame(&self.timeline, self.playhead).render()
    }

    /// Run an undoable edit.
    ///
    /// The edit is recorded only when `apply` succeeds. On failure the
    /// timeline is restored to its state before the call, so a closure that
    /// fails halfway leaves nothing behind.
    pub fn edit<R>(
        &mut self,
        description: impl Into<String>,
        apply: impl FnOnce(&mut Timeline) -> std::result::Result<R, TimelineError>,
    ) -> Result<R> {
        let description = description.into();
        let before = StateSnapshot::from_value(&self.timeline)?;

        let value = match apply(&mut self.timeline) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("Edit '{description}' rejected: {err}");
                self.timeline.replace_with(before.to_value()?)?;
                self.refresh()?;
                return Err(err.into());
            }
        };

        let after = StateSnapshot::from_value(&self.timeline)?;
        let id = self.history.record(description.as_str(), before, after);
        self.dirty = true;
        tracing::debug!("Committed edit {} '{description}'", id.value());
        self.refresh()?;
        Ok(value)
    }

    /// Undo the last edit, returning its description
    pub fn undo(&mut self) -> Result<String> {
        let entry = self.history.undo()?;
        let description = entry.description.clone();
        let snapshot = entry.before.clone();
        self.restore(&snapshot)?;
        tracing::debug!("Undid '{description}'");
        Ok(description)
    }

    /// Redo the last undone edit, returning its description
    pub fn redo(&mut self) -> Result<String> {
        let entry = self.history.redo()?;
        let description = entry.description.clone();
        let snapshot = entry.after.clone();
        self.restore(&snapshot)?;
        tracing::debug!("Redid '{description}'");
        Ok(description)
    }

    /// Drain structural change events
    pub fn take_events(&mut self) -> Vec<TimelineEvent> {
        self.timeline.take_events()
    }

    fn restore(&mut self, snapshot: &StateSnapshot) -> Result<()> {
        self.timeline.replace_with(snapshot.to_value()?)?;
        self.dirty = true;
        self.refresh()
    }

    fn refresh(&mut self) -> Result<()> {
        self.renderer.retain_clips(&self.timeline);
        self.audio_sources.retain_clips(&self.timeline);
        self.seek(self.playhead)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use crate::history::HistoryError;
    use crate::sources::GeneratorFactory;
    use ordoplay_editor_timeline::{AutomationValue, Clip, ClipKind, FrameSpan, Parameter, Track};

    fn session() -> EditorSession {
        EditorSession::new(Timeline::default(), &PlaybackConfig::default(), Arc::new(GeneratorFactory::new())).unwrap()
    }

    #[test]
    fn test_edit_undo_redo() {
        let mut session = session();
        let track = session
            .edit("Add track", |t| t.add_track(Track::new("V1", ClipKind::Video)))
            .unwrap();
        session
            .edit("Add clip", |t| {
                t.add_clip(track, Clip::new("c", ClipKind::Video, FrameSpan::new(0, 10).unwrap()))
            })
            .unwrap();
        assert!(session.is_dirty());
        assert_eq!(session.timeline().largest_frame_in_use(), 10);

        assert_eq!(session.undo().unwrap(), "Add clip");
        assert_eq!(session.timeline().largest_frame_in_use(), 0);
        assert_eq!(session.timeline().tracks().len(), 1);

        assert_eq!(session.redo().unwrap(), "Add clip");
        assert_eq!(session.timeline().largest_frame_in_use(), 10);
        assert_eq!(session.timeline().tracks()[0].clips()[0].track(), Some(track));
    }

    #[test]
    fn test_failed_edit_rolls_back() {
        let mut session = session();
        let result = session.edit("Add and overlap", |t| {
            let track = t.add_track(Track::new("V1", ClipKind::Video))?;
            t.add_clip(track, Clip::new("a", ClipKind::Video, FrameSpan::new(0, 10).unwrap()))?;
            t.add_clip(track, Clip::new("b", ClipKind::Video, FrameSpan::new(5, 10).unwrap()))
        });
        assert!(matches!(result, Err(PlaybackError::Timeline(TimelineError::Overlap { .. }))));
        assert!(session.timeline().tracks().is_empty());
        assert!(!session.history().can_undo());
        assert!(matches!(
            session.undo(),
            Err(PlaybackError::History(HistoryError::NothingToUndo))
        ));
    }

    #[test]
    fn test_undo_reevaluates_live_values() {
        let mut session = session();
        session
            .edit("Ramp volume", |t| {
                let sequence = t.automation_mut()?.sequence_mut(Parameter::MasterVolume)?;
                sequence.add_key_frame(0, AutomationValue::Float(0.0))?;
                sequence.add_key_frame(10, AutomationValue::Float(1.0))
            })
            .unwrap();
        session.seek(5).unwrap();
        assert_eq!(session.timeline().automation().float(Parameter::MasterVolume), Some(0.5));
        assert_eq!(session.audio_handle().snapshot().master_volume, 0.5);

        session.undo().unwrap();
        assert_eq!(session.playhead(), 5);
        assert_eq!(session.timeline().automation().float(Parameter::MasterVolume), Some(1.0));

        session.redo().unwrap();
        assert_eq!(session.timeline().automation().float(Parameter::MasterVolume), Some(0.5));
    }

    #[test]
    fn test_seek_clamps_negative() {
        let mut session = session();
        let stats = session.seek(-20).unwrap();
        assert_eq!(stats.frame, 0);
        assert_eq!(session.playhead(), 0);
    }
}
