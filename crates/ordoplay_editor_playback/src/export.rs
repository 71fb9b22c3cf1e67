// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-range export.
//!
//! For every frame the exporter evaluates automation, prepares the frame on
//! this thread, hands the plan to the render pool and mixes the frame's
//! audio. Rendered frames come back out of order and are written to the
//! sink in frame order. Export only seeks; it never edits the model.

use crate::audio::AudioFormat;
use crate::error::{PlaybackError, Result};
use crate::pool::RenderPool;
use crate::session::EditorSession;
use crate::video::RenderedFrame;
use ordoplay_editor_timeline::{CancelFlag, FrameSpan};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// Receives exported frames and audio in frame order
pub trait FrameSink {
    /// Write one composited frame
    fn write_frame(&mut self, frame: &RenderedFrame) -> Result<()>;

    /// Write the audio of one timeline frame
    fn write_audio(&mut self, _frame: i64, _samples: &[f32], _format: &AudioFormat) -> Result<()> {
        Ok(())
    }

    /// Called once after the last frame
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Export options
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    /// Frames to export; `None` exports from 0 to the last frame in use
    pub range: Option<FrameSpan>,
    /// Plans submitted before waiting for results
    pub max_in_flight: usize,
    /// Whether to mix and write audio
    pub audio: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            range: None,
            max_in_flight: 8,
            audio: true,
        }
    }
}

/// Outcome of an export run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    /// First exported frame
    pub first_frame: i64,
    /// Frames in the requested range
    pub frames_requested: usize,
    /// Frames written to the sink
    pub frames_completed: usize,
    /// Whether the run stopped early
    pub cancelled: bool,
    /// Interleaved audio values written
    pub audio_samples: usize,
    /// Wall time in milliseconds
    pub elapsed_ms: u64,
}

/// Writes rendered frames in order as they become available
struct Reorder {
    next: i64,
    pending: BTreeMap<i64, RenderedFrame>,
    written: usize,
}

impl Reorder {
    fn push(&mut self, frame: RenderedFrame, sink: &mut dyn FrameSink) -> Result<()> {
        self.pending.insert(frame.frame, frame);
        while let Some(frame) = self.pending.remove(&self.next) {
            sink.write_frame(&frame)?;
            self.written += 1;
            self.next += 1;
        }
        Ok(())
    }
}

/// Export a frame range through `pool` into `sink`.
///
/// `cancel` is checked before each frame. Frames already submitted when
/// cancellation is seen are still written, and the report says how far the
/// run got. The session's playhead is restored afterwards.
pub fn export(
    session: &mut EditorSession,
    pool: &mut RenderPool,
    sink: &mut dyn FrameSink,
    settings: &ExportSettings,
    cancel: &CancelFlag,
) -> Result<ExportReport> {
    let range = match settings.range {
        Some(range) => range,
        None => FrameSpan::from_range(0, session.timeline().largest_frame_in_use())?,
    };
    if range.is_empty() {
        return Err(PlaybackError::InvalidRange {
            begin: range.begin(),
            end: range.end_index(),
        });
    }

    while pool.in_flight() > 0 {
        let stale = pool.recv_blocking()?;
        tracing::debug!("Discarding stale rendered frame {}", stale.frame);
    }

    let started = Instant::now();
    let playhead = session.playhead();
    let format = session.audio_format();
    let max_in_flight = settings.max_in_flight.max(1);
    tracing::info!("Exporting frames {range} with {} render threads", pool.threads());

    let mut report = ExportReport {
        first_frame: range.begin(),
        frames_requested: range.duration() as usize,
        ..Default::default()
    };
    let mut reorder = Reorder {
        next: range.begin(),
        pending: BTreeMap::new(),
        written: 0,
    };
    let mut samples = Vec::new();
    let mut scratch = Vec::new();

    for frame in range.frames() {
        if cancel.is_cancelled() {
            tracing::warn!("Export cancelled before frame {frame}");
            report.cancelled = true;
            break;
        }

        let plan = session.prepare_frame(frame)?;
        pool.submit(plan)?;

        if settings.audio {
            samples.clear();
            samples.resize(format.buffer_len(frame), 0.0);
            let written = session.audio_handle().snapshot().mix(frame, &mut samples, &mut scratch, &format);
            sink.write_audio(frame, &samples, &format)?;
            report.audio_samples += written;
        }

        while let Some(rendered) = pool.try_recv() {
            reorder.push(rendered, sink)?;
        }
        while pool.in_flight() >= max_in_flight {
            let rendered = pool.recv_blocking()?;
            reorder.push(rendered, sink)?;
        }
    }

    while pool.in_flight() > 0 {
        let rendered = pool.recv_blocking()?;
        reorder.push(rendered, sink)?;
    }
    sink.finish()?;
    session.seek(playhead)?;

    report.frames_completed = reorder.written;
    report.elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        "Exported {}/{} frames in {} ms",
        report.frames_completed,
        report.frames_requested,
        report.elapsed_ms
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;
    use crate::sources::GeneratorFactory;
    use ordoplay_editor_timeline::{Clip, ClipContent, ClipKind, Timeline, Track};
    use std::sync::Arc;

    #[derive(Default)]
    struct Collect {
        frames: Vec<i64>,
        audio_frames: Vec<i64>,
        finished: bool,
        cancel_after: Option<(usize, CancelFlag)>,
    }

    impl FrameSink for Collect {
        fn write_frame(&mut self, frame: &RenderedFrame) -> Result<()> {
            self.frames.push(frame.frame);
            Ok(())
        }

        fn write_audio(&mut self, frame: i64, _samples: &[f32], _format: &AudioFormat) -> Result<()> {
            self.audio_frames.push(frame);
            if let Some((after, cancel)) = &self.cancel_after {
                if self.audio_frames.len() >= *after {
                    cancel.cancel();
                }
            }
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn session() -> EditorSession {
        let mut timeline = Timeline::default();
        let video = timeline.add_track(Track::new("V1", ClipKind::Video)).unwrap();
        let audio = timeline.add_track(Track::new("A1", ClipKind::Audio)).unwrap();
        timeline
            .add_clip(
                video,
                Clip::new("v", ClipKind::Video, FrameSpan::new(0, 12).unwrap())
                    .with_content(ClipContent::Solid { color: [1.0; 4] }),
            )
            .unwrap();
        timeline
            .add_clip(
                audio,
                Clip::new("a", ClipKind::Audio, FrameSpan::new(0, 6).unwrap()).with_content(ClipContent::Tone {
                    frequency: 440.0,
                    amplitude: 0.5,
                }),
            )
            .unwrap();
        let config = PlaybackConfig {
            width: 4,
            height: 4,
            ..Default::default()
        };
        EditorSession::new(timeline, &config, Arc::new(GeneratorFactory::new())).unwrap()
    }

    #[test]
    fn test_export_in_order() {
        let mut session = session();
        session.seek(3).unwrap();
        let mut pool = RenderPool::new(3).unwrap();
        let mut sink = Collect::default();
        let settings = ExportSettings {
            max_in_flight: 4,
            ..Default::default()
        };

        let report = export(&mut session, &mut pool, &mut sink, &settings, &CancelFlag::new()).unwrap();
        assert_eq!(sink.frames, (0..12).collect::<Vec<_>>());
        assert_eq!(sink.audio_frames.len(), 12);
        assert!(sink.finished);
        assert_eq!(report.frames_requested, 12);
        assert_eq!(report.frames_completed, 12);
        assert!(!report.cancelled);
        // 6 audible frames of 1600 stereo sample frames
        assert_eq!(report.audio_samples, 6 * 1600 * 2);
        assert_eq!(session.playhead(), 3);
        assert!(!session.history().can_undo());
    }

    #[test]
    fn test_cancel_between_frames() {
        let mut session = session();
        let mut pool = RenderPool::new(2).unwrap();
        let cancel = CancelFlag::new();
        let mut sink = Collect {
            cancel_after: Some((5, cancel.clone())),
            ..Default::default()
        };

        let report = export(&mut session, &mut pool, &mut sink, &ExportSettings::default(), &cancel).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.frames_completed, 5);
        assert_eq!(sink.frames, (0..5).collect::<Vec<_>>());
        assert_eq!(session.timeline().largest_frame_in_use(), 12);
    }

    #[test]
    fn test_empty_range_rejected() {
        let mut session = session();
        let mut pool = RenderPool::new(1).unwrap();
        let settings = ExportSettings {
            range: Some(FrameSpan::new(4, 0).unwrap()),
            ..Default::default()
        };
        let result = export(
            &mut session,
            &mut pool,
            &mut Collect::default(),
            &settings,
            &CancelFlag::new(),
        );
        assert!(matches!(result, Err(PlaybackError::InvalidRange { begin: 4, end: 4 })));
    }
}
