// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end playback: edit, evaluate, render, mix and export.

use ordoplay_editor_playback::{
    export, AudioFormat, AudioMixer, AudioSource, ClipRenderInfo, EditorSession, ExportSettings, FrameBuffer,
    FrameSink, GeneratorFactory, PlaybackConfig, PreparedFrame, RenderArea, RenderPool, RenderedFrame, Result,
    SourceFactory, VideoSourceContext,
};
use ordoplay_editor_timeline::{
    AutomationValue, CancelFlag, Clip, ClipContent, ClipKind, CutRequest, FrameSpan, Parameter, Timeline, Track,
};
use std::sync::Arc;

fn config() -> PlaybackConfig {
    PlaybackConfig {
        width: 2,
        height: 2,
        ..Default::default()
    }
}

/// Paints the source frame number into the red channel
struct FrameNumberFactory;

struct FrameNumberContext;

struct FrameNumberFrame {
    value: f32,
    size: (u32, u32),
}

impl SourceFactory for FrameNumberFactory {
    fn video_context(&self, _clip: &Clip) -> Option<Box<dyn VideoSourceContext>> {
        Some(Box::new(FrameNumberContext))
    }

    fn audio_source(&self, _clip: &Clip) -> Option<Arc<dyn AudioSource>> {
        None
    }
}

impl VideoSourceContext for FrameNumberContext {
    fn prepare_render_frame(&mut self, info: &ClipRenderInfo) -> Option<Box<dyn PreparedFrame>> {
        Some(Box::new(FrameNumberFrame {
            value: info.source_frame as f32 / 100.0,
            size: info.output_size,
        }))
    }
}

impl PreparedFrame for FrameNumberFrame {
    fn render_frame(self: Box<Self>, target: &mut FrameBuffer, area: &mut RenderArea) {
        let Some((x0, y0, x1, y1)) = area.pixel_bounds(self.size.0, self.size.1, target) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                target.blend_over(x, y, [self.value, 0.0, 0.0, 1.0], area.opacity);
            }
        }
        area.pixels_written += ((x1 - x0) * (y1 - y0)) as usize;
    }
}

#[derive(Default)]
struct Frames(Vec<RenderedFrame>);

impl FrameSink for Frames {
    fn write_frame(&mut self, frame: &RenderedFrame) -> Result<()> {
        self.0.push(frame.clone());
        Ok(())
    }
}

#[test]
fn split_clip_keeps_source_frames_continuous() {
    let mut timeline = Timeline::default();
    let track = timeline.add_track(Track::new("V1", ClipKind::Video)).unwrap();
    let mut session = EditorSession::new(timeline, &config(), Arc::new(FrameNumberFactory)).unwrap();

    let clip = session
        .edit("Add clip", |t| {
            t.add_clip(track, Clip::new("shot", ClipKind::Video, FrameSpan::new(0, 10).unwrap()))
        })
        .unwrap();
    session
        .edit("Cut middle", |t| {
            t.apply_cuts(&[CutRequest::remove(clip, FrameSpan::new(4, 2).unwrap())], &CancelFlag::new())
        })
        .unwrap();

    let mut pool = RenderPool::new(2).unwrap();
    let mut sink = Frames::default();
    let settings = ExportSettings {
        audio: false,
        ..Default::default()
    };
    let report = export(&mut session, &mut pool, &mut sink, &settings, &CancelFlag::new()).unwrap();
    assert_eq!(report.frames_completed, 10);

    let red: Vec<Option<f32>> = sink
        .0
        .iter()
        .map(|f| (f.layers_drawn > 0).then(|| f.buffer.pixel(0, 0).map_or(0.0, |p| p[0])))
        .collect();
    assert_eq!(red[3], Some(0.03));
    assert_eq!(red[4], None);
    assert_eq!(red[5], None);
    // the tail plays the source frame it showed before the cut
    assert_eq!(red[6], Some(0.06));
    assert_eq!(red[9], Some(0.09));
}

#[test]
fn opacity_ramp_renders_through_pool() {
    let mut timeline = Timeline::default();
    let track = timeline.add_track(Track::new("V1", ClipKind::Video)).unwrap();
    let mut clip = Clip::new("fade", ClipKind::Video, FrameSpan::new(0, 5).unwrap())
        .with_content(ClipContent::Solid { color: [1.0, 1.0, 1.0, 1.0] });
    let opacity = clip.automation_mut().unwrap().sequence_mut(Parameter::Opacity).unwrap();
    opacity.add_key_frame(0, AutomationValue::Double(0.0)).unwrap();
    opacity.add_key_frame(4, AutomationValue::Double(1.0)).unwrap();
    timeline.add_clip(track, clip).unwrap();

    let mut session = EditorSession::new(timeline, &config(), Arc::new(GeneratorFactory::new())).unwrap();
    let mut pool = RenderPool::new(2).unwrap();
    let mut sink = Frames::default();
    export(&mut session, &mut pool, &mut sink, &ExportSettings::default(), &CancelFlag::new()).unwrap();

    let greys: Vec<f32> = sink.0.iter().map(|f| f.buffer.pixel(1, 1).map_or(-1.0, |p| p[0])).collect();
    assert_eq!(greys, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
}

#[test]
fn audio_thread_reads_published_graph() {
    let mut timeline = Timeline::default();
    let track = timeline.add_track(Track::new("A1", ClipKind::Audio)).unwrap();
    timeline
        .add_clip(
            track,
            Clip::new("tone", ClipKind::Audio, FrameSpan::new(0, 30).unwrap()).with_content(ClipContent::Tone {
                frequency: 12_000.0,
                amplitude: 1.0,
            }),
        )
        .unwrap();
    let mut session = EditorSession::new(timeline, &config(), Arc::new(GeneratorFactory::new())).unwrap();
    session
        .edit("Halve master", |t| {
            t.automation_mut()?
                .sequence_mut(Parameter::MasterVolume)?
                .set_override_value(AutomationValue::Float(0.5))
        })
        .unwrap();

    let format = session.audio_format();
    let mut mixer = AudioMixer::new(session.audio_handle());
    let peak = std::thread::spawn(move || {
        let mut dest = vec![0.0f32; format.buffer_len(0)];
        mixer.mix(0, &mut dest, &format);
        dest.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    })
    .join()
    .unwrap();
    assert!((peak - 0.5).abs() < 1e-4, "peak {peak}");

    assert_eq!(format, AudioFormat {
        sample_rate: 48_000,
        channels: 2,
        frame_rate: 30.0,
    });
}
