// SPDX-License-Identifier: MIT OR Apache-2.0
//! Media sources for clips.
//!
//! A [`SourceFactory`] turns clip content into video contexts and audio
//! sources. [`GeneratorFactory`] covers the built-in generated content;
//! external media needs a host-provided factory with a decoder behind it.

use crate::audio::{AudioFormat, AudioSource};
use crate::frame::{FrameBuffer, RenderArea};
use crate::video::{ClipRenderInfo, PreparedFrame, VideoSourceContext};
use ordoplay_editor_timeline::{Clip, ClipContent, ClipKind, Interpolation};
use std::f64::consts::TAU;
use std::sync::Arc;

/// Creates per-clip media sources
pub trait SourceFactory: Send + Sync {
    /// Video context for a video clip, or `None` when the content cannot be shown
    fn video_context(&self, clip: &Clip) -> Option<Box<dyn VideoSourceContext>>;

    /// Audio source for an audio clip, or `None` when the content cannot be played
    fn audio_source(&self, clip: &Clip) -> Option<Arc<dyn AudioSource>>;
}

/// Factory for generated content: solid colors, gradients and sine tones
#[derive(Debug, Default, Clone, Copy)]
pub struct GeneratorFactory;

impl GeneratorFactory {
    /// Create a factory
    pub fn new() -> Self {
        Self
    }
}

impl SourceFactory for GeneratorFactory {
    fn video_context(&self, clip: &Clip) -> Option<Box<dyn VideoSourceContext>> {
        if clip.kind() != ClipKind::Video {
            return None;
        }
        match clip.content() {
            ClipContent::Solid { color } => Some(Box::new(GradientContext {
                top: *color,
                bottom: *color,
            })),
            ClipContent::Gradient { top, bottom } => Some(Box::new(GradientContext {
                top: *top,
                bottom: *bottom,
            })),
            ClipContent::Media { path } => {
                tracing::warn!("No decoder for '{}', clip '{}' renders empty", path.display(), clip.name);
                None
            }
            ClipContent::Empty | ClipContent::Tone { .. } => None,
        }
    }

    fn audio_source(&self, clip: &Clip) -> Option<Arc<dyn AudioSource>> {
        if clip.kind() != ClipKind::Audio {
            return None;
        }
        match clip.content() {
            ClipContent::Tone { frequency, amplitude } => Some(Arc::new(ToneSource {
                frequency: f64::from(*frequency),
                amplitude: *amplitude,
            })),
            ClipContent::Media { path } => {
                tracing::warn!("No decoder for '{}', clip '{}' is silent", path.display(), clip.name);
                None
            }
            _ => None,
        }
    }
}

/// Vertical two-color gradient; a solid color is a gradient with equal ends
struct GradientContext {
    top: [f32; 4],
    bottom: [f32; 4],
}

impl VideoSourceContext for GradientContext {
    fn prepare_render_frame(&mut self, info: &ClipRenderInfo) -> Option<Box<dyn PreparedFrame>> {
        let (width, height) = info.output_size;
        Some(Box::new(GradientFrame {
            top: self.top,
            bottom: self.bottom,
            width,
            height,
        }))
    }
}

struct GradientFrame {
    top: [f32; 4],
    bottom: [f32; 4],
    width: u32,
    height: u32,
}

impl PreparedFrame for GradientFrame {
    fn render_frame(self: Box<Self>, target: &mut FrameBuffer, area: &mut RenderArea) {
        let Some((x0, y0, x1, y1)) = area.pixel_bounds(self.width, self.height, target) else {
            return;
        };
        // Rows are placed on the whole layer so a partly off-screen layer
        // shows the matching slice of the gradient
        let (_, top, _, bottom) = area.layer_bounds(self.width, self.height);
        let rows = bottom - top;
        for y in y0..y1 {
            let t = if rows > 1 {
                (i64::from(y) - top) as f32 / (rows - 1) as f32
            } else {
                0.0
            };
            let color = area.tinted(Interpolation::lerp_vec4(self.top, self.bottom, t));
            for x in x0..x1 {
                target.blend_over(x, y, color, area.opacity);
            }
        }
        area.pixels_written += ((x1 - x0) * (y1 - y0)) as usize;
    }
}

/// Sine tone written to every channel
#[derive(Debug, Clone, Copy)]
struct ToneSource {
    frequency: f64,
    amplitude: f32,
}

impl AudioSource for ToneSource {
    fn produce(&self, offset_samples: i64, dest: &mut [f32], format: &AudioFormat) -> usize {
        let channels = usize::from(format.channels.max(1));
        let rate = f64::from(format.sample_rate.max(1));
        let mut frames = 0;
        for (i, frame) in dest.chunks_exact_mut(channels).enumerate() {
            let n = offset_samples + i as i64;
            let sample = (TAU * self.frequency * n as f64 / rate).sin() as f32 * self.amplitude;
            frame.fill(sample);
            frames += 1;
        }
        frames * channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordoplay_editor_timeline::{ClipId, FrameSpan};

    fn info(size: (u32, u32)) -> ClipRenderInfo {
        ClipRenderInfo {
            clip: ClipId::new(),
            frame: 0,
            relative_frame: 0,
            source_frame: 0,
            duration: 10,
            output_size: size,
        }
    }

    #[test]
    fn test_gradient_rows() {
        let clip = Clip::new("g", ClipKind::Video, FrameSpan::new(0, 10).unwrap()).with_content(ClipContent::Gradient {
            top: [0.0, 0.0, 0.0, 1.0],
            bottom: [1.0, 1.0, 1.0, 1.0],
        });
        let mut context = GeneratorFactory::new().video_context(&clip).unwrap();
        let prepared = context.prepare_render_frame(&info((2, 3))).unwrap();

        let mut target = FrameBuffer::new(2, 3);
        let mut area = RenderArea::default();
        prepared.render_frame(&mut target, &mut area);
        assert_eq!(area.pixels_written, 6);
        assert_eq!(target.pixel(0, 0), Some([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(target.pixel(1, 1), Some([0.5, 0.5, 0.5, 1.0]));
        assert_eq!(target.pixel(1, 2), Some([1.0, 1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_gradient_clipped_at_top_keeps_its_slope() {
        let clip = Clip::new("g", ClipKind::Video, FrameSpan::new(0, 10).unwrap()).with_content(ClipContent::Gradient {
            top: [0.0, 0.0, 0.0, 1.0],
            bottom: [1.0, 1.0, 1.0, 1.0],
        });
        let mut context = GeneratorFactory::new().video_context(&clip).unwrap();
        let prepared = context.prepare_render_frame(&info((1, 5))).unwrap();

        let mut target = FrameBuffer::new(1, 3);
        let mut area = RenderArea {
            origin: [0.0, -2.0],
            ..Default::default()
        };
        prepared.render_frame(&mut target, &mut area);
        assert_eq!(area.pixels_written, 3);
        assert_eq!(target.pixel(0, 0), Some([0.5, 0.5, 0.5, 1.0]));
        assert_eq!(target.pixel(0, 1), Some([0.75, 0.75, 0.75, 1.0]));
        assert_eq!(target.pixel(0, 2), Some([1.0, 1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_offscreen_writes_nothing() {
        let clip = Clip::new("s", ClipKind::Video, FrameSpan::new(0, 10).unwrap())
            .with_content(ClipContent::Solid { color: [1.0; 4] });
        let mut context = GeneratorFactory::new().video_context(&clip).unwrap();
        let prepared = context.prepare_render_frame(&info((4, 4))).unwrap();

        let mut target = FrameBuffer::new(4, 4);
        let mut area = RenderArea {
            origin: [10.0, 0.0],
            ..Default::default()
        };
        prepared.render_frame(&mut target, &mut area);
        assert_eq!(area.pixels_written, 0);
    }

    #[test]
    fn test_tone_fills_all_channels() {
        let clip = Clip::new("t", ClipKind::Audio, FrameSpan::new(0, 10).unwrap()).with_content(ClipContent::Tone {
            frequency: 12_000.0,
            amplitude: 0.5,
        });
        let source = GeneratorFactory::new().audio_source(&clip).unwrap();
        let format = AudioFormat {
            sample_rate: 48_000,
            channels: 2,
            frame_rate: 30.0,
        };
        let mut dest = [0.0f32; 8];
        assert_eq!(source.produce(1, &mut dest, &format), 8);
        // quarter period per sample at 12 kHz / 48 kHz
        assert!((dest[0] - 0.5).abs() < 1e-6);
        assert_eq!(dest[0], dest[1]);
        assert!(dest[2].abs() < 1e-6);
    }

    #[test]
    fn test_media_and_kind_mismatch_yield_none() {
        let factory = GeneratorFactory::new();
        let media = Clip::new("m", ClipKind::Video, FrameSpan::new(0, 10).unwrap())
            .with_content(ClipContent::Media { path: "clip.mp4".into() });
        assert!(factory.video_context(&media).is_none());

        let tone_on_video = Clip::new("t", ClipKind::Video, FrameSpan::new(0, 10).unwrap()).with_content(
            ClipContent::Tone {
                frequency: 440.0,
                amplitude: 1.0,
            },
        );
        assert!(factory.video_context(&tone_on_video).is_none());
        assert!(factory.audio_source(&tone_on_video).is_none());
    }
}
