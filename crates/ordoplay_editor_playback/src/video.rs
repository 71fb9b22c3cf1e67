// SPDX-License-Identifier: MIT OR Apache-2.0
//! Video prepare/render pipeline.
//!
//! Preparation runs on the thread that owns the timeline, right after the
//! automation pass for the frame. It reads clip spans and live parameter
//! values and packs everything a render thread needs into a [`FramePlan`].
//! Rendering a plan touches no model state.

use crate::frame::{FrameBuffer, RenderArea};
use crate::sources::SourceFactory;
use ordoplay_editor_timeline::{Clip, ClipContent, ClipId, ClipKind, Parameter, Timeline};
use std::collections::HashMap;
use std::sync::Arc;

/// What a source context needs to prepare one clip frame
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRenderInfo {
    /// Clip being drawn
    pub clip: ClipId,
    /// Timeline frame
    pub frame: i64,
    /// Frame relative to the clip's begin
    pub relative_frame: i64,
    /// Source media frame, after media offset and automated frame offset
    pub source_frame: i64,
    /// Clip duration in frames
    pub duration: i64,
    /// Output size in pixels
    pub output_size: (u32, u32),
}

/// Per-clip source state, kept between frames.
///
/// Lives on the preparing thread; may cache decoders or generated images.
pub trait VideoSourceContext: Send {
    /// Prepare one frame. Returns `None` when there is nothing to draw.
    fn prepare_render_frame(&mut self, info: &ClipRenderInfo) -> Option<Box<dyn PreparedFrame>>;
}

/// A self-contained frame ready to be drawn on any thread
pub trait PreparedFrame: Send {
    /// Draw into `target` inside `area`, recording the pixels written
    fn render_frame(self: Box<Self>, target: &mut FrameBuffer, area: &mut RenderArea);
}

/// One prepared layer of a frame
pub struct LayerPlan {
    /// Source clip
    pub clip: ClipId,
    /// Placement and blending
    pub area: RenderArea,
    prepared: Box<dyn PreparedFrame>,
}

impl std::fmt::Debug for LayerPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerPlan")
            .field("clip", &self.clip)
            .field("area", &self.area)
            .finish_non_exhaustive()
    }
}

/// Everything needed to composite one frame, bottom layer first
#[derive(Debug)]
pub struct FramePlan {
    /// Timeline frame
    pub frame: i64,
    /// Output width
    pub width: u32,
    /// Output height
    pub height: u32,
    /// Clear color
    pub background: [f32; 4],
    /// Layers, bottom first
    pub layers: Vec<LayerPlan>,
}

/// A composited frame
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    /// Timeline frame
    pub frame: i64,
    /// Output image
    pub buffer: FrameBuffer,
    /// Layers that wrote at least one pixel
    pub layers_drawn: usize,
}

impl FramePlan {
    /// Composite the plan. Safe to call on any thread.
    pub fn render(self) -> RenderedFrame {
        let mut buffer = FrameBuffer::new(self.width, self.height);
        buffer.clear(self.background);
        let mut layers_drawn = 0;
        for layer in self.layers {
            let mut area = layer.area;
            layer.prepared.render_frame(&mut buffer, &mut area);
            if area.pixels_written > 0 {
                layers_drawn += 1;
            }
        }
        RenderedFrame {
            frame: self.frame,
            buffer,
            layers_drawn,
        }
    }
}

struct CachedContext {
    content: ClipContent,
    context: Option<Box<dyn VideoSourceContext>>,
}

/// Builds frame plans from an evaluated timeline.
///
/// Source contexts are created lazily per clip and dropped when the clip
/// leaves the timeline or its content changes.
pub struct VideoRenderer {
    width: u32,
    height: u32,
    factory: Arc<dyn SourceFactory>,
    contexts: HashMap<ClipId, CachedContext>,
}

impl VideoRenderer {
    /// Create a renderer producing `width` x `height` frames
    pub fn new(width: u32, height: u32, factory: Arc<dyn SourceFactory>) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            factory,
            contexts: HashMap::new(),
        }
    }

    /// Output size
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of live source contexts
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Prepare `frame` from the timeline's current live values.
    ///
    /// Call after the automation pass for the same frame. Track 0 is the
    /// top layer, so tracks are visited last to first.
    pub fn prepare_frame(&mut self, timeline: &Timeline, frame: i64) -> FramePlan {
        let background = timeline
            .automation()
            .color(Parameter::BackgroundColor)
            .unwrap_or([0.0, 0.0, 0.0, 1.0]);
        let mut plan = FramePlan {
            frame,
            width: self.width,
            height: self.height,
            background,
            layers: Vec::new(),
        };

        let mut clips: Vec<&Clip> = Vec::new();
        for track in timeline.tracks().iter().rev() {
            if track.kind() != ClipKind::Video || track.muted {
                continue;
            }
            let track_opacity = track.automation().double(Parameter::TrackOpacity).unwrap_or(1.0);
            clips.clear();
            if track.extract_clips_at(&mut clips, frame) == 0 {
                continue;
            }
            for clip in &clips {
                if let Some(layer) = self.prepare_layer(clip, frame, track_opacity) {
                    plan.layers.push(layer);
                }
            }
        }

        tracing::trace!("Prepared frame {} with {} layers", frame, plan.layers.len());
        plan
    }

    /// Drop contexts of clips no longer on the timeline
    pub fn retain_clips(&mut self, timeline: &Timeline) {
        let before = self.contexts.len();
        self.contexts.retain(|id, _| timeline.clip(*id).is_some());
        let dropped = before - self.contexts.len();
        if dropped > 0 {
            tracing::debug!("Dropped {dropped} video source contexts");
        }
    }

    fn prepare_layer(&mut self, clip: &Clip, frame: i64, track_opacity: f64) -> Option<LayerPlan> {
        if clip.is_muted() {
            return None;
        }
        let automation = clip.automation();
        let opacity = automation.double(Parameter::Opacity).unwrap_or(1.0) * track_opacity;
        if opacity <= 0.0 {
            return None;
        }

        let factory = &self.factory;
        let cached = self.contexts.entry(clip.id).or_insert_with(|| CachedContext {
            content: clip.content().clone(),
            context: factory.video_context(clip),
        });
        if cached.content != *clip.content() {
            cached.content = clip.content().clone();
            cached.context = factory.video_context(clip);
        }
        let context = cached.context.as_mut()?;

        let info = ClipRenderInfo {
            clip: clip.id,
            frame,
            relative_frame: clip.relative_frame(frame),
            source_frame: clip.source_frame(frame),
            duration: clip.span().duration(),
            output_size: (self.width, self.height),
        };
        let prepared = context.prepare_render_frame(&info)?;

        let area = RenderArea {
            origin: automation.vec2(Parameter::MediaPosition).unwrap_or([0.0, 0.0]),
            scale: automation.vec2(Parameter::MediaScale).unwrap_or([1.0, 1.0]),
            opacity: opacity.clamp(0.0, 1.0) as f32,
            tint: automation.color(Parameter::Tint).unwrap_or([1.0; 4]),
            pixels_written: 0,
        };
        Some(LayerPlan {
            clip: clip.id,
            area,
            prepared,
        })
    }
}
