// SPDX-License-Identifier: MIT OR Apache-2.0
//! Audio produce and mix.
//!
//! The editing thread captures an [`AudioGraph`] from the evaluated timeline
//! and publishes it through an [`AudioGraphHandle`]. The audio callback only
//! clones the current `Arc<AudioGraph>`; it never touches the timeline and
//! never waits on an edit.

use crate::sources::SourceFactory;
use ordoplay_editor_timeline::{Clip, ClipContent, ClipId, ClipKind, FrameSpan, Parameter, Timeline, TrackId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Sample layout of produced audio. Samples are interleaved `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Samples per second, per channel
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
    /// Timeline frames per second
    pub frame_rate: f64,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            frame_rate: 30.0,
        }
    }
}

impl AudioFormat {
    /// First sample frame belonging to timeline `frame`
    pub fn frame_to_sample(&self, frame: i64) -> i64 {
        if self.frame_rate <= 0.0 {
            return 0;
        }
        (frame as f64 * f64::from(self.sample_rate) / self.frame_rate).round() as i64
    }

    /// Sample frames covered by timeline `frame`
    pub fn samples_in_frame(&self, frame: i64) -> usize {
        (self.frame_to_sample(frame + 1) - self.frame_to_sample(frame)).max(0) as usize
    }

    /// Interleaved buffer length needed for timeline `frame`
    pub fn buffer_len(&self, frame: i64) -> usize {
        self.samples_in_frame(frame) * usize::from(self.channels)
    }
}

/// Something that writes sound for a clip.
///
/// Called from the audio thread; implementations must not block.
pub trait AudioSource: Send + Sync {
    /// Write interleaved samples starting `offset_samples` sample frames into
    /// the source. Returns the number of `f32` values written from the start
    /// of `dest`.
    fn produce(&self, offset_samples: i64, dest: &mut [f32], format: &AudioFormat) -> usize;
}

/// Captured state of one audio clip
#[derive(Clone)]
pub struct AudioClipState {
    /// Source clip
    pub clip: ClipId,
    /// Span on the timeline
    pub span: FrameSpan,
    /// Source frame played at the clip's first frame
    pub source_origin: i64,
    /// Clip gain
    pub gain: f32,
    /// Sample producer
    pub source: Arc<dyn AudioSource>,
}

impl std::fmt::Debug for AudioClipState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioClipState")
            .field("clip", &self.clip)
            .field("span", &self.span)
            .field("source_origin", &self.source_origin)
            .field("gain", &self.gain)
            .finish_non_exhaustive()
    }
}

impl AudioClipState {
    fn offset_samples(&self, timeline_frame: i64, format: &AudioFormat) -> i64 {
        let source_frame = self.source_origin + (timeline_frame - self.span.begin());
        format.frame_to_sample(source_frame)
    }
}

/// Captured state of one audio track
#[derive(Debug, Clone)]
pub struct AudioTrack {
    /// Source track
    pub track: TrackId,
    /// Track gain
    pub gain: f32,
    /// Playable clips in frame order
    pub clips: Vec<AudioClipState>,
}

impl AudioTrack {
    /// Produce one timeline frame of audio into `dest`.
    ///
    /// `dest` is cleared first. Every clip containing `timeline_frame` writes
    /// into it; the result is the largest count any clip wrote. Clips on one
    /// track never overlap, so at most one clip should produce.
    pub fn produce(&self, timeline_frame: i64, dest: &mut [f32], format: &AudioFormat) -> usize {
        dest.fill(0.0);
        let mut written = 0;
        let mut producers = 0;
        for clip in self.clips.iter().filter(|c| c.span.contains(timeline_frame)) {
            let offset = clip.offset_samples(timeline_frame, format);
            let count = clip.source.produce(offset, dest, format).min(dest.len());
            let gain = clip.gain * self.gain;
            for sample in &mut dest[..count] {
                *sample *= gain;
            }
            if count > 0 {
                producers += 1;
            }
            written = written.max(count);
        }
        if producers > 1 {
            tracing::warn!(
                "Track {:?} has {producers} overlapping clips at frame {timeline_frame}",
                self.track
            );
            debug_assert!(producers <= 1, "overlapping clips on one audio track");
        }
        written
    }
}

/// Caches audio sources per clip between captures
pub struct AudioSources {
    factory: Arc<dyn SourceFactory>,
    sources: HashMap<ClipId, (ClipContent, Option<Arc<dyn AudioSource>>)>,
}

impl AudioSources {
    /// Create an empty cache over `factory`
    pub fn new(factory: Arc<dyn SourceFactory>) -> Self {
        Self {
            factory,
            sources: HashMap::new(),
        }
    }

    /// Source for `clip`, created on first use and refreshed when its content changes
    pub fn source_for(&mut self, clip: &Clip) -> Option<Arc<dyn AudioSource>> {
        let factory = &self.factory;
        let entry = self
            .sources
            .entry(clip.id)
            .or_insert_with(|| (clip.content().clone(), factory.audio_source(clip)));
        if entry.0 != *clip.content() {
            *entry = (clip.content().clone(), factory.audio_source(clip));
        }
        entry.1.clone()
    }

    /// Drop sources of clips no longer on the timeline
    pub fn retain_clips(&mut self, timeline: &Timeline) {
        self.sources.retain(|id, _| timeline.clip(*id).is_some());
    }

    /// Number of cached sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Immutable snapshot of everything the audio thread plays
#[derive(Debug, Clone)]
pub struct AudioGraph {
    /// Audible tracks, in timeline order
    pub tracks: Vec<AudioTrack>,
    /// Gain applied to the summed mix
    pub master_volume: f32,
}

impl Default for AudioGraph {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            master_volume: 1.0,
        }
    }
}

impl AudioGraph {
    /// Capture the audible part of an evaluated timeline.
    ///
    /// Muted tracks, muted clips and clips without a source are left out.
    pub fn capture(timeline: &Timeline, sources: &mut AudioSources) -> Self {
        let master_volume = timeline.automation().float(Parameter::MasterVolume).unwrap_or(1.0);
        let mut tracks = Vec::new();
        for track in timeline.tracks() {
            if track.kind() != ClipKind::Audio || track.muted {
                continue;
            }
            let clips: Vec<AudioClipState> = track
                .clips()
                .iter()
                .filter(|clip| !clip.is_muted())
                .filter_map(|clip| {
                    let source = sources.source_for(clip)?;
                    Some(AudioClipState {
                        clip: clip.id,
                        span: clip.span(),
                        source_origin: clip.source_frame(clip.span().begin()),
                        gain: clip.automation().float(Parameter::Volume).unwrap_or(1.0),
                        source,
                    })
                })
                .collect();
            if clips.is_empty() {
                continue;
            }
            tracks.push(AudioTrack {
                track: track.id,
                gain: track.automation().float(Parameter::TrackVolume).unwrap_or(1.0),
                clips,
            });
        }
        Self { tracks, master_volume }
    }

    /// Sum all tracks for `timeline_frame` into `dest`, scaled by the master
    /// volume and clamped to `[-1, 1]`. `scratch` is reused between calls.
    ///
    /// Returns the largest count any track wrote.
    pub fn mix(&self, timeline_frame: i64, dest: &mut [f32], scratch: &mut Vec<f32>, format: &AudioFormat) -> usize {
        dest.fill(0.0);
        scratch.resize(dest.len(), 0.0);
        let mut written = 0;
        for track in &self.tracks {
            let count = track.produce(timeline_frame, scratch, format);
            for (out, sample) in dest.iter_mut().zip(&scratch[..count]) {
                *out += *sample;
            }
            written = written.max(count);
        }
        for sample in &mut dest[..written] {
            *sample = (*sample * self.master_volume).clamp(-1.0, 1.0);
        }
        written
    }
}

/// Shared slot holding the latest published [`AudioGraph`]
#[derive(Debug, Clone, Default)]
pub struct AudioGraphHandle {
    current: Arc<RwLock<Arc<AudioGraph>>>,
}

impl AudioGraphHandle {
    /// Create a handle holding an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current graph
    pub fn publish(&self, graph: AudioGraph) {
        *self.current.write() = Arc::new(graph);
    }

    /// Current graph; holds the lock only for an `Arc` clone
    pub fn snapshot(&self) -> Arc<AudioGraph> {
        Arc::clone(&self.current.read())
    }
}

/// Audio-thread side of a handle, owning its scratch buffer
#[derive(Debug, Default)]
pub struct AudioMixer {
    handle: AudioGraphHandle,
    scratch: Vec<f32>,
}

impl AudioMixer {
    /// Create a mixer reading from `handle`
    pub fn new(handle: AudioGraphHandle) -> Self {
        Self {
            handle,
            scratch: Vec::new(),
        }
    }

    /// Mix one timeline frame from the latest graph
    pub fn mix(&mut self, timeline_frame: i64, dest: &mut [f32], format: &AudioFormat) -> usize {
        let graph = self.handle.snapshot();
        graph.mix(timeline_frame, dest, &mut self.scratch, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::GeneratorFactory;
    use ordoplay_editor_timeline::{AutomationValue, Track};

    /// Writes the requested offset into every sample
    struct OffsetSource;

    impl AudioSource for OffsetSource {
        fn produce(&self, offset_samples: i64, dest: &mut [f32], _format: &AudioFormat) -> usize {
            dest.fill(offset_samples as f32);
            dest.len()
        }
    }

    struct Constant(f32);

    impl AudioSource for Constant {
        fn produce(&self, _offset_samples: i64, dest: &mut [f32], _format: &AudioFormat) -> usize {
            dest.fill(self.0);
            dest.len()
        }
    }

    fn format() -> AudioFormat {
        AudioFormat {
            sample_rate: 300,
            channels: 1,
            frame_rate: 30.0,
        }
    }

    fn clip_state(begin: i64, duration: i64, origin: i64, source: Arc<dyn AudioSource>) -> AudioClipState {
        AudioClipState {
            clip: ClipId::new(),
            span: FrameSpan::new(begin, duration).unwrap(),
            source_origin: origin,
            gain: 1.0,
            source,
        }
    }

    #[test]
    fn test_sample_math() {
        let format = AudioFormat {
            sample_rate: 44_100,
            channels: 2,
            frame_rate: 30.0,
        };
        assert_eq!(format.frame_to_sample(1), 1470);
        assert_eq!(format.samples_in_frame(7), 1470);
        assert_eq!(format.buffer_len(0), 2940);
    }

    #[test]
    fn test_track_produce_offsets() {
        let track = AudioTrack {
            track: TrackId::new(),
            gain: 1.0,
            clips: vec![clip_state(10, 10, 100, Arc::new(OffsetSource))],
        };
        let mut dest = [0.0f32; 10];

        // frame 12 is two frames into the clip, source frame 102
        assert_eq!(track.produce(12, &mut dest, &format()), 10);
        assert_eq!(dest[0], 1020.0);

        dest.fill(5.0);
        assert_eq!(track.produce(20, &mut dest, &format()), 0);
        assert!(dest.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_mix_sums_and_clamps() {
        let mut graph = AudioGraph {
            tracks: vec![
                AudioTrack {
                    track: TrackId::new(),
                    gain: 0.5,
                    clips: vec![clip_state(0, 10, 0, Arc::new(Constant(0.5)))],
                },
                AudioTrack {
                    track: TrackId::new(),
                    gain: 1.0,
                    clips: vec![clip_state(0, 10, 0, Arc::new(Constant(0.25)))],
                },
            ],
            master_volume: 2.0,
        };
        let mut dest = [0.0f32; 10];
        let mut scratch = Vec::new();
        assert_eq!(graph.mix(3, &mut dest, &mut scratch, &format()), 10);
        assert_eq!(dest[0], 1.0);

        graph.master_volume = 4.0;
        graph.mix(3, &mut dest, &mut scratch, &format());
        assert_eq!(dest[9], 1.0);

        graph.master_volume = 1.0;
        graph.mix(3, &mut dest, &mut scratch, &format());
        assert_eq!(dest[9], 0.5);
    }

    #[test]
    fn test_capture_skips_muted() {
        let mut timeline = Timeline::default();
        let loud = timeline.add_track(Track::new("A1", ClipKind::Audio)).unwrap();
        let quiet = timeline.add_track(Track::new("A2", ClipKind::Audio)).unwrap();
        let tone = ClipContent::Tone {
            frequency: 440.0,
            amplitude: 1.0,
        };
        let span = FrameSpan::new(0, 30).unwrap();
        timeline
            .add_clip(loud, Clip::new("a", ClipKind::Audio, span).with_content(tone.clone()))
            .unwrap();
        let muted_clip = Clip::new("b", ClipKind::Audio, span.offset(30).unwrap()).with_content(tone.clone());
        let muted_id = timeline.add_clip(loud, muted_clip).unwrap();
        timeline
            .clip_mut(muted_id)
            .unwrap()
            .automation_mut()
            .unwrap()
            .sequence_mut(Parameter::Muted)
            .unwrap()
            .set_override_value(AutomationValue::Bool(true))
            .unwrap();
        timeline
            .add_clip(quiet, Clip::new("c", ClipKind::Audio, span).with_content(tone))
            .unwrap();
        timeline.track_mut(quiet).unwrap().muted = true;

        let mut sources = AudioSources::new(Arc::new(GeneratorFactory::new()));
        let graph = AudioGraph::capture(&timeline, &mut sources);
        assert_eq!(graph.tracks.len(), 1);
        assert_eq!(graph.tracks[0].track, loud);
        assert_eq!(graph.tracks[0].clips.len(), 1);
        assert_eq!(graph.master_volume, 1.0);
    }

    #[test]
    fn test_handle_publish() {
        let handle = AudioGraphHandle::new();
        let mut mixer = AudioMixer::new(handle.clone());
        let mut dest = [1.0f32; 4];
        assert_eq!(mixer.mix(0, &mut dest, &format()), 0);
        assert_eq!(dest, [0.0; 4]);

        handle.publish(AudioGraph {
            tracks: vec![AudioTrack {
                track: TrackId::new(),
                gain: 1.0,
                clips: vec![clip_state(0, 1, 0, Arc::new(Constant(0.5)))],
            }],
            master_volume: 1.0,
        });
        assert_eq!(mixer.mix(0, &mut dest, &format()), 4);
        assert_eq!(dest, [0.5; 4]);
    }
}
