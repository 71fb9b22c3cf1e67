// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in demo project.

use ordoplay_editor_timeline::{
    AutomationValue, CancelFlag, Clip, ClipContent, ClipKind, FrameSpan, InterpolationMode, Parameter, Result,
    Timeline, Track,
};

/// Length of the demo in frames
pub const DEMO_LENGTH: i64 = 90;

/// Build a three-second project: a fading title over a background cut in
/// two, plus a tone with a volume swell
pub fn build_demo_timeline() -> Result<Timeline> {
    let mut timeline = Timeline::new(30.0);
    timeline
        .automation_mut()?
        .sequence_mut(Parameter::BackgroundColor)?
        .set_override_value(AutomationValue::Color([0.05, 0.05, 0.08, 1.0]))?;

    let titles = timeline.add_track(Track::new("Titles", ClipKind::Video))?;
    let background = timeline.add_track(Track::new("Background", ClipKind::Video))?;
    let music = timeline.add_track(Track::new("Music", ClipKind::Audio))?;

    let mut title = Clip::new("Title", ClipKind::Video, FrameSpan::new(15, 60)?).with_content(ClipContent::Gradient {
        top: [1.0, 0.8, 0.2, 1.0],
        bottom: [0.9, 0.3, 0.1, 1.0],
    });
    {
        let automation = title.automation_mut()?;
        let opacity = automation.sequence_mut(Parameter::Opacity)?;
        opacity.set_mode(InterpolationMode::Smooth);
        opacity.add_key_frame(0, AutomationValue::Double(0.0))?;
        opacity.add_key_frame(15, AutomationValue::Double(1.0))?;
        opacity.add_key_frame(45, AutomationValue::Double(1.0))?;
        opacity.add_key_frame(59, AutomationValue::Double(0.0))?;

        let scale = automation.sequence_mut(Parameter::MediaScale)?;
        scale.set_override_value(AutomationValue::Vec2([0.5, 0.25]))?;

        let position = automation.sequence_mut(Parameter::MediaPosition)?;
        position.add_key_frame(0, AutomationValue::Vec2([0.0, 0.0]))?;
        position.add_key_frame(59, AutomationValue::Vec2([320.0, 270.0]))?;
    }
    timeline.add_clip(titles, title)?;

    let backdrop = Clip::new("Backdrop", ClipKind::Video, FrameSpan::new(0, DEMO_LENGTH)?)
        .with_content(ClipContent::Solid { color: [0.1, 0.2, 0.4, 1.0] });
    timeline.add_clip(background, backdrop)?;
    // The second half gets its own tint after the cut
    timeline.slice_at(DEMO_LENGTH / 2, &CancelFlag::new())?;
    if let Some(tail) = timeline
        .track(background)
        .and_then(|t| t.clips().last())
        .map(|c| c.id)
    {
        timeline
            .clip_mut(tail)?
            .automation_mut()?
            .sequence_mut(Parameter::Tint)?
            .set_override_value(AutomationValue::Color([1.0, 0.6, 0.6, 1.0]))?;
    }

    let mut tone = Clip::new("Tone", ClipKind::Audio, FrameSpan::new(0, DEMO_LENGTH)?).with_content(ClipContent::Tone {
        frequency: 440.0,
        amplitude: 0.25,
    });
    {
        let volume = tone.automation_mut()?.sequence_mut(Parameter::Volume)?;
        volume.add_key_frame(0, AutomationValue::Float(0.0))?;
        volume.add_key_frame(30, AutomationValue::Float(1.0))?;
    }
    timeline.add_clip(music, tone)?;

    // Drain construction events; the renderer starts from a clean slate
    timeline.take_events();
    Ok(timeline)
}
