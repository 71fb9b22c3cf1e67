// SPDX-License-Identifier: MIT OR Apache-2.0
//! PNG sequence output.

use ordoplay_editor_playback::{AudioFormat, ExportReport, FrameSink, PlaybackError, RenderedFrame, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Name of the raw audio file written next to the frames
pub const AUDIO_FILE_NAME: &str = "audio.f32le";

/// Writes `frame_NNNNN.png` files and one interleaved little-endian `f32`
/// audio file into a directory
pub struct PngSequenceSink {
    dir: PathBuf,
    audio: Option<BufWriter<File>>,
    frames_written: usize,
}

impl PngSequenceSink {
    /// Create the output directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            audio: None,
            frames_written: 0,
        })
    }

    /// Path of the PNG for `frame`
    pub fn frame_path(&self, frame: i64) -> PathBuf {
        self.dir.join(format!("frame_{frame:05}.png"))
    }
}

impl FrameSink for PngSequenceSink {
    fn write_frame(&mut self, frame: &RenderedFrame) -> Result<()> {
        let buffer = &frame.buffer;
        let img = image::RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.to_rgba8())
            .ok_or_else(|| PlaybackError::Sink(format!("frame {} has a malformed buffer", frame.frame)))?;
        let path = self.frame_path(frame.frame);
        img.save(&path)
            .map_err(|e| PlaybackError::Sink(format!("{}: {e}", path.display())))?;
        self.frames_written += 1;
        tracing::trace!("Wrote {}", path.display());
        Ok(())
    }

    fn write_audio(&mut self, _frame: i64, samples: &[f32], _format: &AudioFormat) -> Result<()> {
        let writer = match self.audio.take() {
            Some(writer) => writer,
            None => BufWriter::new(File::create(self.dir.join(AUDIO_FILE_NAME))?),
        };
        let writer = self.audio.insert(writer);
        for sample in samples {
            writer.write_all(&sample.to_le_bytes())?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.audio.take() {
            writer.flush()?;
        }
        tracing::info!("Wrote {} frames to {}", self.frames_written, self.dir.display());
        Ok(())
    }
}

/// Write an export report as pretty JSON
pub fn write_report(path: &Path, report: &ExportReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(|e| PlaybackError::Sink(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordoplay_editor_playback::FrameBuffer;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ordoplay-render-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_png_round_trip() {
        let dir = temp_dir("png");
        let mut sink = PngSequenceSink::new(&dir).unwrap();
        let mut buffer = FrameBuffer::new(3, 2);
        buffer.clear([1.0, 0.0, 0.0, 1.0]);
        sink.write_frame(&RenderedFrame {
            frame: 7,
            buffer,
            layers_drawn: 1,
        })
        .unwrap();
        sink.write_audio(7, &[0.25, -0.25], &AudioFormat::default()).unwrap();
        sink.finish().unwrap();

        let img = image::open(sink.frame_path(7)).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 1).0, [255, 0, 0, 255]);
        assert_eq!(std::fs::metadata(dir.join(AUDIO_FILE_NAME)).unwrap().len(), 8);
        assert_eq!(sink.frames_written, 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_report_json() {
        let dir = temp_dir("report");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("report.json");
        let report = ExportReport {
            frames_requested: 10,
            frames_completed: 4,
            cancelled: true,
            ..Default::default()
        };
        write_report(&path, &report).unwrap();
        let loaded: ExportReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);
        std::fs::remove_dir_all(&dir).ok();
    }
}
