// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reading and writing timeline state.
//!
//! The on-disk form is a versioned RON document. Decoded state is checked
//! against every model invariant before it replaces anything.

use crate::error::{Result, TimelineError};
use crate::event::TimelineEvent;
use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current timeline document format version
pub const TIMELINE_FORMAT_VERSION: u32 = 1;

/// Conventional extension for timeline documents
pub const TIMELINE_FILE_EXTENSION: &str = "ordotl";

#[derive(Serialize)]
#[serde(rename = "TimelineDocument")]
struct DocumentRef<'a> {
    version: u32,
    timeline: &'a Timeline,
}

#[derive(Deserialize)]
#[serde(rename = "TimelineDocument")]
struct Document {
    version: u32,
    timeline: Timeline,
}

impl Timeline {
    /// Serialize the whole model as a RON document
    pub fn write_state(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let document = DocumentRef {
            version: TIMELINE_FORMAT_VERSION,
            timeline: self,
        };
        ron::ser::to_string_pretty(&document, config).map_err(|e| TimelineError::Serialization(e.to_string()))
    }

    /// Decode a document written by [`Timeline::write_state`].
    ///
    /// The result has passed invariant validation, has its clip back
    /// references restored and carries a single `Reloaded` event.
    pub fn read_state(text: &str) -> Result<Self> {
        let document: Document = ron::from_str(text).map_err(|e| TimelineError::Serialization(e.to_string()))?;

        if document.version > TIMELINE_FORMAT_VERSION {
            return Err(TimelineError::Serialization(format!(
                "Timeline version {} is newer than supported version {}",
                document.version, TIMELINE_FORMAT_VERSION
            )));
        }

        let mut timeline = document.timeline;
        timeline.validate()?;
        timeline.push_event(TimelineEvent::Reloaded);
        tracing::debug!(
            "Read timeline with {} tracks, last frame {}",
            timeline.tracks().len(),
            timeline.largest_frame_in_use()
        );
        Ok(timeline)
    }

    /// Write the document to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = self.write_state()?;
        std::fs::write(path, content)?;
        tracing::info!("Saved timeline to {}", path.display());
        Ok(())
    }

    /// Read a document from a file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let timeline = Self::read_state(&content)?;
        tracing::info!("Loaded timeline from {}", path.display());
        Ok(timeline)
    }
}
