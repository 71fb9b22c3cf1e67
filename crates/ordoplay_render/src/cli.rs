// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line arguments.

use clap::Parser;
use ordoplay_editor_playback::PlaybackConfig;
use std::path::PathBuf;

/// Render an `OrdoPlay` timeline to a PNG sequence
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Timeline document to render; a demo project is used when omitted
    #[arg(value_name = "TIMELINE")]
    pub project: Option<PathBuf>,

    /// Output directory for frames
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = "frames")]
    pub output: PathBuf,

    /// Playback config file (RON)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// First frame to render
    #[arg(long = "start", value_name = "N")]
    pub start: Option<i64>,

    /// End frame (exclusive)
    #[arg(long = "end", value_name = "N")]
    pub end: Option<i64>,

    /// Render worker threads
    #[arg(short = 'j', long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Output width
    #[arg(long = "width", value_name = "PX")]
    pub width: Option<u32>,

    /// Output height
    #[arg(long = "height", value_name = "PX")]
    pub height: Option<u32>,

    /// Skip audio mixing
    #[arg(long = "no-audio")]
    pub no_audio: bool,

    /// Write the demo project to this file and exit
    #[arg(long = "save-demo", value_name = "FILE")]
    pub save_demo: Option<PathBuf>,

    /// Write a JSON export report
    #[arg(long = "report", value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl Args {
    /// Apply command line overrides on top of a loaded config
    pub fn apply_overrides(&self, config: &mut PlaybackConfig) {
        if let Some(threads) = self.threads {
            config.render_threads = threads;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
    }
}
