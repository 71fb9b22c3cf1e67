// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` Render - headless timeline renderer
//!
//! Loads a timeline document (or builds a demo project), evaluates every
//! frame and writes a PNG sequence plus raw interleaved audio.
//!
//! ## Logging
//!
//! `RUST_LOG` wins over the config file's `log_filter`; without either the
//! filter is `ordoplay=info`.

mod cli;
mod demo;
mod sink;

use clap::Parser;
use cli::Args;
use ordoplay_editor_playback::{
    export, EditorSession, ExportSettings, GeneratorFactory, PlaybackConfig, PlaybackError, RenderPool, Result,
};
use ordoplay_editor_timeline::{CancelFlag, FrameSpan};
use sink::PngSequenceSink;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "ordoplay=info";

fn main() {
    let args = Args::parse();

    let config = args.config.as_deref().map(PlaybackConfig::load).transpose();
    let filter = match &config {
        Ok(Some(config)) => config.log_filter.as_deref(),
        _ => None,
    };
    init_logging(filter);

    let mut config = match config {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            tracing::error!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };
    args.apply_overrides(&mut config);

    tracing::info!("Starting OrdoPlay Render v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, &config) {
        tracing::error!("Render failed: {e}");
        std::process::exit(1);
    }
}

fn init_logging(config_filter: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config_filter.unwrap_or(DEFAULT_LOG_FILTER)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run(args: &Args, config: &PlaybackConfig) -> Result<()> {
    let factory = Arc::new(GeneratorFactory::new());

    let mut session = match &args.project {
        Some(path) => EditorSession::open(path, config, factory)?,
        None => {
            let timeline = demo::build_demo_timeline()?;
            if let Some(path) = &args.save_demo {
                timeline.save_to(path)?;
                return Ok(());
            }
            tracing::info!("No timeline given, rendering the demo project");
            EditorSession::new(timeline, config, factory)?
        }
    };

    let range = match (args.start, args.end) {
        (None, None) => None,
        (start, end) => {
            let begin = start.unwrap_or(0);
            let end = end.unwrap_or_else(|| session.timeline().largest_frame_in_use());
            let span = FrameSpan::from_range(begin, end).map_err(|_| PlaybackError::InvalidRange { begin, end })?;
            Some(span)
        }
    };
    let settings = ExportSettings {
        range,
        max_in_flight: config.max_frames_in_flight,
        audio: !args.no_audio,
    };

    let mut pool = RenderPool::new(config.render_threads)?;
    let mut sink = PngSequenceSink::new(&args.output)?;
    let report = export(&mut session, &mut pool, &mut sink, &settings, &CancelFlag::new())?;

    if let Some(path) = &args.report {
        sink::write_report(path, &report)?;
    }
    Ok(())
}
