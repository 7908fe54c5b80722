//! Application entry point — command-line panel narrator.
//!
//! Reads newline-delimited JSON events (`{"event": ..., "data": ...}`) from
//! the file named on the command line, or from stdin, and narrates the story
//! through simulated sinks.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime.
//! 4. Build the narration and music sinks.
//! 5. Spawn the playback orchestrator.
//! 6. Feed every input line through [`EventIngest`].
//! 7. Wait for the story to end (or Ctrl-C), then shut down.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use panel_narrator::{
    audio::SimulatedSink,
    config::AppConfig,
    ingest::{EventIngest, IngestOutcome},
    panel::PanelQueue,
    playback::{Orchestrator, PlaybackControls, PlaybackEvent},
};

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Panel narrator starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(run(config, std::env::args().nth(1)))
}

async fn run(config: AppConfig, input: Option<String>) -> Result<()> {
    // 4. Sinks
    let clip = Duration::from_millis(config.simulation.clip_ms);
    let load = Duration::from_millis(config.simulation.load_ms);
    let narration = Arc::new(SimulatedSink::new("narration", clip, load));
    let music = Arc::new(SimulatedSink::new("music", clip, load));

    // 5. Orchestrator
    let queue = PanelQueue::new();
    let orchestrator = Orchestrator::new(&config.playback, queue.clone(), narration, music);
    let controls = orchestrator.controls();
    let mut events = controls.events();
    let task = tokio::spawn(orchestrator.run());

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(PlaybackEvent::PanelChanged(n)) => log::info!("Now narrating panel {n}"),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!("Panel log fell behind by {skipped} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // 6. Ingest
    let ingest = EventIngest::new(&config.ingest, queue.clone(), controls.clone());
    match input {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("failed to open {path}"))?;
            feed(&ingest, BufReader::new(file)).await?;
        }
        None => feed(&ingest, BufReader::new(tokio::io::stdin())).await?,
    }

    // 7. Wait for the end
    log::info!("Input finished; panels received: {:?}", queue.panel_numbers());
    if queue.is_empty() {
        log::info!("No panels received; nothing to narrate");
    } else {
        wait_for_end(&controls).await;
    }

    controls.shutdown()?;
    task.await.context("orchestrator task panicked")?;
    log::info!("Panel narrator stopped");
    Ok(())
}

async fn feed<R>(ingest: &EventIngest<PlaybackControls>, reader: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match ingest.handle_json(line) {
            IngestOutcome::Queued { panel, .. } => log::debug!("Queued panel {panel}"),
            IngestOutcome::Progress(message) => log::info!("{message}"),
            IngestOutcome::Rejected(_) | IngestOutcome::Ignored => {}
        }
    }
    Ok(())
}

async fn wait_for_end(controls: &PlaybackControls) {
    log::info!("Waiting for narration to complete (Ctrl-C to quit)");
    tokio::select! {
        res = controls.wait_until(|s| s.is_story_finished()) => {
            if res.is_ok() {
                log::info!("Story complete");
            }
        }
        _ = tokio::signal::ctrl_c() => log::info!("Interrupted"),
    }
}
