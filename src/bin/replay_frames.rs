//! Replays recorded pose frames through a coaching session, speaking into the log.
//!
//! ```text
//! replay_frames <frames.json> [--settings <path>] [--interval-ms <ms>] [--tail-ms <ms>]
//! ```
//!
//! `frames.json` is an array of pose frames; `null` entries are frames with nobody in view.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use posecoach::{
    init_logging, CaptureTrigger, LogSpeechEngine, PoseFrame, PoseSession, SessionController,
    SettingsStore,
};

const USAGE: &str =
    "usage: replay_frames <frames.json> [--settings <path>] [--interval-ms <ms>] [--tail-ms <ms>]";

struct Args {
    frames: PathBuf,
    settings: Option<PathBuf>,
    interval: Duration,
    tail: Duration,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut frames = None;
    let mut settings = None;
    let mut interval_ms = 33;
    let mut tail_ms = 6_000;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => {
                settings = Some(PathBuf::from(
                    args.next().context("--settings needs a path")?,
                ));
            }
            "--interval-ms" => {
                interval_ms = args
                    .next()
                    .context("--interval-ms needs a value")?
                    .parse()
                    .context("--interval-ms must be a number")?;
            }
            "--tail-ms" => {
                tail_ms = args
                    .next()
                    .context("--tail-ms needs a value")?
                    .parse()
                    .context("--tail-ms must be a number")?;
            }
            other if other.starts_with("--") => bail!("unknown flag {other}"),
            other => frames = Some(PathBuf::from(other)),
        }
    }

    Ok(Args {
        frames: frames.context(USAGE)?,
        settings,
        interval: Duration::from_millis(interval_ms),
        tail: Duration::from_millis(tail_ms),
    })
}

/// Stands in for the camera shutter.
#[derive(Default)]
struct LoggingShutter {
    taken: AtomicUsize,
}

#[async_trait]
impl CaptureTrigger for LoggingShutter {
    async fn capture(&self) -> Result<()> {
        let n = self.taken.fetch_add(1, Ordering::SeqCst) + 1;
        info!("📸 shutter released (photo #{n})");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = parse_args()?;

    let settings = match &args.settings {
        Some(path) => SettingsStore::new(path.clone())?.settings(),
        None => Default::default(),
    };

    let contents = std::fs::read_to_string(&args.frames)
        .with_context(|| format!("Failed to read frames from {}", args.frames.display()))?;
    let frames: Vec<Option<PoseFrame>> = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid frames in {}", args.frames.display()))?;
    info!("replaying {} frames from {}", frames.len(), args.frames.display());

    let shutter = Arc::new(LoggingShutter::default());
    let session = PoseSession::new(
        &settings,
        Arc::new(LogSpeechEngine::default()),
        shutter.clone(),
    )?;
    let mut snapshots = session.capture().subscribe();

    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            info!("capture state → {:?}", snapshot.state);
        }
    });

    let mut controller = SessionController::new();
    let sender = controller.start(session)?;

    let mut ticker = tokio::time::interval(args.interval);
    for frame in frames {
        ticker.tick().await;
        if !sender.offer(frame) {
            warn!("frame dropped, correction loop is behind");
        }
    }

    tokio::time::sleep(args.tail).await;
    controller.stop().await?;

    info!(
        "replay finished with {} photo(s)",
        shutter.taken.load(Ordering::SeqCst)
    );
    Ok(())
}
