pub mod tone;

use anyhow::{anyhow, Context, Result};
use rodio::{OutputStream, Sink};
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::capture::{CaptureSnapshot, CaptureState};
use tone::ToneBurst;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const TICK_HZ: f32 = 880.0;
const SHUTTER_HZ: f32 = 1320.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueCommand {
    /// Three ticks a second apart.
    Countdown,
    Shutter,
    /// Cut whatever is playing.
    Silence,
    Stop,
}

/// Plays countdown and shutter cues on a dedicated thread holding the non-Send output stream.
#[derive(Clone)]
pub struct CueEngineHandle {
    tx: Arc<Mutex<Option<Sender<CueCommand>>>>,
}

impl Default for CueEngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CueEngineHandle {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<CueCommand>> {
        let mut guard = self
            .tx
            .lock()
            .map_err(|_| anyhow!("cue engine lock poisoned"))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<CueCommand>();

        thread::Builder::new()
            .name("audio-cues".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;

                fn ensure_sink(
                    stream: &mut Option<OutputStream>,
                    sink: &mut Option<Sink>,
                ) -> Result<()> {
                    if sink.is_none() {
                        let (s, handle) = OutputStream::try_default()
                            .context("Failed to create audio output stream")?;
                        let new_sink =
                            Sink::try_new(&handle).context("Failed to create audio sink")?;
                        *stream = Some(s);
                        *sink = Some(new_sink);
                    }
                    Ok(())
                }

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        CueCommand::Countdown | CueCommand::Shutter => {
                            if let Err(err) = ensure_sink(&mut _stream, &mut sink) {
                                log_warn!("audio cue skipped: {err:#}");
                                continue;
                            }
                            if let Some(ref s) = sink {
                                // a new cue replaces the one still playing
                                s.clear();
                                append_cue(s, cmd);
                                s.play();
                            }
                        }
                        CueCommand::Silence => {
                            if let Some(ref s) = sink {
                                s.clear();
                            }
                        }
                        CueCommand::Stop => {
                            if let Some(s_old) = sink.take() {
                                s_old.stop();
                            }
                            _stream = None;
                            break;
                        }
                    }
                }
            })
            .context("failed to spawn audio cue thread")?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    pub fn play(&self, cue: CueCommand) -> Result<()> {
        let tx = self.ensure_thread()?;
        tx.send(cue).map_err(|_| anyhow!("audio cue thread has exited"))
    }

    pub fn stop(&self) {
        if let Ok(mut guard) = self.tx.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(CueCommand::Stop);
            }
        }
    }
}

fn append_cue(sink: &Sink, cue: CueCommand) {
    match cue {
        CueCommand::Countdown => {
            for i in 0..3 {
                if i > 0 {
                    sink.append(ToneBurst::silence(Duration::from_millis(880)));
                }
                sink.append(ToneBurst::new(TICK_HZ, Duration::from_millis(120)));
            }
        }
        CueCommand::Shutter => {
            sink.append(ToneBurst::new(SHUTTER_HZ, Duration::from_millis(60)));
            sink.append(ToneBurst::silence(Duration::from_millis(40)));
            sink.append(ToneBurst::new(SHUTTER_HZ, Duration::from_millis(90)));
        }
        CueCommand::Silence | CueCommand::Stop => {}
    }
}

/// Cue for a capture state change, if any.
pub fn cue_for(previous: CaptureState, current: CaptureState) -> Option<CueCommand> {
    match (previous, current) {
        (prev, next) if prev == next => None,
        (_, CaptureState::CountingDown) => Some(CueCommand::Countdown),
        (_, CaptureState::TakingPicture) => Some(CueCommand::Shutter),
        (CaptureState::CountingDown, CaptureState::Idle) => Some(CueCommand::Silence),
        _ => None,
    }
}

/// Follow capture snapshots and play the matching cues until the controller is dropped.
pub fn spawn_cue_listener(
    mut snapshots: watch::Receiver<CaptureSnapshot>,
    cues: CueEngineHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut previous = snapshots.borrow_and_update().state;

        while snapshots.changed().await.is_ok() {
            let current = snapshots.borrow_and_update().state;
            if let Some(cue) = cue_for(previous, current) {
                if let Err(err) = cues.play(cue) {
                    log_warn!("failed to play {:?} cue: {err:#}", cue);
                }
            }
            previous = current;
        }

        log_info!("capture events closed, stopping audio cues");
        cues.stop();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cues_follow_capture_transitions() {
        use CaptureState::*;

        assert_eq!(cue_for(Idle, CountingDown), Some(CueCommand::Countdown));
        assert_eq!(cue_for(CountingDown, TakingPicture), Some(CueCommand::Shutter));
        assert_eq!(cue_for(CountingDown, Idle), Some(CueCommand::Silence));
        assert_eq!(cue_for(TakingPicture, Cooldown), None);
        assert_eq!(cue_for(Cooldown, Idle), None);
        assert_eq!(cue_for(Idle, Idle), None);
    }
}
