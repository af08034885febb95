use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, Instant},
};

use super::{CaptureSnapshot, CaptureState, CaptureTiming};
use crate::speech::{FeedbackArbitrator, SpeechPriority, SpeechRequest};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Takes the photo. Implemented by the camera layer.
#[async_trait]
pub trait CaptureTrigger: Send + Sync + 'static {
    async fn capture(&self) -> Result<()>;
}

struct Machine {
    snapshot: CaptureSnapshot,
    /// Countdown → capture → cooldown task of the current cycle.
    cycle_task: Option<JoinHandle<()>>,
}

/// Turns per-frame pose correctness into countdown, capture, and cooldown.
///
/// Only `Idle` reacts to a correct pose and only `CountingDown` reacts to an incorrect one;
/// everything else moves on timers and capture completion.
#[derive(Clone)]
pub struct CaptureController {
    machine: Arc<Mutex<Machine>>,
    events: Arc<watch::Sender<CaptureSnapshot>>,
    arbitrator: FeedbackArbitrator,
    trigger: Arc<dyn CaptureTrigger>,
    timing: CaptureTiming,
}

impl CaptureController {
    pub fn new(
        arbitrator: FeedbackArbitrator,
        trigger: Arc<dyn CaptureTrigger>,
        timing: CaptureTiming,
    ) -> Self {
        let snapshot = CaptureSnapshot::new();
        let (events, _) = watch::channel(snapshot.clone());

        Self {
            machine: Arc::new(Mutex::new(Machine {
                snapshot,
                cycle_task: None,
            })),
            events: Arc::new(events),
            arbitrator,
            trigger,
            timing,
        }
    }

    pub async fn get_state(&self) -> CaptureState {
        self.machine.lock().await.snapshot.state
    }

    pub async fn snapshot(&self) -> CaptureSnapshot {
        self.machine.lock().await.snapshot.clone()
    }

    /// Observe every transition.
    pub fn subscribe(&self) -> watch::Receiver<CaptureSnapshot> {
        self.events.subscribe()
    }

    /// Feed one processed frame's verdict. Returns the state after handling it.
    pub async fn on_frame(&self, pose_correct: bool) -> CaptureState {
        let mut machine = self.machine.lock().await;

        match (machine.snapshot.state, pose_correct) {
            (CaptureState::Idle, true) => {
                let deadline = Instant::now() + self.timing.countdown();
                let cycle = machine.snapshot.begin_countdown(deadline);
                machine.cycle_task = Some(self.spawn_cycle(cycle));
                self.publish(&machine.snapshot);
                drop(machine);

                log_info!("✅ pose held, counting down (cycle {})", cycle);
                let _ticket = self
                    .arbitrator
                    .enqueue(
                        SpeechRequest::new(self.timing.hold_prompt.clone())
                            .with_priority(SpeechPriority::High)
                            .forced(),
                    )
                    .await;

                CaptureState::CountingDown
            }
            (CaptureState::CountingDown, false) => {
                if let Some(task) = machine.cycle_task.take() {
                    task.abort();
                }
                machine.snapshot.reset();
                self.publish(&machine.snapshot);

                log_info!(
                    "❌ pose lost during countdown (cycle {}), back to idle",
                    machine.snapshot.cycle
                );
                CaptureState::Idle
            }
            (state, _) => state,
        }
    }

    /// Drop whatever is in progress and go back to `Idle`.
    pub async fn cancel(&self) {
        let mut machine = self.machine.lock().await;
        if let Some(task) = machine.cycle_task.take() {
            task.abort();
        }
        if machine.snapshot.state != CaptureState::Idle {
            machine.snapshot.reset();
            self.publish(&machine.snapshot);
        }
    }

    fn spawn_cycle(&self, cycle: u64) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move { controller.run_cycle(cycle).await })
    }

    async fn run_cycle(&self, cycle: u64) {
        time::sleep(self.timing.countdown()).await;

        {
            let mut machine = self.machine.lock().await;
            if !machine.snapshot.is_current(cycle, CaptureState::CountingDown) {
                log_info!("countdown for cycle {} expired after it was cancelled", cycle);
                return;
            }
            machine.snapshot.begin_capture();
            self.publish(&machine.snapshot);
        }

        log_info!("📸 taking picture (cycle {})", cycle);
        let result = self.trigger.capture().await;

        {
            let mut machine = self.machine.lock().await;
            if !machine.snapshot.is_current(cycle, CaptureState::TakingPicture) {
                return;
            }
            match result {
                Ok(()) => {
                    log_info!("picture taken, cooling down");
                    machine
                        .snapshot
                        .begin_cooldown(Instant::now() + self.timing.cooldown());
                    self.publish(&machine.snapshot);
                }
                Err(err) => {
                    log_error!("capture failed (cycle {}): {err:#}", cycle);
                    machine.snapshot.reset();
                    self.publish(&machine.snapshot);
                    return;
                }
            }
        }

        time::sleep(self.timing.cooldown()).await;

        let mut machine = self.machine.lock().await;
        if machine.snapshot.is_current(cycle, CaptureState::Cooldown) {
            machine.snapshot.reset();
            self.publish(&machine.snapshot);
            log_info!("👍 ready for the next pose");
        }
    }

    fn publish(&self, snapshot: &CaptureSnapshot) {
        self.events.send_replace(snapshot.clone());
    }
}
