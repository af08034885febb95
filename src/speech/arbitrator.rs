use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{SpeechEngine, SpeechOutcome, SpeechRequest, SpeechTicket};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitratorConfig {
    /// Identical text dispatched within this window is dropped.
    pub debounce_ms: u64,
    /// Voice used for requests that don't name one.
    pub voice_id: Option<String>,
}

impl Default for ArbitratorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 2_000,
            voice_id: None,
        }
    }
}

impl ArbitratorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

struct Queued {
    request: SpeechRequest,
    responder: oneshot::Sender<SpeechOutcome>,
}

struct InFlight {
    id: Uuid,
    responder: oneshot::Sender<SpeechOutcome>,
    /// Cancelled by a force request or `stop_all_speech`. The speak call is dropped and the
    /// request reported as cancelled whatever the engine says, even if it never started.
    cancel: CancellationToken,
}

impl InFlight {
    fn interrupt(&self, engine: &dyn SpeechEngine) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.cancel.cancel();
        engine.stop();
        true
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Queued>,
    in_flight: Option<InFlight>,
    last_dispatched: Option<(String, Instant)>,
}

impl QueueState {
    fn is_repeat(&self, text: &str, window: Duration) -> bool {
        match &self.last_dispatched {
            Some((last, at)) => last == text && at.elapsed() < window,
            None => false,
        }
    }

    fn cancel_pending(&mut self) {
        for dropped in self.pending.drain(..) {
            let _ = dropped.responder.send(SpeechOutcome::Cancelled);
        }
    }
}

struct Inner {
    engine: Arc<dyn SpeechEngine>,
    config: ArbitratorConfig,
    state: Mutex<QueueState>,
}

/// Serializes spoken feedback from every producer onto one [`SpeechEngine`].
///
/// Build one per process and clone the handle into each producer. At most one `speak` call
/// is outstanding at any time; the next request is dispatched from the completion of the
/// previous one.
#[derive(Clone)]
pub struct FeedbackArbitrator {
    inner: Arc<Inner>,
}

impl FeedbackArbitrator {
    pub fn new(engine: Arc<dyn SpeechEngine>, config: ArbitratorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                config,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    pub fn config(&self) -> &ArbitratorConfig {
        &self.inner.config
    }

    /// Queue a request. Must be called from within a tokio runtime.
    ///
    /// - identical text dispatched less than `debounce` ago: dropped, ticket completes;
    /// - `force`: stops the current utterance and cancels everything pending;
    /// - while busy: takes the single pending slot, replacing its occupant unless that one has
    ///   a higher priority;
    /// - otherwise spoken right away.
    ///
    /// "The latest request wins" holds only at equal or rising priority.
    pub async fn enqueue(&self, request: SpeechRequest) -> SpeechTicket {
        let (responder, rx) = oneshot::channel();
        let ticket = SpeechTicket::new(request.id, rx);

        let mut state = self.inner.state.lock().await;

        if state.is_repeat(&request.text, self.inner.config.debounce()) {
            log_debug!("debounced repeated feedback \"{}\"", request.text);
            let _ = responder.send(SpeechOutcome::Completed);
            return ticket;
        }

        let queued = Queued { request, responder };

        if queued.request.force {
            if let Some(in_flight) = state.in_flight.as_ref() {
                if in_flight.interrupt(self.inner.engine.as_ref()) {
                    log_info!("interrupting current utterance for \"{}\"", queued.request.text);
                }
            }
            state.cancel_pending();
            state.pending.push_back(queued);
        } else if state.in_flight.is_some() {
            if let Some(index) = state.pending.iter().position(|q| !q.request.force) {
                if state.pending[index].request.priority > queued.request.priority {
                    log_debug!(
                        "dropping \"{}\": higher priority feedback already pending",
                        queued.request.text
                    );
                    let _ = queued.responder.send(SpeechOutcome::Cancelled);
                    return ticket;
                }
                if let Some(replaced) = state.pending.remove(index) {
                    log_debug!(
                        "\"{}\" superseded by \"{}\"",
                        replaced.request.text,
                        queued.request.text
                    );
                    let _ = replaced.responder.send(SpeechOutcome::Cancelled);
                }
            }
            state.pending.push_back(queued);
        } else {
            state.pending.push_back(queued);
        }

        if state.in_flight.is_none() {
            self.dispatch_next(&mut state);
        }

        ticket
    }

    /// Stop the current utterance and cancel everything pending.
    pub async fn stop_all_speech(&self) {
        let mut state = self.inner.state.lock().await;
        state.cancel_pending();
        if let Some(in_flight) = state.in_flight.as_ref() {
            in_flight.interrupt(self.inner.engine.as_ref());
        }
    }

    pub async fn is_busy(&self) -> bool {
        self.inner.state.lock().await.in_flight.is_some()
    }

    pub async fn pending_len(&self) -> usize {
        self.inner.state.lock().await.pending.len()
    }

    /// Caller holds the state lock and nothing is in flight. A cancelled request's speak call
    /// is dropped, so the next one never overlaps it.
    fn dispatch_next(&self, state: &mut QueueState) {
        let Some(Queued { request, responder }) = state.pending.pop_front() else {
            return;
        };

        let cancel = CancellationToken::new();
        state.last_dispatched = Some((request.text.clone(), Instant::now()));
        state.in_flight = Some(InFlight {
            id: request.id,
            responder,
            cancel: cancel.clone(),
        });

        let voice_id = request
            .voice_id
            .clone()
            .or_else(|| self.inner.config.voice_id.clone());
        let arbitrator = self.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => SpeechOutcome::Cancelled,
                outcome = arbitrator.inner.engine.speak(&request.text, voice_id.as_deref()) => outcome,
            };
            arbitrator.finish(request.id, outcome).await;
        });
    }

    async fn finish(&self, id: Uuid, outcome: SpeechOutcome) {
        let mut state = self.inner.state.lock().await;

        let in_flight = match state.in_flight.take() {
            Some(in_flight) if in_flight.id == id => in_flight,
            other => {
                state.in_flight = other;
                log_warn!("ignoring completion for utterance {} that is not in flight", id);
                return;
            }
        };

        let outcome = if in_flight.cancel.is_cancelled() {
            SpeechOutcome::Cancelled
        } else {
            outcome
        };
        if let SpeechOutcome::Failed(reason) = &outcome {
            log_warn!("speech engine failed: {}", reason);
        }
        let _ = in_flight.responder.send(outcome);

        self.dispatch_next(&mut state);
    }
}
