use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{SpeechEngine, SpeechOutcome};

/// Speech engine that writes utterances to the log and takes roughly as long as saying them
/// would. Used when no real synthesizer is wired in.
pub struct LogSpeechEngine {
    per_word: Duration,
    next_utterance: AtomicU64,
    /// Utterance being spoken and its stop token; `None` between utterances.
    current: Mutex<Option<(u64, CancellationToken)>>,
}

impl LogSpeechEngine {
    pub fn new(per_word: Duration) -> Self {
        Self {
            per_word,
            next_utterance: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    fn current(&self) -> MutexGuard<'_, Option<(u64, CancellationToken)>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LogSpeechEngine {
    fn default() -> Self {
        Self::new(Duration::from_millis(350))
    }
}

/// Clears the current slot when the utterance ends or its future is dropped.
struct Utterance<'a> {
    engine: &'a LogSpeechEngine,
    id: u64,
}

impl Drop for Utterance<'_> {
    fn drop(&mut self) {
        let mut current = self.engine.current();
        if matches!(current.as_ref(), Some((id, _)) if *id == self.id) {
            *current = None;
        }
    }
}

#[async_trait]
impl SpeechEngine for LogSpeechEngine {
    async fn speak(&self, text: &str, voice_id: Option<&str>) -> SpeechOutcome {
        let id = self.next_utterance.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();
        *self.current() = Some((id, token.clone()));
        let _utterance = Utterance { engine: self, id };

        log::info!("🔊 \"{}\" (voice: {})", text, voice_id.unwrap_or("default"));
        let words = text.split_whitespace().count().max(1) as u32;

        tokio::select! {
            _ = tokio::time::sleep(self.per_word * words) => SpeechOutcome::Completed,
            _ = token.cancelled() => SpeechOutcome::Cancelled,
        }
    }

    fn is_speaking(&self) -> bool {
        self.current().is_some()
    }

    /// Stops the current utterance only; a stop with nothing playing has no lasting effect.
    fn stop(&self) {
        if let Some((_, token)) = self.current().take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_utterance_length_scales_with_words() {
        let engine = LogSpeechEngine::new(Duration::from_millis(100));
        let started = tokio::time::Instant::now();

        let outcome = engine.speak("Lower Right Arm", None).await;

        assert_eq!(outcome, SpeechOutcome::Completed);
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert!(!engine.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_utterance() {
        let engine = Arc::new(LogSpeechEngine::new(Duration::from_secs(1)));
        let speaker = engine.clone();
        let handle = tokio::spawn(async move { speaker.speak("Hold the pose", None).await });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(engine.is_speaking());
        engine.stop();

        assert_eq!(handle.await.unwrap(), SpeechOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_between_utterances_does_not_carry_over() {
        let engine = LogSpeechEngine::new(Duration::from_millis(100));

        assert_eq!(engine.speak("Raise Right Arm", None).await, SpeechOutcome::Completed);
        engine.stop();

        let started = tokio::time::Instant::now();
        assert_eq!(engine.speak("Hold the pose", None).await, SpeechOutcome::Completed);
        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
