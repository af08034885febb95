pub mod arbitrator;
pub mod log_engine;

pub use arbitrator::{ArbitratorConfig, FeedbackArbitrator};
pub use log_engine::LogSpeechEngine;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use uuid::Uuid;

/// How an utterance ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SpeechOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

/// Text-to-speech backend. Only [`FeedbackArbitrator`] talks to it.
///
/// `stop` silences the utterance currently playing. The arbitrator also drops the interrupted
/// `speak` future, so an implementation must tolerate being dropped mid-utterance and must
/// not let a `stop` with nothing playing affect a later call.
#[async_trait]
pub trait SpeechEngine: Send + Sync + 'static {
    async fn speak(&self, text: &str, voice_id: Option<&str>) -> SpeechOutcome;

    fn is_speaking(&self) -> bool;

    fn stop(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpeechPriority {
    Low,
    Normal,
    High,
}

impl Default for SpeechPriority {
    fn default() -> Self {
        SpeechPriority::Normal
    }
}

#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub id: Uuid,
    pub text: String,
    pub voice_id: Option<String>,
    pub priority: SpeechPriority,
    /// Interrupt whatever is playing and drop everything queued.
    pub force: bool,
    pub created_at: DateTime<Utc>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            voice_id: None,
            priority: SpeechPriority::Normal,
            force: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_priority(mut self, priority: SpeechPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Resolves once the request has been spoken, dropped, or cancelled.
///
/// Dropping the ticket does not cancel the request.
#[derive(Debug)]
pub struct SpeechTicket {
    id: Uuid,
    rx: oneshot::Receiver<SpeechOutcome>,
}

impl SpeechTicket {
    pub(crate) fn new(id: Uuid, rx: oneshot::Receiver<SpeechOutcome>) -> Self {
        Self { id, rx }
    }

    pub fn request_id(&self) -> Uuid {
        self.id
    }
}

impl Future for SpeechTicket {
    type Output = SpeechOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or(SpeechOutcome::Cancelled))
    }
}
