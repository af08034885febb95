use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;

use super::FrameSampler;
use crate::capture::{CaptureController, CaptureTrigger};
use crate::correction::{FrameEvaluation, PoseCorrectionEngine};
use crate::pose::PoseFrame;
use crate::settings::CoachSettings;
use crate::speech::{FeedbackArbitrator, SpeechEngine, SpeechRequest};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// One coaching session: sampled frames go through the correction engine and the verdict
/// drives the capture state machine.
pub struct PoseSession {
    engine: PoseCorrectionEngine,
    capture: CaptureController,
    arbitrator: FeedbackArbitrator,
    sampler: FrameSampler,
    start_prompt: String,
    evaluations: watch::Sender<Option<FrameEvaluation>>,
}

impl PoseSession {
    /// Fails when the configured pose has no correction model.
    pub fn new(
        settings: &CoachSettings,
        speech: Arc<dyn SpeechEngine>,
        trigger: Arc<dyn CaptureTrigger>,
    ) -> Result<Self> {
        let arbitrator = FeedbackArbitrator::new(speech, settings.speech.clone());
        let engine = PoseCorrectionEngine::new(
            settings.pose,
            settings.correction.clone(),
            arbitrator.clone(),
        )?;
        let capture = CaptureController::new(arbitrator.clone(), trigger, settings.capture.clone());
        let (evaluations, _) = watch::channel(None);

        log_info!(
            "session ready for {} (every {} frames)",
            settings.pose.title(),
            settings.sampling.processing_interval
        );

        Ok(Self {
            engine,
            capture,
            arbitrator,
            sampler: FrameSampler::new(settings.sampling.processing_interval),
            start_prompt: settings.capture.start_prompt.clone(),
            evaluations,
        })
    }

    pub fn capture(&self) -> &CaptureController {
        &self.capture
    }

    pub fn arbitrator(&self) -> &FeedbackArbitrator {
        &self.arbitrator
    }

    /// Latest evaluation of a processed frame.
    pub fn subscribe_evaluations(&self) -> watch::Receiver<Option<FrameEvaluation>> {
        self.evaluations.subscribe()
    }

    /// Ask the user to step into view.
    pub async fn announce(&self) {
        if self.start_prompt.is_empty() {
            return;
        }
        let _ticket = self
            .arbitrator
            .enqueue(SpeechRequest::new(self.start_prompt.clone()))
            .await;
    }

    /// `None` means the pose source found nobody, which counts as an incorrect pose.
    /// Returns `None` for frames the sampler skips.
    pub async fn on_frame(&mut self, frame: Option<PoseFrame>) -> Option<FrameEvaluation> {
        if !self.sampler.should_process() {
            return None;
        }

        let evaluation = match frame {
            Some(frame) => self.engine.evaluate(&frame).await,
            None => FrameEvaluation::no_subject(self.engine.pose()),
        };

        let state = self.capture.on_frame(evaluation.is_pose_correct).await;
        log_debug!(
            "frame {}: correct={} capture={:?} \"{}\"",
            self.sampler.frames_seen(),
            evaluation.is_pose_correct,
            state,
            evaluation.feedback
        );

        self.evaluations.send_replace(Some(evaluation.clone()));
        Some(evaluation)
    }

    /// Abandon any capture in progress and silence feedback.
    pub async fn shutdown(&self) {
        self.capture.cancel().await;
        self.arbitrator.stop_all_speech().await;
        log_info!(
            "session stopped after {} frames, {} captures",
            self.sampler.frames_seen(),
            self.capture.snapshot().await.captures_taken
        );
    }
}
