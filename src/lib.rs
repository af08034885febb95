//! Spoken pose correction and hands-free photo capture.
//!
//! Frames of 3D joints go through a [`PoseSession`]: every Nth frame is checked against the
//! selected pose by the [`PoseCorrectionEngine`], the first deviation is spoken through the
//! shared [`FeedbackArbitrator`], and a correct pose drives the [`CaptureController`] through
//! countdown, capture, and cooldown.

#[cfg(feature = "audio-cues")]
pub mod audio;
pub mod capture;
pub mod correction;
pub mod pose;
pub mod session;
pub mod settings;
pub mod speech;
mod utils;

pub use capture::{CaptureController, CaptureSnapshot, CaptureState, CaptureTiming, CaptureTrigger};
pub use correction::{
    classify_horizontal, classify_vertical, CorrectionConfig, FrameEvaluation,
    HorizontalVerdict, PoseClassification, PoseCorrectionEngine, VerticalVerdict,
};
pub use pose::{BodySide, Joint3D, JointName, PoseFrame, PoseKind};
pub use session::{FrameSender, PoseSession, SamplingConfig, SessionController};
pub use settings::{CoachSettings, SettingsStore};
pub use speech::{
    ArbitratorConfig, FeedbackArbitrator, LogSpeechEngine, SpeechEngine, SpeechOutcome,
    SpeechPriority, SpeechRequest, SpeechTicket,
};
pub use utils::init_logging;
