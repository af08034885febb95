pub mod classifier;
pub mod config;
pub mod engine;
pub mod feedback;
pub mod geometry;

pub use classifier::{classify_horizontal, classify_vertical, HorizontalVerdict, VerticalVerdict};
pub use config::CorrectionConfig;
pub use engine::{
    DetailedOutcome, DetailedReport, FacingStatus, FrameEvaluation, LimbCheck, LimbVerdict,
    PoseClassification, PoseCorrectionEngine,
};
pub use geometry::{analyze, AngleAnalysis, AxisOffset};
