use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::classifier::{horizontal_verdict, vertical_verdict, HorizontalVerdict, VerticalVerdict};
use super::config::CorrectionConfig;
use super::feedback::{splice_side, spoken_side};
use super::geometry::{analyze, AngleAnalysis};
use crate::pose::{BodySide, JointName, PoseFrame, PoseKind};
use crate::speech::{FeedbackArbitrator, SpeechRequest};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

const MAX_MISSING_JOINTS: usize = 2;
const SUCCESS_FEEDBACK: &str = "Front double biceps position locked in";
const HOLD_FEEDBACK: &str = "Perfect, hold it there";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FacingStatus {
    /// Too many joints missing to judge anything.
    Undetectable,
    OutOfPosition,
    InPosition,
}

/// Result of the coarse position gate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseClassification {
    pub status: FacingStatus,
    pub is_pose_correct: bool,
    pub confidence: f32,
    pub feedback: String,
    pub detected_joints: BTreeMap<JointName, bool>,
}

/// One joint-pair check of the detailed gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LimbCheck {
    LeftShoulderElbow,
    RightShoulderElbow,
    LeftElbowWrist,
    RightElbowWrist,
}

impl LimbCheck {
    /// Evaluation and feedback order: upper arms before forearms.
    pub const ORDER: [LimbCheck; 4] = [
        LimbCheck::LeftShoulderElbow,
        LimbCheck::RightShoulderElbow,
        LimbCheck::LeftElbowWrist,
        LimbCheck::RightElbowWrist,
    ];

    pub fn side(&self) -> BodySide {
        match self {
            LimbCheck::LeftShoulderElbow | LimbCheck::LeftElbowWrist => BodySide::Left,
            LimbCheck::RightShoulderElbow | LimbCheck::RightElbowWrist => BodySide::Right,
        }
    }

    pub fn joints(&self) -> (JointName, JointName) {
        let side = self.side();
        match self {
            LimbCheck::LeftShoulderElbow | LimbCheck::RightShoulderElbow => {
                (side.shoulder(), side.elbow())
            }
            LimbCheck::LeftElbowWrist | LimbCheck::RightElbowWrist => (side.elbow(), side.wrist()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LimbVerdict {
    Vertical(VerticalVerdict),
    Horizontal(HorizontalVerdict),
}

impl LimbVerdict {
    pub fn is_ideal(&self) -> bool {
        matches!(
            self,
            LimbVerdict::Vertical(VerticalVerdict::Ideal)
                | LimbVerdict::Horizontal(HorizontalVerdict::Ideal)
        )
    }

    pub fn template(&self) -> Option<&'static str> {
        match self {
            LimbVerdict::Vertical(verdict) => verdict.template(),
            LimbVerdict::Horizontal(verdict) => verdict.template(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimbResult {
    pub check: LimbCheck,
    pub analysis: AngleAnalysis,
    pub verdict: LimbVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DetailedOutcome {
    Correct,
    Deviation {
        check: LimbCheck,
        verdict: LimbVerdict,
        feedback: String,
    },
    MissingJoint(JointName),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedReport {
    pub outcome: DetailedOutcome,
    pub limbs: Vec<LimbResult>,
    /// Informational; not part of the verdict.
    pub shoulder_symmetry: Option<AngleAnalysis>,
}

impl DetailedReport {
    pub fn is_correct(&self) -> bool {
        self.outcome == DetailedOutcome::Correct
    }
}

/// Everything the engine concluded about one processed frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameEvaluation {
    pub pose: PoseKind,
    pub facing: PoseClassification,
    pub detailed: Option<DetailedReport>,
    pub is_pose_correct: bool,
    pub feedback: String,
    pub evaluated_at: DateTime<Utc>,
}

impl FrameEvaluation {
    /// Evaluation for a frame in which the pose source found nobody.
    pub fn no_subject(pose: PoseKind) -> Self {
        Self {
            pose,
            facing: PoseClassification {
                status: FacingStatus::Undetectable,
                is_pose_correct: false,
                confidence: 0.0,
                feedback: "No one in frame".to_string(),
                detected_joints: JointName::ARMS.iter().map(|name| (*name, false)).collect(),
            },
            detailed: None,
            is_pose_correct: false,
            feedback: "No one in frame".to_string(),
            evaluated_at: Utc::now(),
        }
    }
}

/// Runs the two-stage correction for one pose and speaks the first deviation it finds.
pub struct PoseCorrectionEngine {
    pose: PoseKind,
    config: CorrectionConfig,
    arbitrator: FeedbackArbitrator,
}

impl PoseCorrectionEngine {
    pub fn new(
        pose: PoseKind,
        config: CorrectionConfig,
        arbitrator: FeedbackArbitrator,
    ) -> Result<Self> {
        if !pose.is_available() {
            bail!("no correction model for {}", pose.title());
        }

        Ok(Self {
            pose,
            config,
            arbitrator,
        })
    }

    pub fn pose(&self) -> PoseKind {
        self.pose
    }

    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    fn position(&self, frame: &PoseFrame, name: JointName) -> Option<Vector3<f64>> {
        frame
            .tracked(name, self.config.min_joint_confidence)
            .map(|joint| joint.position)
    }

    /// Stage 1: is the subject roughly in the base stance, arms up and flexed?
    pub fn check_facing_pose(&self, frame: &PoseFrame) -> PoseClassification {
        let detected_joints: BTreeMap<JointName, bool> = JointName::ARMS
            .iter()
            .map(|name| (*name, self.position(frame, *name).is_some()))
            .collect();
        let missing: Vec<JointName> = detected_joints
            .iter()
            .filter(|(_, detected)| !**detected)
            .map(|(name, _)| *name)
            .collect();

        if missing.len() > MAX_MISSING_JOINTS {
            let names: Vec<&str> = missing.iter().map(JointName::label).collect();
            log_debug!("pose undetectable, missing {}/6 joints", missing.len());
            return PoseClassification {
                status: FacingStatus::Undetectable,
                is_pose_correct: false,
                confidence: 0.0,
                feedback: format!(
                    "Cannot detect pose - too many joints missing: {}",
                    names.join(", ")
                ),
                detected_joints,
            };
        }

        let facing = &self.config.facing;
        let mut confidence: f32 = 1.0;
        let mut deviations: Vec<String> = Vec::new();

        if !missing.is_empty() {
            deviations.push("Keep both arms in frame".to_string());
        }

        let shoulder_width = match (
            self.position(frame, JointName::LeftShoulder),
            self.position(frame, JointName::RightShoulder),
        ) {
            (Some(left), Some(right)) => Some((left.x - right.x).abs()),
            _ => None,
        }
        .filter(|width| *width > f64::EPSILON);

        for side in [BodySide::Left, BodySide::Right] {
            let shoulder = self.position(frame, side.shoulder());
            let elbow = self.position(frame, side.elbow());
            let wrist = self.position(frame, side.wrist());
            let spoken = spoken_side(side).to_lowercase();

            if let (Some(shoulder), Some(elbow)) = (shoulder, elbow) {
                let reference = shoulder_width.unwrap_or_else(|| (elbow - shoulder).norm());
                let offset = if reference > f64::EPSILON {
                    (elbow.y - shoulder.y) / reference
                } else {
                    f64::INFINITY
                };
                if offset.abs() > facing.elbow_height_band {
                    confidence -= facing.misaligned_arm_penalty;
                    deviations.push(format!("Bring your {spoken} elbow level with your shoulder"));
                }
            }

            if let (Some(elbow), Some(wrist)) = (elbow, wrist) {
                if wrist.y <= elbow.y {
                    confidence -= facing.unflexed_arm_penalty;
                    deviations.push(format!("Curl your {spoken} wrist up"));
                }
            }
        }

        if let (Some(width), Some(left), Some(right)) = (
            shoulder_width,
            self.position(frame, JointName::LeftElbow),
            self.position(frame, JointName::RightElbow),
        ) {
            if (left.x - right.x).abs() < width * facing.min_elbow_spread_ratio {
                confidence -= facing.narrow_elbows_penalty;
                deviations.push("Spread your elbows wider".to_string());
            }
        }

        let confidence = confidence.max(0.0);
        let is_pose_correct = deviations.is_empty();

        PoseClassification {
            status: if is_pose_correct {
                FacingStatus::InPosition
            } else {
                FacingStatus::OutOfPosition
            },
            is_pose_correct,
            confidence,
            feedback: if is_pose_correct {
                SUCCESS_FEEDBACK.to_string()
            } else {
                deviations.join(", ")
            },
            detected_joints,
        }
    }

    fn classify(&self, check: LimbCheck, angle: f64) -> LimbVerdict {
        let side = check.side();
        match check {
            LimbCheck::LeftShoulderElbow | LimbCheck::RightShoulderElbow => {
                LimbVerdict::Vertical(vertical_verdict(
                    self.config.shoulder_elbow.get(side),
                    angle,
                    side,
                    self.config.vertical_tolerance,
                ))
            }
            LimbCheck::LeftElbowWrist | LimbCheck::RightElbowWrist => {
                LimbVerdict::Horizontal(horizontal_verdict(
                    self.config.elbow_wrist.get(side),
                    angle,
                    self.config.horizontal_tolerance,
                ))
            }
        }
    }

    /// Stage 2: per-limb angle checks. Speaks the correction for the first failing limb.
    pub async fn check_detailed_pose(&self, frame: &PoseFrame) -> DetailedReport {
        let mut positions: HashMap<JointName, Vector3<f64>> = HashMap::new();
        for name in JointName::ARMS {
            match self.position(frame, name) {
                Some(position) => {
                    positions.insert(name, position);
                }
                None => {
                    return DetailedReport {
                        outcome: DetailedOutcome::MissingJoint(name),
                        limbs: Vec::new(),
                        shoulder_symmetry: None,
                    };
                }
            }
        }

        let threshold = self.config.alignment_threshold;
        let shoulder_symmetry = analyze(
            &positions[&JointName::LeftShoulder],
            &positions[&JointName::RightShoulder],
            threshold,
        );
        log_debug!("shoulder symmetry {}", shoulder_symmetry.describe());

        let limbs: Vec<LimbResult> = LimbCheck::ORDER
            .iter()
            .map(|check| {
                let (from, to) = check.joints();
                let analysis = analyze(&positions[&from], &positions[&to], threshold);
                LimbResult {
                    check: *check,
                    analysis,
                    verdict: self.classify(*check, analysis.angle_xy),
                }
            })
            .collect();

        let outcome = match limbs.iter().find(|limb| !limb.verdict.is_ideal()) {
            Some(limb) => {
                let template = limb.verdict.template().unwrap_or_default();
                let feedback = splice_side(template, limb.check.side());
                log_info!(
                    "{:?} off ({:?}) at {:.1}°: \"{}\"",
                    limb.check,
                    limb.verdict,
                    limb.analysis.angle_xy,
                    feedback
                );
                let _ticket = self.arbitrator.enqueue(SpeechRequest::new(feedback.clone())).await;
                DetailedOutcome::Deviation {
                    check: limb.check,
                    verdict: limb.verdict,
                    feedback,
                }
            }
            None => DetailedOutcome::Correct,
        };

        DetailedReport {
            outcome,
            limbs,
            shoulder_symmetry: Some(shoulder_symmetry),
        }
    }

    /// Both gates. The pose is correct only when both pass.
    pub async fn evaluate(&self, frame: &PoseFrame) -> FrameEvaluation {
        let facing = self.check_facing_pose(frame);

        if !facing.is_pose_correct {
            return FrameEvaluation {
                pose: self.pose,
                feedback: facing.feedback.clone(),
                facing,
                detailed: None,
                is_pose_correct: false,
                evaluated_at: Utc::now(),
            };
        }

        let detailed = self.check_detailed_pose(frame).await;
        let feedback = match &detailed.outcome {
            DetailedOutcome::Correct => HOLD_FEEDBACK.to_string(),
            DetailedOutcome::Deviation { feedback, .. } => feedback.clone(),
            DetailedOutcome::MissingJoint(name) => format!("Lost track of your {name}"),
        };

        FrameEvaluation {
            pose: self.pose,
            is_pose_correct: detailed.is_correct(),
            feedback,
            facing,
            detailed: Some(detailed),
            evaluated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pose::Joint3D;
    use crate::speech::arbitrator::tests::{settle, ScriptedEngine};
    use crate::speech::{ArbitratorConfig, SpeechOutcome};
    use std::sync::Arc;

    const UPPER_ARM: f64 = 0.3;
    const FOREARM: f64 = 0.25;

    /// Arms posed at the given front-view angles (degrees), in pose-source labelling.
    pub(crate) fn posed_frame(
        left_upper: f64,
        right_upper: f64,
        left_fore: f64,
        right_fore: f64,
    ) -> PoseFrame {
        let mut frame = PoseFrame::new();
        for (side, shoulder_x, upper, fore) in [
            (BodySide::Left, 0.2, left_upper, left_fore),
            (BodySide::Right, -0.2, right_upper, right_fore),
        ] {
            let shoulder = Vector3::new(shoulder_x, 1.4, -0.05);
            let upper = upper.to_radians();
            let fore = fore.to_radians();
            let elbow = shoulder + Vector3::new(upper.cos(), upper.sin(), 0.0) * UPPER_ARM;
            let wrist = elbow + Vector3::new(fore.cos(), fore.sin(), 0.0) * FOREARM;
            for (name, at) in [
                (side.shoulder(), shoulder),
                (side.elbow(), elbow),
                (side.wrist(), wrist),
            ] {
                frame.insert(name, Joint3D::new(at.x, at.y, at.z).with_confidence(0.9));
            }
        }
        frame
    }

    pub(crate) fn ideal_frame() -> PoseFrame {
        posed_frame(303.0, 231.0, 145.0, 40.0)
    }

    fn engine_with(speech: &Arc<ScriptedEngine>) -> PoseCorrectionEngine {
        let arbitrator = FeedbackArbitrator::new(speech.clone(), ArbitratorConfig::default());
        PoseCorrectionEngine::new(
            PoseKind::FrontDoubleBiceps,
            CorrectionConfig::default(),
            arbitrator,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ideal_pose_passes_both_gates_silently() {
        let speech = Arc::new(ScriptedEngine::default());
        let engine = engine_with(&speech);

        let evaluation = engine.evaluate(&ideal_frame()).await;
        settle().await;

        assert!(evaluation.facing.is_pose_correct);
        assert_eq!(evaluation.facing.status, FacingStatus::InPosition);
        assert!((evaluation.facing.confidence - 1.0).abs() < f32::EPSILON);
        assert!(evaluation.is_pose_correct);
        let detailed = evaluation.detailed.unwrap();
        assert_eq!(detailed.limbs.len(), 4);
        assert!(detailed.shoulder_symmetry.is_some());
        assert!(speech.spoken().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_left_arm_speaks_mirrored_correction() {
        let speech = Arc::new(ScriptedEngine::default());
        let engine = engine_with(&speech);

        let evaluation = engine.evaluate(&posed_frame(290.0, 231.0, 145.0, 40.0)).await;
        settle().await;

        assert!(!evaluation.is_pose_correct);
        assert_eq!(evaluation.feedback, "Raise Right Arm");
        match evaluation.detailed.unwrap().outcome {
            DetailedOutcome::Deviation { check, verdict, .. } => {
                assert_eq!(check, LimbCheck::LeftShoulderElbow);
                assert_eq!(verdict, LimbVerdict::Vertical(VerticalVerdict::TooLow));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(speech.spoken(), vec!["Raise Right Arm"]);
        speech.finish(SpeechOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upper_arms_are_checked_before_forearms() {
        let speech = Arc::new(ScriptedEngine::default());
        let engine = engine_with(&speech);

        // right upper arm too low and left forearm too far in
        let report = engine
            .check_detailed_pose(&posed_frame(303.0, 250.0, 165.0, 40.0))
            .await;
        settle().await;

        match report.outcome {
            DetailedOutcome::Deviation { check, feedback, .. } => {
                assert_eq!(check, LimbCheck::RightShoulderElbow);
                assert_eq!(feedback, "Raise Left Arm");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(
            report.limbs[2].verdict,
            LimbVerdict::Horizontal(HorizontalVerdict::TooIn)
        );
        assert_eq!(speech.spoken(), vec!["Raise Left Arm"]);
        speech.finish(SpeechOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forearm_correction_wording() {
        let speech = Arc::new(ScriptedEngine::default());
        let engine = engine_with(&speech);

        let report = engine
            .check_detailed_pose(&posed_frame(303.0, 231.0, 145.0, 20.0))
            .await;
        settle().await;

        assert_eq!(
            report.outcome,
            DetailedOutcome::Deviation {
                check: LimbCheck::RightElbowWrist,
                verdict: LimbVerdict::Horizontal(HorizontalVerdict::TooIn),
                feedback: "Spread Left Wrist".to_string(),
            }
        );
        speech.finish(SpeechOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_too_many_missing_joints_is_undetectable() {
        let speech = Arc::new(ScriptedEngine::default());
        let engine = engine_with(&speech);

        let mut frame = ideal_frame();
        frame.joints.remove(&JointName::LeftWrist);
        frame.joints.remove(&JointName::RightWrist);
        frame.insert(
            JointName::LeftElbow,
            Joint3D::new(0.0, 0.0, 0.0).with_confidence(0.2),
        );

        let classification = engine.check_facing_pose(&frame);

        assert_eq!(classification.status, FacingStatus::Undetectable);
        assert_eq!(classification.confidence, 0.0);
        assert!(classification.feedback.contains("left wrist"));
        assert!(!classification.detected_joints[&JointName::LeftElbow]);

        let evaluation = engine.evaluate(&frame).await;
        assert!(!evaluation.is_pose_correct);
        assert!(evaluation.detailed.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_missing_joint_fails_position_gate() {
        let speech = Arc::new(ScriptedEngine::default());
        let engine = engine_with(&speech);

        let mut frame = ideal_frame();
        frame.joints.remove(&JointName::RightWrist);

        let classification = engine.check_facing_pose(&frame);
        assert_eq!(classification.status, FacingStatus::OutOfPosition);
        assert!(classification.feedback.contains("Keep both arms in frame"));
    }

    #[test]
    fn test_straight_arms_lose_confidence() {
        let speech = Arc::new(ScriptedEngine::default());
        let arbitrator = FeedbackArbitrator::new(speech, ArbitratorConfig::default());
        let engine = PoseCorrectionEngine::new(
            PoseKind::FrontDoubleBiceps,
            CorrectionConfig::default(),
            arbitrator,
        )
        .unwrap();

        // forearms hanging down from the elbows
        let classification = engine.check_facing_pose(&posed_frame(303.0, 231.0, 270.0, 270.0));

        assert!(!classification.is_pose_correct);
        assert!((classification.confidence - 0.6).abs() < 1e-6);
        assert!(classification.feedback.contains("Curl your right wrist up"));
        assert!(classification.feedback.contains("Curl your left wrist up"));
    }

    #[test]
    fn test_arms_at_sides_are_out_of_position() {
        let speech = Arc::new(ScriptedEngine::default());
        let arbitrator = FeedbackArbitrator::new(speech, ArbitratorConfig::default());
        let engine = PoseCorrectionEngine::new(
            PoseKind::FrontDoubleBiceps,
            CorrectionConfig::default(),
            arbitrator,
        )
        .unwrap();

        let classification = engine.check_facing_pose(&posed_frame(270.0, 270.0, 270.0, 270.0));

        // two straight arms, elbows tucked in
        assert!((classification.confidence - 0.4).abs() < 1e-6);
        assert_eq!(classification.status, FacingStatus::OutOfPosition);
        assert!(classification.feedback.contains("Spread your elbows wider"));
    }

    #[test]
    fn test_dropped_elbow_is_misaligned() {
        let speech = Arc::new(ScriptedEngine::default());
        let arbitrator = FeedbackArbitrator::new(speech, ArbitratorConfig::default());
        let engine = PoseCorrectionEngine::new(
            PoseKind::FrontDoubleBiceps,
            CorrectionConfig::default(),
            arbitrator,
        )
        .unwrap();

        let mut frame = ideal_frame();
        for name in [JointName::LeftElbow, JointName::LeftWrist] {
            let joint = frame.joints.get_mut(&name).unwrap();
            joint.position.y -= 0.4;
        }

        let classification = engine.check_facing_pose(&frame);

        assert!((classification.confidence - 0.7).abs() < 1e-6);
        assert_eq!(
            classification.feedback,
            "Bring your right elbow level with your shoulder"
        );
    }

    #[test]
    fn test_unavailable_pose_is_rejected() {
        let speech = Arc::new(ScriptedEngine::default());
        let arbitrator = FeedbackArbitrator::new(speech, ArbitratorConfig::default());

        let result = PoseCorrectionEngine::new(
            PoseKind::SideChest,
            CorrectionConfig::default(),
            arbitrator,
        );
        assert!(result.is_err());
    }
}
