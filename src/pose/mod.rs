pub mod catalog;

pub use catalog::PoseKind;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Named landmarks reported by the pose source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JointName {
    Head,
    Neck,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl JointName {
    /// The six arm joints every upper-body pose check relies on.
    pub const ARMS: [JointName; 6] = [
        JointName::LeftShoulder,
        JointName::RightShoulder,
        JointName::LeftElbow,
        JointName::RightElbow,
        JointName::LeftWrist,
        JointName::RightWrist,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            JointName::Head => "head",
            JointName::Neck => "neck",
            JointName::LeftShoulder => "left shoulder",
            JointName::RightShoulder => "right shoulder",
            JointName::LeftElbow => "left elbow",
            JointName::RightElbow => "right elbow",
            JointName::LeftWrist => "left wrist",
            JointName::RightWrist => "right wrist",
            JointName::LeftHip => "left hip",
            JointName::RightHip => "right hip",
            JointName::LeftKnee => "left knee",
            JointName::RightKnee => "right knee",
            JointName::LeftAnkle => "left ankle",
            JointName::RightAnkle => "right ankle",
        }
    }
}

impl fmt::Display for JointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Body side as labelled by the pose source.
///
/// The source labels sides from the camera's point of view, so what it calls `Left` is the
/// subject's right. Classifier thresholds are calibrated against this labelling; spoken
/// feedback goes through [`crate::correction::feedback::spoken_side`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodySide {
    Left,
    Right,
}

impl BodySide {
    pub fn shoulder(&self) -> JointName {
        match self {
            BodySide::Left => JointName::LeftShoulder,
            BodySide::Right => JointName::RightShoulder,
        }
    }

    pub fn elbow(&self) -> JointName {
        match self {
            BodySide::Left => JointName::LeftElbow,
            BodySide::Right => JointName::RightElbow,
        }
    }

    pub fn wrist(&self) -> JointName {
        match self {
            BodySide::Left => JointName::LeftWrist,
            BodySide::Right => JointName::RightWrist,
        }
    }
}

/// A single detected joint: position in the pose source's 3D space plus its confidence.
///
/// Coordinates: `+X` right, `+Y` up, `-Z` toward the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Joint3D {
    pub position: Vector3<f64>,
    pub confidence: f32,
}

impl Joint3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

/// Joints detected in one processed camera frame. Absent entries were not detected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    #[serde(default)]
    pub joints: HashMap<JointName, Joint3D>,
}

impl PoseFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_joint(mut self, name: JointName, joint: Joint3D) -> Self {
        self.joints.insert(name, joint);
        self
    }

    pub fn insert(&mut self, name: JointName, joint: Joint3D) {
        self.joints.insert(name, joint);
    }

    /// Returns the joint only when its confidence is strictly above `min_confidence`.
    pub fn tracked(&self, name: JointName, min_confidence: f32) -> Option<&Joint3D> {
        self.joints
            .get(&name)
            .filter(|joint| joint.confidence > min_confidence)
    }
}
