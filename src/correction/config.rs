use serde::{Deserialize, Serialize};

use crate::pose::BodySide;

/// Closed angle interval in degrees, `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleBand {
    pub low: f64,
    pub high: f64,
}

/// Where an angle falls relative to a band widened by a tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandPosition {
    Below,
    Inside,
    Above,
}

impl AngleBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn locate(&self, angle: f64, tolerance: f64) -> BandPosition {
        if angle < self.low - tolerance {
            BandPosition::Below
        } else if angle > self.high + tolerance {
            BandPosition::Above
        } else {
            // NaN lands here too
            BandPosition::Inside
        }
    }
}

/// Forearm band described by its two extremes: the angle of a wrist pulled fully in and of a
/// wrist pushed fully out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReachBand {
    pub inward: f64,
    pub outward: f64,
}

impl ReachBand {
    pub const fn new(inward: f64, outward: f64) -> Self {
        Self { inward, outward }
    }

    pub fn as_band(&self) -> AngleBand {
        AngleBand::new(self.inward.min(self.outward), self.inward.max(self.outward))
    }

    /// True when the inward extreme is the upper end of the band.
    pub fn inward_is_high(&self) -> bool {
        self.inward >= self.outward
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideBands<T> {
    pub left: T,
    pub right: T,
}

impl<T> SideBands<T> {
    pub fn get(&self, side: BodySide) -> &T {
        match side {
            BodySide::Left => &self.left,
            BodySide::Right => &self.right,
        }
    }
}

pub const SHOULDER_ELBOW_BANDS: SideBands<AngleBand> = SideBands {
    left: AngleBand::new(301.6, 305.0),
    right: AngleBand::new(229.0, 233.6),
};

pub const ELBOW_WRIST_BANDS: SideBands<ReachBand> = SideBands {
    left: ReachBand::new(152.0, 137.6),
    right: ReachBand::new(30.0, 50.0),
};

pub const DEFAULT_VERTICAL_TOLERANCE: f64 = 8.5;
pub const DEFAULT_HORIZONTAL_TOLERANCE: f64 = 5.5;

/// Heuristics for the coarse "is the subject in the base stance" gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacingConfig {
    /// Maximum |elbow.y - shoulder.y| relative to shoulder width.
    pub elbow_height_band: f64,
    /// Minimum elbow spread relative to shoulder width.
    pub min_elbow_spread_ratio: f64,
    pub misaligned_arm_penalty: f32,
    pub unflexed_arm_penalty: f32,
    pub narrow_elbows_penalty: f32,
}

impl Default for FacingConfig {
    fn default() -> Self {
        Self {
            elbow_height_band: 0.8,
            min_elbow_spread_ratio: 1.1,
            misaligned_arm_penalty: 0.3,
            unflexed_arm_penalty: 0.2,
            narrow_elbows_penalty: 0.2,
        }
    }
}

/// Calibration for the pose correction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Joints at or below this confidence count as not detected.
    pub min_joint_confidence: f32,
    /// Components below this magnitude are reported as aligned.
    pub alignment_threshold: f64,
    pub vertical_tolerance: f64,
    pub horizontal_tolerance: f64,
    pub shoulder_elbow: SideBands<AngleBand>,
    pub elbow_wrist: SideBands<ReachBand>,
    pub facing: FacingConfig,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            min_joint_confidence: 0.5,
            alignment_threshold: super::geometry::DEFAULT_ALIGNMENT_THRESHOLD,
            vertical_tolerance: DEFAULT_VERTICAL_TOLERANCE,
            horizontal_tolerance: DEFAULT_HORIZONTAL_TOLERANCE,
            shoulder_elbow: SHOULDER_ELBOW_BANDS,
            elbow_wrist: ELBOW_WRIST_BANDS,
            facing: FacingConfig::default(),
        }
    }
}
