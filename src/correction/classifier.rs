use serde::Serialize;

use super::config::{AngleBand, BandPosition, ReachBand, ELBOW_WRIST_BANDS, SHOULDER_ELBOW_BANDS};
use crate::pose::BodySide;

/// Verdict of a shoulder→elbow check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VerticalVerdict {
    Ideal,
    TooHigh,
    TooLow,
}

impl VerticalVerdict {
    /// Spoken correction, before the side name is spliced in.
    pub fn template(&self) -> Option<&'static str> {
        match self {
            VerticalVerdict::Ideal => None,
            VerticalVerdict::TooHigh => Some("Lower Arm"),
            VerticalVerdict::TooLow => Some("Raise Arm"),
        }
    }
}

/// Verdict of an elbow→wrist check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HorizontalVerdict {
    Ideal,
    TooIn,
    TooOut,
}

impl HorizontalVerdict {
    pub fn template(&self) -> Option<&'static str> {
        match self {
            HorizontalVerdict::Ideal => None,
            HorizontalVerdict::TooIn => Some("Spread Wrist"),
            HorizontalVerdict::TooOut => Some("Tuck Wrist"),
        }
    }
}

/// Classify a front-view shoulder→elbow angle against the default calibration.
pub fn classify_vertical(angle: f64, side: BodySide, tolerance: f64) -> VerticalVerdict {
    vertical_verdict(SHOULDER_ELBOW_BANDS.get(side), angle, side, tolerance)
}

/// Classify a front-view elbow→wrist angle against the default calibration.
pub fn classify_horizontal(angle: f64, side: BodySide, tolerance: f64) -> HorizontalVerdict {
    horizontal_verdict(ELBOW_WRIST_BANDS.get(side), angle, tolerance)
}

/// The left and right arms are measured in mirrored angle space: lowering the left arm makes
/// its angle smaller while lowering the right arm makes it larger.
pub fn vertical_verdict(
    band: &AngleBand,
    angle: f64,
    side: BodySide,
    tolerance: f64,
) -> VerticalVerdict {
    match (band.locate(angle, tolerance), side) {
        (BandPosition::Inside, _) => VerticalVerdict::Ideal,
        (BandPosition::Below, BodySide::Left) | (BandPosition::Above, BodySide::Right) => {
            VerticalVerdict::TooLow
        }
        (BandPosition::Above, BodySide::Left) | (BandPosition::Below, BodySide::Right) => {
            VerticalVerdict::TooHigh
        }
    }
}

pub fn horizontal_verdict(band: &ReachBand, angle: f64, tolerance: f64) -> HorizontalVerdict {
    match (band.as_band().locate(angle, tolerance), band.inward_is_high()) {
        (BandPosition::Inside, _) => HorizontalVerdict::Ideal,
        (BandPosition::Above, true) | (BandPosition::Below, false) => HorizontalVerdict::TooIn,
        (BandPosition::Below, true) | (BandPosition::Above, false) => HorizontalVerdict::TooOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::config::{DEFAULT_HORIZONTAL_TOLERANCE, DEFAULT_VERTICAL_TOLERANCE};

    const V_TOL: f64 = DEFAULT_VERTICAL_TOLERANCE;
    const H_TOL: f64 = DEFAULT_HORIZONTAL_TOLERANCE;

    #[test]
    fn test_left_shoulder_elbow_in_band() {
        assert_eq!(classify_vertical(303.0, BodySide::Left, V_TOL), VerticalVerdict::Ideal);
    }

    #[test]
    fn test_left_shoulder_elbow_below_band_is_too_low() {
        assert_eq!(classify_vertical(290.0, BodySide::Left, V_TOL), VerticalVerdict::TooLow);
        assert_eq!(classify_vertical(320.0, BodySide::Left, V_TOL), VerticalVerdict::TooHigh);
    }

    #[test]
    fn test_right_side_direction_is_inverted() {
        assert_eq!(classify_vertical(231.0, BodySide::Right, V_TOL), VerticalVerdict::Ideal);
        assert_eq!(classify_vertical(250.0, BodySide::Right, V_TOL), VerticalVerdict::TooLow);
        assert_eq!(classify_vertical(210.0, BodySide::Right, V_TOL), VerticalVerdict::TooHigh);
    }

    #[test]
    fn test_vertical_boundaries_are_closed() {
        assert_eq!(
            classify_vertical(301.6 - V_TOL, BodySide::Left, V_TOL),
            VerticalVerdict::Ideal
        );
        assert_eq!(
            classify_vertical(305.0 + V_TOL, BodySide::Left, V_TOL),
            VerticalVerdict::Ideal
        );
        assert_eq!(
            classify_vertical(229.0 - V_TOL, BodySide::Right, V_TOL),
            VerticalVerdict::Ideal
        );
        assert_eq!(
            classify_vertical(233.6 + V_TOL, BodySide::Right, V_TOL),
            VerticalVerdict::Ideal
        );
        assert_eq!(
            classify_vertical(301.6 - V_TOL - 1e-6, BodySide::Left, V_TOL),
            VerticalVerdict::TooLow
        );
    }

    #[test]
    fn test_right_elbow_wrist_too_in() {
        assert_eq!(classify_horizontal(20.0, BodySide::Right, H_TOL), HorizontalVerdict::TooIn);
        assert_eq!(classify_horizontal(40.0, BodySide::Right, H_TOL), HorizontalVerdict::Ideal);
        assert_eq!(classify_horizontal(60.0, BodySide::Right, H_TOL), HorizontalVerdict::TooOut);
    }

    #[test]
    fn test_left_elbow_wrist_direction() {
        assert_eq!(classify_horizontal(145.0, BodySide::Left, H_TOL), HorizontalVerdict::Ideal);
        assert_eq!(classify_horizontal(165.0, BodySide::Left, H_TOL), HorizontalVerdict::TooIn);
        assert_eq!(classify_horizontal(120.0, BodySide::Left, H_TOL), HorizontalVerdict::TooOut);
        assert_eq!(
            classify_horizontal(137.6 - H_TOL, BodySide::Left, H_TOL),
            HorizontalVerdict::Ideal
        );
        assert_eq!(
            classify_horizontal(152.0 + H_TOL, BodySide::Left, H_TOL),
            HorizontalVerdict::Ideal
        );
    }

    #[test]
    fn test_every_angle_gets_a_verdict() {
        for tenth in 0..3600 {
            let angle = tenth as f64 / 10.0;
            for side in [BodySide::Left, BodySide::Right] {
                let vertical = classify_vertical(angle, side, V_TOL);
                let in_band = match side {
                    BodySide::Left => (301.6 - V_TOL..=305.0 + V_TOL).contains(&angle),
                    BodySide::Right => (229.0 - V_TOL..=233.6 + V_TOL).contains(&angle),
                };
                assert_eq!(vertical == VerticalVerdict::Ideal, in_band, "{angle} {side:?}");

                let horizontal = classify_horizontal(angle, side, H_TOL);
                assert_eq!(horizontal.template().is_none(), horizontal == HorizontalVerdict::Ideal);
            }
        }
        let _ = classify_vertical(f64::NAN, BodySide::Left, V_TOL);
    }
}
