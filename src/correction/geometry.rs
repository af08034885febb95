use nalgebra::Vector3;
use serde::Serialize;

/// Components smaller than this are reported as aligned.
pub const DEFAULT_ALIGNMENT_THRESHOLD: f64 = 0.01;

/// Signed offset of one axis of a displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AxisOffset {
    Aligned,
    Positive,
    Negative,
}

impl AxisOffset {
    fn from_component(value: f64, threshold: f64) -> Self {
        if value.abs() < threshold {
            AxisOffset::Aligned
        } else if value > 0.0 {
            AxisOffset::Positive
        } else {
            AxisOffset::Negative
        }
    }
}

/// Orientation of the segment going from one joint to another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngleAnalysis {
    pub vector: Vector3<f64>,
    pub distance: f64,
    /// Front view, degrees in `[0, 360)`.
    pub angle_xy: f64,
    /// Top view, degrees in `[0, 360)`.
    pub angle_xz: f64,
    /// Positive is to the right.
    pub horizontal: AxisOffset,
    /// Positive is up.
    pub vertical: AxisOffset,
    /// Positive is forward, toward the camera (negative z).
    pub depth: AxisOffset,
}

impl AngleAnalysis {
    pub fn describe(&self) -> String {
        let horizontal = match self.horizontal {
            AxisOffset::Aligned => "aligned",
            AxisOffset::Positive => "to the right",
            AxisOffset::Negative => "to the left",
        };
        let vertical = match self.vertical {
            AxisOffset::Aligned => "aligned",
            AxisOffset::Positive => "up",
            AxisOffset::Negative => "down",
        };
        let depth = match self.depth {
            AxisOffset::Aligned => "aligned",
            AxisOffset::Positive => "forward",
            AxisOffset::Negative => "backward",
        };
        format!(
            "xy={:.1}° xz={:.1}° dist={:.3} ({horizontal}, {vertical}, {depth})",
            self.angle_xy, self.angle_xz, self.distance
        )
    }
}

/// Analyze the displacement `to - from`.
pub fn analyze(from: &Vector3<f64>, to: &Vector3<f64>, threshold: f64) -> AngleAnalysis {
    let vector = to - from;

    AngleAnalysis {
        vector,
        distance: vector.norm(),
        angle_xy: plane_angle(vector.x, vector.y),
        angle_xz: plane_angle(vector.x, vector.z),
        horizontal: AxisOffset::from_component(vector.x, threshold),
        vertical: AxisOffset::from_component(vector.y, threshold),
        depth: AxisOffset::from_component(-vector.z, threshold),
    }
}

/// `atan2(dy, dx)` in degrees, normalized to `[0, 360)`.
fn plane_angle(dx: f64, dy: f64) -> f64 {
    let degrees = dy.atan2(dx).to_degrees();
    let normalized = if degrees < 0.0 { degrees + 360.0 } else { degrees };
    // -1e-20 + 360.0 rounds to exactly 360.0
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}
