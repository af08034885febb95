use crate::pose::BodySide;

/// Side name the subject hears for a joint the pose source labelled `side`.
///
/// The source labels from the camera's point of view, so its left arm is the subject's right.
/// This is the only place the inversion happens.
pub fn spoken_side(side: BodySide) -> &'static str {
    match side {
        BodySide::Left => "Right",
        BodySide::Right => "Left",
    }
}

/// Insert the spoken side name after the first word: `"Lower Arm"` → `"Lower Right Arm"`.
///
/// Templates without a space are returned unchanged.
pub fn splice_side(template: &str, side: BodySide) -> String {
    match template.split_once(' ') {
        Some((verb, rest)) => format!("{verb} {} {rest}", spoken_side(side)),
        None => template.to_string(),
    }
}
