//! Eye aspect ratio (EAR)

use crate::landmarks::{extract_eyes, EyeContour, LandmarkSample};

/// EAR of a single eye: `(|p2-p6| + |p3-p5|) / (2 * |p1-p4|)`.
///
/// A zero horizontal span, or any non-finite result, yields exactly `0.0`.
pub fn eye_aspect_ratio(eye: &EyeContour) -> f32 {
    let vertical1 = eye.p(2).distance(eye.p(6));
    let vertical2 = eye.p(3).distance(eye.p(5));
    let horizontal = eye.p(1).distance(eye.p(4));

    if horizontal == 0.0 {
        return 0.0;
    }

    let ear = (vertical1 + vertical2) / (2.0 * horizontal);
    if ear.is_finite() {
        ear
    } else {
        0.0
    }
}

/// Mean of the left and right EAR
pub fn average_ear(left: &EyeContour, right: &EyeContour) -> f32 {
    (eye_aspect_ratio(left) + eye_aspect_ratio(right)) / 2.0
}

/// Averaged EAR for a sample, or `None` when either eye is unavailable
pub fn sample_ear(sample: Option<&LandmarkSample>) -> Option<f32> {
    let (left, right) = extract_eyes(sample)?;
    Some(average_ear(&left, &right))
}
