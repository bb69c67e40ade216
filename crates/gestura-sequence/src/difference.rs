//! Frame difference score

use gestura_core::FeatureVector;

/// Weight applied to coordinates where either frame is non-zero
pub const NONZERO_WEIGHT: f32 = 1.5;

/// Weighted mean absolute difference between two frames
///
/// Each coordinate pair contributes `|a - b|`, scaled by [`NONZERO_WEIGHT`]
/// when either side is non-zero. The sum is divided by the number of
/// non-zero-contributing coordinates; with none the score is 0.
pub fn frame_difference(a: &FeatureVector, b: &FeatureVector) -> f32 {
    let mut total = 0.0f32;
    let mut contributing = 0usize;

    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        let diff = (x - y).abs();
        if *x != 0.0 || *y != 0.0 {
            total += diff * NONZERO_WEIGHT;
            contributing += 1;
        } else {
            total += diff;
        }
    }

    if contributing == 0 {
        return 0.0;
    }
    total / contributing as f32
}
