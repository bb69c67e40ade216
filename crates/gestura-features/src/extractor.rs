//! Feature Extractor - KeypointSet to FeatureVector
//!
//! Layout of the output (126 values):
//!
//! ```text
//! [ hand 0: x0 y0 z0 x1 y1 z1 ... x20 y20 z20 | hand 1: same 63 values ]
//! ```
//!
//! A hand slot is filled from the corresponding detected hand only when that
//! hand has exactly 21 landmarks; otherwise the slot is 63 noise-floor values.
//! Absence of hands is a valid state, never an error.

use gestura_core::{FeatureVector, KeypointSet, FEATURE_LEN, HAND_FEATURE_LEN, MAX_HANDS};

use crate::Noise;

/// Feature extractor
#[derive(Debug, Default)]
pub struct FeatureExtractor {
    noise: Noise,
}

impl FeatureExtractor {
    /// Create an extractor with an entropy-seeded noise source
    pub fn new() -> Self {
        Self::with_noise(Noise::from_entropy())
    }

    pub fn with_noise(noise: Noise) -> Self {
        FeatureExtractor { noise }
    }

    /// Deterministic extractor for tests
    pub fn seeded(seed: u64) -> Self {
        Self::with_noise(Noise::seeded(seed))
    }

    /// Encode one detector frame
    ///
    /// `mirrored` flips x (x -> 1 - x), used for front camera frames.
    pub fn extract(&mut self, keypoints: &KeypointSet, mirrored: bool) -> FeatureVector {
        let mut out = [0.0f32; FEATURE_LEN];

        for slot in 0..MAX_HANDS {
            let block = &mut out[slot * HAND_FEATURE_LEN..(slot + 1) * HAND_FEATURE_LEN];

            match keypoints.hands.get(slot).filter(|h| h.is_well_formed()) {
                Some(hand) => {
                    for (lm, coords) in hand.landmarks.iter().zip(block.chunks_exact_mut(3)) {
                        let lm = if mirrored { lm.mirrored() } else { *lm };
                        coords[0] = self.noise.perturb(lm.x);
                        coords[1] = self.noise.perturb(lm.y);
                        coords[2] = self.noise.perturb(lm.z);
                    }
                }
                None => {
                    if let Some(hand) = keypoints.hands.get(slot) {
                        tracing::trace!(
                            slot,
                            landmarks = hand.landmarks.len(),
                            "malformed hand encoded as noise floor"
                        );
                    }
                    for v in block.iter_mut() {
                        *v = self.noise.floor();
                    }
                }
            }
        }

        FeatureVector::from_array(out)
    }
}
