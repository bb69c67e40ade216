//! Feature vectors and sequences
//!
//! A [`FeatureVector`] is the fixed 126-value encoding of one detector frame:
//! hand 1 (21 landmarks x 3 coordinates) followed by hand 2. A [`Sequence`]
//! is the flattened concatenation of [`SEQUENCE_FRAMES`] vectors sent to the
//! recognizer in one request.

use crate::{GesturaError, GesturaResult, LANDMARKS_PER_HAND, MAX_HANDS};

/// Values per hand (21 x 3)
pub const HAND_FEATURE_LEN: usize = LANDMARKS_PER_HAND * 3;

/// Values per feature vector (2 hands)
pub const FEATURE_LEN: usize = HAND_FEATURE_LEN * MAX_HANDS;

/// Frames per sequence
pub const SEQUENCE_FRAMES: usize = 10;

/// Values per sequence
pub const SEQUENCE_LEN: usize = FEATURE_LEN * SEQUENCE_FRAMES;

/// Total span of the perturbation added to every coordinate
pub const NOISE_AMPLITUDE: f32 = 1e-4;

/// Values with magnitude at or below this are indistinguishable from the noise floor
pub const NOISE_EPSILON: f32 = NOISE_AMPLITUDE;

/// Encoded detector frame, always exactly [`FEATURE_LEN`] values
#[derive(Clone, PartialEq)]
pub struct FeatureVector([f32; FEATURE_LEN]);

impl FeatureVector {
    pub fn from_array(values: [f32; FEATURE_LEN]) -> Self {
        FeatureVector(values)
    }

    /// Build from a slice, failing unless it holds exactly 126 values
    pub fn from_slice(values: &[f32]) -> GesturaResult<Self> {
        let array: [f32; FEATURE_LEN] = values.try_into().map_err(|_| GesturaError::FeatureLength {
            expected: FEATURE_LEN,
            actual: values.len(),
        })?;
        Ok(FeatureVector(array))
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        FEATURE_LEN
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The 63-value block of hand `index` (0 or 1)
    pub fn hand(&self, index: usize) -> &[f32] {
        let start = index.min(MAX_HANDS - 1) * HAND_FEATURE_LEN;
        &self.0[start..start + HAND_FEATURE_LEN]
    }

    /// Every value of hand `index` is within the noise floor
    pub fn hand_is_noise_floor(&self, index: usize) -> bool {
        self.hand(index).iter().all(|v| v.abs() <= NOISE_EPSILON)
    }

    /// Every value is within the noise floor (no hand was encoded)
    pub fn is_noise_floor(&self) -> bool {
        self.0.iter().all(|v| v.abs() <= NOISE_EPSILON)
    }

    /// Count of values that are not exactly zero
    pub fn nonzero_count(&self) -> usize {
        self.0.iter().filter(|v| **v != 0.0).count()
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }
}

impl AsRef<[f32]> for FeatureVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

impl TryFrom<Vec<f32>> for FeatureVector {
    type Error = GesturaError;

    fn try_from(values: Vec<f32>) -> GesturaResult<Self> {
        FeatureVector::from_slice(&values)
    }
}

impl std::fmt::Debug for FeatureVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FeatureVector(hand0={}, hand1={})",
            if self.hand_is_noise_floor(0) { "empty" } else { "present" },
            if self.hand_is_noise_floor(1) { "empty" } else { "present" },
        )
    }
}

/// Flattened window of feature vectors, or empty when no window was ready
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sequence {
    values: Vec<f32>,
}

impl Sequence {
    /// The "not ready" sequence
    pub fn empty() -> Self {
        Self::default()
    }

    /// Concatenate frames in order
    pub fn from_frames(frames: &[FeatureVector]) -> Self {
        let mut values = Vec::with_capacity(frames.len() * FEATURE_LEN);
        for frame in frames {
            values.extend_from_slice(frame.as_slice());
        }
        Sequence { values }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Number of whole frames
    pub fn frame_count(&self) -> usize {
        self.values.len() / FEATURE_LEN
    }

    /// Frame `index` as a 126-value slice
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(FEATURE_LEN)?;
        self.values.get(start..start + FEATURE_LEN)
    }

    pub fn frames(&self) -> impl Iterator<Item = &[f32]> {
        self.values.chunks_exact(FEATURE_LEN)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl AsRef<[f32]> for Sequence {
    fn as_ref(&self) -> &[f32] {
        &self.values
    }
}
