//! Keypoint model - what the hand detector delivers
//!
//! A detector frame holds zero, one or two hands. Each hand is an ordered list
//! of landmarks in normalized image coordinates. Only hands with exactly
//! [`LANDMARKS_PER_HAND`] landmarks are considered well-formed.

/// Landmarks in a well-formed hand
pub const LANDMARKS_PER_HAND: usize = 21;

/// Hands encoded per feature vector
pub const MAX_HANDS: usize = 2;

/// Single tracked point of a hand (normalized coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Horizontally mirrored landmark (x -> 1 - x)
    pub fn mirrored(&self) -> Landmark {
        Landmark {
            x: 1.0 - self.x,
            y: self.y,
            z: self.z,
        }
    }

    /// Distance to another landmark
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// One detected hand
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
}

impl Hand {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Exactly 21 landmarks
    pub fn is_well_formed(&self) -> bool {
        self.landmarks.len() == LANDMARKS_PER_HAND
    }

    /// Wrist landmark (index 0) if present
    pub fn wrist(&self) -> Option<&Landmark> {
        self.landmarks.first()
    }
}

/// One detector output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeypointSet {
    pub hands: Vec<Hand>,
}

impl KeypointSet {
    pub fn new(hands: Vec<Hand>) -> Self {
        Self { hands }
    }

    /// No hands detected
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }

    /// Number of well-formed hands among the ones that get encoded
    pub fn well_formed_hands(&self) -> usize {
        self.hands
            .iter()
            .take(MAX_HANDS)
            .filter(|h| h.is_well_formed())
            .count()
    }
}

/// Detector envelope: keypoints plus the frame they were found in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub keypoints: KeypointSet,
    pub image_width: u32,
    pub image_height: u32,
    /// Front camera frames are mirrored before encoding
    pub is_front_camera: bool,
}

impl Detection {
    pub fn new(keypoints: KeypointSet, image_width: u32, image_height: u32, is_front_camera: bool) -> Self {
        Self {
            keypoints,
            image_width,
            image_height,
            is_front_camera,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(n: usize) -> Hand {
        Hand::new((0..n).map(|i| Landmark::new(i as f32 * 0.01, 0.5, 0.0)).collect())
    }

    #[test]
    fn test_hand_well_formed() {
        assert!(hand(21).is_well_formed());
        assert!(!hand(20).is_well_formed());
        assert!(!hand(22).is_well_formed());
        assert!(!Hand::default().is_well_formed());
    }

    #[test]
    fn test_well_formed_hands_counts_first_two_only() {
        let set = KeypointSet::new(vec![hand(21), hand(5), hand(21)]);
        assert_eq!(set.well_formed_hands(), 1);
        assert!(KeypointSet::empty().is_empty());
    }

    #[test]
    fn test_landmark_mirror() {
        let lm = Landmark::new(0.2, 0.4, -0.1);
        let m = lm.mirrored();
        assert!((m.x - 0.8).abs() < 1e-6);
        assert_eq!(m.y, lm.y);
        assert_eq!(m.z, lm.z);
        assert!((lm.distance(&m) - 0.6).abs() < 1e-6);
    }
}
