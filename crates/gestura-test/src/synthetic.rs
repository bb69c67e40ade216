//! Synthetic hand motion
//!
//! Generates detector frames for hands whose wrists travel along a circle.
//! Each hand is a fan of five fingers with four joints each, so every frame
//! carries exactly 21 landmarks per hand unless a malformed frame is drawn.

use std::f32::consts::PI;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gestura_core::{Detection, Hand, KeypointSet, Landmark, LANDMARKS_PER_HAND, MAX_HANDS};

/// Radius of the wrist trajectory (normalized units)
const ORBIT_RADIUS: f32 = 0.25;

/// Spacing of finger joints along a finger
const JOINT_SPACING: f32 = 0.035;

/// Synthetic motion configuration
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Hands per frame
    pub hands: usize,
    /// Wrist travel per frame (normalized units)
    pub speed: f32,
    /// Uniform jitter amplitude on every coordinate
    pub jitter: f32,
    /// Probability of a frame with no hands
    pub dropout_rate: f64,
    /// Probability of a hand missing its last landmark
    pub malformed_rate: f64,
    pub front_camera: bool,
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        SyntheticConfig {
            hands: 1,
            speed: 0.25,
            jitter: 0.002,
            dropout_rate: 0.0,
            malformed_rate: 0.0,
            front_camera: false,
            image_width: 640,
            image_height: 480,
        }
    }
}

impl SyntheticConfig {
    /// Hands held in place
    pub fn still() -> Self {
        SyntheticConfig {
            speed: 0.0,
            jitter: 0.0,
            ..Self::default()
        }
    }

    /// Two hands in motion
    pub fn signing() -> Self {
        SyntheticConfig {
            hands: 2,
            ..Self::default()
        }
    }

    /// Flaky detector: dropped and malformed frames
    pub fn noisy() -> Self {
        SyntheticConfig {
            jitter: 0.01,
            dropout_rate: 0.2,
            malformed_rate: 0.1,
            ..Self::default()
        }
    }

    /// No hands at all
    pub fn empty() -> Self {
        SyntheticConfig {
            hands: 0,
            ..Self::default()
        }
    }
}

/// Seeded generator of detector frames
pub struct SyntheticHands {
    config: SyntheticConfig,
    rng: StdRng,
    phase: f32,
    frames: u64,
}

impl SyntheticHands {
    pub fn new(config: SyntheticConfig, seed: u64) -> Self {
        SyntheticHands {
            config,
            rng: StdRng::seed_from_u64(seed),
            phase: 0.0,
            frames: 0,
        }
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    pub fn set_front_camera(&mut self, front: bool) {
        self.config.front_camera = front;
    }

    /// Frames generated so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Next set of keypoints, advancing the motion by one frame
    pub fn next_keypoints(&mut self) -> KeypointSet {
        self.frames += 1;
        let phase = self.phase;
        self.phase = (self.phase + self.config.speed / ORBIT_RADIUS) % (2.0 * PI);

        if self.rng.gen_bool(self.config.dropout_rate.clamp(0.0, 1.0)) {
            return KeypointSet::empty();
        }

        let hands = (0..self.config.hands.min(MAX_HANDS))
            .map(|index| self.hand(index, phase))
            .collect();
        KeypointSet::new(hands)
    }

    pub fn next_detection(&mut self) -> Detection {
        let keypoints = self.next_keypoints();
        Detection::new(
            keypoints,
            self.config.image_width,
            self.config.image_height,
            self.config.front_camera,
        )
    }

    fn hand(&mut self, index: usize, phase: f32) -> Hand {
        // Second hand mirrors the first around the vertical axis
        let side = if index == 0 { 1.0 } else { -1.0 };
        let wrist_x = 0.5 + side * ORBIT_RADIUS * phase.cos();
        let wrist_y = 0.6 + ORBIT_RADIUS * phase.sin();

        let jitter = Uniform::new_inclusive(-self.config.jitter, self.config.jitter);
        let mut landmarks = Vec::with_capacity(LANDMARKS_PER_HAND);
        landmarks.push(self.point(wrist_x, wrist_y, 0.0, &jitter));

        for finger in 0..5 {
            let angle = -PI / 2.0 + (finger as f32 - 2.0) * 0.3 + 0.2 * phase.sin();
            for joint in 1..=4 {
                let reach = JOINT_SPACING * joint as f32;
                landmarks.push(self.point(
                    wrist_x + side * reach * angle.cos(),
                    wrist_y + reach * angle.sin(),
                    -0.01 * joint as f32,
                    &jitter,
                ));
            }
        }

        if self.rng.gen_bool(self.config.malformed_rate.clamp(0.0, 1.0)) {
            landmarks.pop();
        }
        Hand::new(landmarks)
    }

    fn point(&mut self, x: f32, y: f32, z: f32, jitter: &Uniform<f32>) -> Landmark {
        Landmark::new(
            (x + jitter.sample(&mut self.rng)).clamp(0.0, 1.0),
            (y + jitter.sample(&mut self.rng)).clamp(0.0, 1.0),
            z + jitter.sample(&mut self.rng),
        )
    }
}

impl std::fmt::Debug for SyntheticHands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntheticHands")
            .field("config", &self.config)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_hands() {
        let mut gen = SyntheticHands::new(SyntheticConfig::signing(), 1);
        for _ in 0..50 {
            let set = gen.next_keypoints();
            assert_eq!(set.hands.len(), 2);
            assert_eq!(set.well_formed_hands(), 2);
            for hand in &set.hands {
                for lm in &hand.landmarks {
                    assert!((0.0..=1.0).contains(&lm.x));
                    assert!((0.0..=1.0).contains(&lm.y));
                }
            }
        }
        assert_eq!(gen.frame_count(), 50);
    }

    #[test]
    fn test_seed_reproducible() {
        let mut a = SyntheticHands::new(SyntheticConfig::noisy(), 9);
        let mut b = SyntheticHands::new(SyntheticConfig::noisy(), 9);
        for _ in 0..20 {
            assert_eq!(a.next_detection(), b.next_detection());
        }
    }

    #[test]
    fn test_motion_moves_wrist() {
        let mut gen = SyntheticHands::new(SyntheticConfig::default(), 3);
        let first = gen.next_keypoints();
        let second = gen.next_keypoints();
        let a = first.hands[0].wrist().unwrap();
        let b = second.hands[0].wrist().unwrap();
        assert!(a.distance(b) > 0.2);
    }

    #[test]
    fn test_still_hands_do_not_move() {
        let mut gen = SyntheticHands::new(SyntheticConfig::still(), 3);
        assert_eq!(gen.next_keypoints(), gen.next_keypoints());
    }

    #[test]
    fn test_noisy_produces_dropouts_and_malformed() {
        let mut gen = SyntheticHands::new(SyntheticConfig::noisy(), 5);
        let frames: Vec<KeypointSet> = (0..500).map(|_| gen.next_keypoints()).collect();
        assert!(frames.iter().any(|f| f.is_empty()));
        assert!(frames
            .iter()
            .any(|f| f.hands.first().map(|h| !h.is_well_formed()).unwrap_or(false)));
    }

    #[test]
    fn test_front_camera_flag() {
        let mut gen = SyntheticHands::new(SyntheticConfig::default(), 0);
        assert!(!gen.next_detection().is_front_camera);
        gen.set_front_camera(true);
        assert!(gen.next_detection().is_front_camera);
    }
}
