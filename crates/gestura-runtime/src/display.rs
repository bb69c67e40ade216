//! Display state
//!
//! Holds the currently shown recognition and the last detector frame for the
//! overlay. Every shown result gets a generation number so that a delayed
//! expiry only clears the result it was scheduled for.

use gestura_core::{Detection, KeypointSet, Timestamp, TranslationResult};

/// Last detector frame, passed through to whoever draws the landmark overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    pub keypoints: KeypointSet,
    pub image_width: u32,
    pub image_height: u32,
    pub mirrored: bool,
}

impl OverlayFrame {
    pub fn from_detection(detection: &Detection) -> Self {
        OverlayFrame {
            keypoints: detection.keypoints.clone(),
            image_width: detection.image_width,
            image_height: detection.image_height,
            mirrored: detection.is_front_camera,
        }
    }

    /// Landmarks in pixel coordinates, one list per hand
    pub fn to_image_space(&self) -> Vec<Vec<(f32, f32)>> {
        let w = self.image_width as f32;
        let h = self.image_height as f32;
        self.keypoints
            .hands
            .iter()
            .map(|hand| {
                hand.landmarks
                    .iter()
                    .map(|lm| {
                        let x = if self.mirrored { 1.0 - lm.x } else { lm.x };
                        (x * w, lm.y * h)
                    })
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct DisplayState {
    current: Option<TranslationResult>,
    shown_at: Option<Timestamp>,
    generation: u64,
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `result`, superseding whatever was shown; returns its generation
    pub fn show(&mut self, result: TranslationResult, now: Timestamp) -> u64 {
        self.generation += 1;
        self.current = Some(result);
        self.shown_at = Some(now);
        self.generation
    }

    /// Clear the result of `generation` if it is still the one shown
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.current.is_none() {
            return false;
        }
        self.current = None;
        self.shown_at = None;
        true
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.current = None;
        self.shown_at = None;
    }

    pub fn current(&self) -> Option<&TranslationResult> {
        self.current.as_ref()
    }

    pub fn shown_at(&self) -> Option<Timestamp> {
        self.shown_at
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
