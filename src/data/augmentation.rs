// ============================================================
// Layer 4 — Augmentation
// ============================================================
// Distortions applied to training inputs at batch time:
//
//   noise_std — add N(0, noise_std²) to every feature
//   drop_prob — zero each feature with this probability
//
// Evaluation normally runs undistorted, but may be given an
// augmentation to measure robustness.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Augmentation {
    pub noise_std: f32,
    pub drop_prob: f32,
}

impl Augmentation {
    pub fn new(noise_std: f32, drop_prob: f32) -> Self {
        Self { noise_std, drop_prob }
    }

    pub fn is_identity(&self) -> bool {
        self.noise_std <= 0.0 && self.drop_prob <= 0.0
    }

    /// `None` when the augmentation would not change anything.
    pub fn non_identity(self) -> Option<Self> {
        (!self.is_identity()).then_some(self)
    }

    pub fn apply<R: Rng + ?Sized>(&self, features: &mut [f32], rng: &mut R) {
        for x in features.iter_mut() {
            if self.drop_prob > 0.0 && rng.gen::<f32>() < self.drop_prob {
                *x = 0.0;
                continue;
            }
            if self.noise_std > 0.0 {
                *x += self.noise_std * standard_normal(rng);
            }
        }
    }
}

/// One draw from N(0, 1).
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    StandardNormal.sample(rng)
}
