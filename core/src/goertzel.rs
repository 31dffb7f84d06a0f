//! Single-bin Goertzel power detector.
//!
//! O(N) per frame with two state variables and no transform buffer, which
//! is why the embedded receiver prefers it when only the tag carrier
//! frequency matters.

use std::f32::consts::PI;

/// Goertzel recursion fixed on one target frequency.
#[derive(Debug, Clone, Copy)]
pub struct Goertzel {
    coeff: f32,
}

impl Goertzel {
    pub fn new(sample_rate: f32, target_freq: f32) -> Self {
        let omega = 2.0 * PI * target_freq / sample_rate;
        Self {
            coeff: 2.0 * omega.cos(),
        }
    }

    /// Power at the target frequency for one frame. State is reset per
    /// frame; frames are independent.
    pub fn power(&self, samples: &[f32]) -> f32 {
        let mut s1 = 0.0f32;
        let mut s2 = 0.0f32;
        for &x in samples {
            let s = x + self.coeff * s1 - s2;
            s2 = s1;
            s1 = s;
        }
        s1 * s1 + s2 * s2 - self.coeff * s1 * s2
    }
}
