//! Analysis windows shared by the spectral and wavelet feature extractors.

use std::f32::consts::PI;

/// Symmetric Hann window with zero endpoints.
pub fn hann(len: usize) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f32;
    (0..len)
        .map(|n| 0.5 * (1.0 - (2.0 * PI * n as f32 / denom).cos()))
        .collect()
}

/// Symmetric Blackman window.
pub fn blackman(len: usize) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f32;
    (0..len)
        .map(|n| {
            let x = 2.0 * PI * n as f32 / denom;
            0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
        })
        .collect()
}
