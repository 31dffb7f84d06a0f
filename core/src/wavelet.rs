//! Quadrature wavelet correlation feature extraction.
//!
//! Matched-filter style detector: the frame is convolved against a
//! sine/cosine wavelet pair under a Hann envelope and the peak envelope
//! magnitude `sqrt(cos^2 + sin^2)` is the feature, making detection
//! insensitive to carrier phase.

use std::f32::consts::PI;

use crate::error::{DemodError, Result};
use crate::filter::convolve_full;
use crate::window::hann;

pub struct WaveletBank {
    sine: Vec<f32>,
    cosine: Vec<f32>,
}

impl WaveletBank {
    /// Build the quadrature pair for `periods` carrier cycles at
    /// `center_freq`. The phase step is `2*pi / (Fs / f)` radians per
    /// sample, so the wavelet length tracks the sample rate.
    pub fn new(sample_rate: f32, center_freq: f32, periods: f32) -> Result<Self> {
        if center_freq <= 0.0 || center_freq * 2.0 > sample_rate {
            return Err(DemodError::InvalidConfig(format!(
                "center frequency {center_freq} outside (0, Fs/2) at Fs {sample_rate}"
            )));
        }
        if periods <= 0.0 {
            return Err(DemodError::InvalidConfig(
                "wavelet must span a positive number of periods".into(),
            ));
        }

        let step = 2.0 * PI / (sample_rate / center_freq);
        let total = periods * 2.0 * PI;
        let mut phase = Vec::new();
        let mut k = 0usize;
        while (k as f32) * step < total {
            phase.push(k as f32 * step);
            k += 1;
        }
        if phase.is_empty() {
            return Err(DemodError::InvalidConfig(
                "wavelet length rounds to zero samples".into(),
            ));
        }

        let envelope = hann(phase.len());
        let sine = phase
            .iter()
            .zip(envelope.iter())
            .map(|(&p, &w)| -p.sin() * w)
            .collect();
        let cosine = phase
            .iter()
            .zip(envelope.iter())
            .map(|(&p, &w)| p.cos() * w)
            .collect();
        Ok(Self { sine, cosine })
    }

    pub fn len(&self) -> usize {
        self.sine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sine.is_empty()
    }

    /// Peak quadrature envelope over the full convolution of one frame.
    pub fn feature(&self, samples: &[f32]) -> f32 {
        let conv_sin = convolve_full(samples, &self.sine);
        let conv_cos = convolve_full(samples, &self.cosine);
        conv_sin
            .iter()
            .zip(conv_cos.iter())
            .map(|(&s, &c)| (s * s + c * c).sqrt())
            .fold(0.0f32, f32::max)
    }
}
