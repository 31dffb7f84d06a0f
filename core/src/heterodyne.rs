//! Heterodyne downconversion feature extraction.
//!
//! Models a superheterodyne receiver chain per frame: mix with a local
//! oscillator cosine, anti-alias low-pass, decimate, band-pass, then take
//! the mean absolute value of the baseband stream as the detection
//! feature.

use std::f32::consts::PI;

use crate::error::{DemodError, Result};
use crate::filter::convolve_same;

pub struct Heterodyne {
    sample_rate: f32,
    lo_freq: f32,
    decimation: usize,
    antialias: Vec<f32>,
    bandpass: Vec<f32>,
}

impl Heterodyne {
    /// The decimation factor is `trunc(f_sig / (f_sig - f_lo))`, tying the
    /// post-mix rate to the intermediate frequency the mix produces.
    pub fn new(
        sample_rate: f32,
        signal_freq: f32,
        lo_freq: f32,
        antialias: Vec<f32>,
        bandpass: Vec<f32>,
    ) -> Result<Self> {
        if !(lo_freq > 0.0 && lo_freq < signal_freq) {
            return Err(DemodError::InvalidConfig(format!(
                "LO frequency {lo_freq} must sit below the signal frequency {signal_freq}"
            )));
        }
        if antialias.is_empty() || bandpass.is_empty() {
            return Err(DemodError::InvalidConfig(
                "FIR coefficient sets must be non-empty".into(),
            ));
        }
        let decimation = (signal_freq / (signal_freq - lo_freq)).trunc() as usize;
        Ok(Self {
            sample_rate,
            lo_freq,
            decimation: decimation.max(1),
            antialias,
            bandpass,
        })
    }

    pub fn decimation(&self) -> usize {
        self.decimation
    }

    /// Mean absolute baseband value for one frame. The LO phase restarts
    /// at every frame, matching the per-buffer processing of the ADC
    /// emulation.
    pub fn feature(&self, samples: &[f32]) -> f32 {
        let mixed: Vec<f32> = samples
            .iter()
            .enumerate()
            .map(|(n, &x)| x * (2.0 * PI * self.lo_freq * n as f32 / self.sample_rate).cos())
            .collect();

        let prefiltered = convolve_same(&mixed, &self.antialias);
        let decimated: Vec<f32> = prefiltered
            .iter()
            .step_by(self.decimation)
            .copied()
            .collect();
        let filtered = convolve_same(&decimated, &self.bandpass);

        if filtered.is_empty() {
            return 0.0;
        }
        filtered.iter().map(|x| x.abs()).sum::<f32>() / filtered.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, sample_rate: f32, len: usize, amp: f32) -> Vec<f32> {
        (0..len)
            .map(|n| amp * (2.0 * PI * freq * n as f32 / sample_rate).sin())
            .collect()
    }

    fn chain() -> Heterodyne {
        // 5-tap moving average as anti-alias, gentle band-pass around the
        // 14 kHz intermediate frequency after decimation
        Heterodyne::new(
            150_000.0,
            69_000.0,
            55_000.0,
            vec![0.2; 5],
            vec![-0.25, 0.5, -0.25],
        )
        .unwrap()
    }

    #[test]
    fn test_decimation_factor_truncated() {
        // 69000 / (69000 - 55000) = 4.93 -> 4
        assert_eq!(chain().decimation(), 4);
    }

    #[test]
    fn test_carrier_produces_energy() {
        let h = chain();
        let on = h.feature(&tone(69_000.0, 150_000.0, 256, 1.0));
        let silence = h.feature(&[0.0; 256]);
        assert!(on > 0.0);
        assert_eq!(silence, 0.0);
    }

    #[test]
    fn test_carrier_vs_far_tone() {
        let h = chain();
        let on = h.feature(&tone(69_000.0, 150_000.0, 256, 1.0));
        let far = h.feature(&tone(5_000.0, 150_000.0, 256, 1.0));
        assert!(
            on > far * 2.0,
            "carrier {on} should dominate far tone {far}"
        );
    }

    #[test]
    fn test_lo_above_signal_rejected() {
        assert!(Heterodyne::new(150_000.0, 69_000.0, 70_000.0, vec![0.2; 5], vec![1.0]).is_err());
    }

    #[test]
    fn test_empty_taps_rejected() {
        assert!(Heterodyne::new(150_000.0, 69_000.0, 55_000.0, vec![], vec![1.0]).is_err());
    }
}
