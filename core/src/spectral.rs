//! FFT band-mean feature extraction (raw and Blackman-windowed variants).

use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{DemodError, Result};
use crate::window::blackman;

/// Mean single-sided spectral magnitude over a configured frequency band,
/// one scalar per frame.
///
/// The magnitude spectrum is scaled by `2/N` and the DC bin is discarded
/// before the band statistic so amplitude offsets cannot bias detection.
/// Band bins are `lb = floor(on * N / Fs)` inclusive to
/// `ub = ceil(off * N / Fs)` exclusive, clamped to the Nyquist bin.
pub struct BandMean {
    fft: Arc<dyn Fft<f32>>,
    frame_len: usize,
    sample_rate: f32,
    lb: usize,
    ub: usize,
    window: Option<Vec<f32>>,
}

impl BandMean {
    /// `windowed` selects the Blackman-windowed variant, needed whenever
    /// buffers are short relative to the wavelength and leakage would
    /// smear the band.
    pub fn new(
        frame_len: usize,
        sample_rate: f32,
        on_freq: f32,
        off_freq: f32,
        windowed: bool,
    ) -> Result<Self> {
        if frame_len == 0 {
            return Err(DemodError::InvalidConfig("frame length must be non-zero".into()));
        }
        if !(on_freq < off_freq) {
            return Err(DemodError::InvalidConfig(format!(
                "band edges must satisfy on < off, got {on_freq} >= {off_freq}"
            )));
        }

        let n = frame_len as f32;
        let lb = (on_freq * n / sample_rate).floor() as usize;
        let ub = ((off_freq * n / sample_rate).ceil() as usize).min(frame_len / 2);
        if lb >= ub {
            return Err(DemodError::InvalidConfig(format!(
                "band {on_freq}-{off_freq} Hz maps to no bins at Fs {sample_rate}"
            )));
        }

        let mut planner = FftPlanner::new();
        Ok(Self {
            fft: planner.plan_fft_forward(frame_len),
            frame_len,
            sample_rate,
            lb,
            ub,
            window: windowed.then(|| blackman(frame_len)),
        })
    }

    /// Band edges in Hz after bin quantization, for diagnostics.
    pub fn band_edges(&self) -> (f32, f32) {
        let bin = self.sample_rate / self.frame_len as f32;
        (self.lb as f32 * bin, self.ub as f32 * bin)
    }

    /// Mean magnitude over the configured band for one frame.
    pub fn feature(&self, samples: &[f32]) -> Result<f32> {
        if samples.len() != self.frame_len {
            return Err(DemodError::InvalidInputSize);
        }

        let mut buf: Vec<Complex<f32>> = match &self.window {
            Some(w) => samples
                .iter()
                .zip(w.iter())
                .map(|(&x, &wn)| Complex::new(x * wn, 0.0))
                .collect(),
            None => samples.iter().map(|&x| Complex::new(x, 0.0)).collect(),
        };
        self.fft.process(&mut buf);

        let scale = 2.0 / self.frame_len as f32;
        let mut sum = 0.0f32;
        for k in self.lb..self.ub {
            // the zeroed DC bin still counts toward the mean's divisor
            if k == 0 {
                continue;
            }
            sum += scale * buf[k].norm();
        }
        Ok(sum / (self.ub - self.lb) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(freq: f32, sample_rate: f32, len: usize, amp: f32) -> Vec<f32> {
        (0..len)
            .map(|n| amp * (2.0 * PI * freq * n as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_single_bin_tone_amplitude() {
        // 1 kHz at 8 kS/s with N = 256 is exactly bin 32; an unwindowed
        // band covering only that bin recovers the tone amplitude
        let fs = 8000.0;
        let n = 256;
        let bin_hz = fs / n as f32;
        let bm = BandMean::new(n, fs, 1000.0, 1000.0 + bin_hz * 0.5, false).unwrap();
        let frame = tone(1000.0, fs, n, 0.8);
        let f = bm.feature(&frame).unwrap();
        assert!((f - 0.8).abs() / 0.8 < 0.01, "feature {f} vs amplitude 0.8");
    }

    #[test]
    fn test_out_of_band_tone_rejected() {
        let fs = 8000.0;
        let n = 256;
        let bm = BandMean::new(n, fs, 900.0, 1100.0, true).unwrap();
        let in_band = bm.feature(&tone(1000.0, fs, n, 1.0)).unwrap();
        let out_band = bm.feature(&tone(3000.0, fs, n, 1.0)).unwrap();
        assert!(
            out_band < in_band * 0.01,
            "out-of-band {out_band} should be under 1% of in-band {in_band}"
        );
    }

    #[test]
    fn test_dc_bin_discarded() {
        let fs = 8000.0;
        let n = 256;
        // band starting at 0 Hz still ignores the DC bin
        let bm = BandMean::new(n, fs, 0.0, 200.0, false).unwrap();
        let f = bm.feature(&vec![5.0; n]).unwrap();
        assert!(f.abs() < 1e-3, "DC offset leaked into the feature: {f}");
    }

    #[test]
    fn test_windowed_variant_detects_offbin_tone() {
        // a tone between bins leaks badly without a window; the Blackman
        // variant must still see most of its energy inside the band
        let fs = 150_000.0;
        let n = 256;
        let bm = BandMean::new(n, fs, 68_000.0, 70_000.0, true).unwrap();
        let in_band = bm.feature(&tone(69_000.0, fs, n, 1.0)).unwrap();
        let far = bm.feature(&tone(20_000.0, fs, n, 1.0)).unwrap();
        assert!(in_band > far * 50.0);
    }

    #[test]
    fn test_band_edges_quantized() {
        let bm = BandMean::new(256, 150_000.0, 68_000.0, 70_000.0, false).unwrap();
        let (lo, hi) = bm.band_edges();
        assert!(lo <= 68_000.0 && hi >= 70_000.0);
    }

    #[test]
    fn test_invalid_band_rejected() {
        assert!(BandMean::new(256, 8000.0, 1100.0, 900.0, false).is_err());
        // band entirely above Nyquist
        assert!(BandMean::new(256, 8000.0, 5000.0, 6000.0, false).is_err());
    }

    #[test]
    fn test_wrong_frame_length_rejected() {
        let bm = BandMean::new(256, 8000.0, 900.0, 1100.0, false).unwrap();
        assert!(matches!(
            bm.feature(&[0.0; 128]),
            Err(DemodError::InvalidInputSize)
        ));
    }
}
