//! The interchangeable per-frame feature algorithms and the series they
//! produce.

use crate::conditioner::Frame;
use crate::error::Result;
use crate::goertzel::Goertzel;
use crate::heterodyne::Heterodyne;
use crate::spectral::BandMean;
use crate::wavelet::WaveletBank;

/// Ordered (timestamp, scalar) pairs, one entry per frame.
///
/// Invariant: length equals the frame count and timestamps are the frame
/// start times, non-decreasing.
#[derive(Debug, Clone, Default)]
pub struct FeatureSeries {
    pub times: Vec<f32>,
    pub values: Vec<f32>,
}

impl FeatureSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One configured `Frame -> scalar` algorithm.
///
/// The five algorithms form one polymorphic family over the same
/// contract; callers select a variant by configuration and compose the
/// per-frame outputs into a [`FeatureSeries`].
pub enum FeatureExtractor {
    /// FFT band-mean, raw or Blackman-windowed.
    Spectral(BandMean),
    /// Single-bin Goertzel power.
    Goertzel(Goertzel),
    /// Heterodyne downconvert, filter, decimate, mean absolute value.
    Heterodyne(Heterodyne),
    /// Quadrature wavelet correlation peak.
    Wavelet(WaveletBank),
}

impl FeatureExtractor {
    pub fn extract(&self, frame: &Frame) -> Result<f32> {
        match self {
            FeatureExtractor::Spectral(bm) => bm.feature(&frame.samples),
            FeatureExtractor::Goertzel(g) => Ok(g.power(&frame.samples)),
            FeatureExtractor::Heterodyne(h) => Ok(h.feature(&frame.samples)),
            FeatureExtractor::Wavelet(w) => Ok(w.feature(&frame.samples)),
        }
    }

    /// Run the extractor over every frame, one value per frame in frame
    /// order.
    pub fn series(&self, frames: &[Frame]) -> Result<FeatureSeries> {
        let mut times = Vec::with_capacity(frames.len());
        let mut values = Vec::with_capacity(frames.len());
        for frame in frames {
            times.push(frame.start_time);
            values.push(self.extract(frame)?);
        }
        Ok(FeatureSeries { times, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditioner::{frame, Signal};
    use std::f32::consts::PI;

    #[test]
    fn test_series_aligned_with_frames() {
        let samples: Vec<f32> = (0..1024)
            .map(|n| (2.0 * PI * 1000.0 * n as f32 / 8000.0).sin())
            .collect();
        let signal = Signal::new(samples, 8000.0).unwrap();
        let (frames, times) = frame(&signal, 256).unwrap();

        let extractor = FeatureExtractor::Goertzel(Goertzel::new(8000.0, 1000.0));
        let series = extractor.series(&frames).unwrap();

        assert_eq!(series.len(), frames.len());
        assert_eq!(series.times, times);
        assert!(series.times.windows(2).all(|w| w[0] <= w[1]));
        assert!(series.values.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_extractors_agree_on_presence() {
        // every algorithm must rank a carrier frame above a silent frame
        let fs = 150_000.0;
        let carrier = Frame {
            samples: (0..256)
                .map(|n| (2.0 * PI * 69_000.0 * n as f32 / fs).sin())
                .collect(),
            start_time: 0.0,
        };
        let silent = Frame {
            samples: vec![0.0; 256],
            start_time: 0.0,
        };

        let extractors = [
            FeatureExtractor::Spectral(
                BandMean::new(256, fs, 68_000.0, 70_000.0, true).unwrap(),
            ),
            FeatureExtractor::Goertzel(Goertzel::new(fs, 69_000.0)),
            FeatureExtractor::Heterodyne(
                Heterodyne::new(fs, 69_000.0, 55_000.0, vec![0.2; 5], vec![-0.25, 0.5, -0.25])
                    .unwrap(),
            ),
            FeatureExtractor::Wavelet(WaveletBank::new(fs, 69_000.0, 10.0).unwrap()),
        ];

        for extractor in &extractors {
            let on = extractor.extract(&carrier).unwrap();
            let off = extractor.extract(&silent).unwrap();
            assert!(on > off, "carrier {on} should beat silence {off}");
        }
    }
}
