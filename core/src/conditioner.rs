//! Signal conditioning: ADC rate matching and fixed-length frame buffering
//!
//! Reproduces the acquisition front-end of the embedded receiver. The
//! decimation keeps the sample at `floor(k * factor)` for a real-valued
//! factor, so a fractional factor yields a repeating skip pattern rather
//! than a fixed stride.

use crate::error::{DemodError, Result};

/// Immutable sampled waveform plus its sample rate in Hz.
#[derive(Debug, Clone)]
pub struct Signal {
    samples: Vec<f32>,
    sample_rate: f32,
}

impl Signal {
    pub fn new(samples: Vec<f32>, sample_rate: f32) -> Result<Self> {
        if sample_rate <= 0.0 || !sample_rate.is_finite() {
            return Err(DemodError::InvalidConfig(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate
    }
}

/// One ADC buffer worth of samples plus its start time in seconds.
///
/// Invariant: every frame produced by [`frame`] holds exactly the
/// configured buffer length of samples.
#[derive(Debug, Clone)]
pub struct Frame {
    pub samples: Vec<f32>,
    pub start_time: f32,
}

/// Reduce `signal` to `target_rate` the way the ADC emulation does it:
/// accumulate the real-valued decimation factor and keep the sample at
/// the floor of the accumulator.
///
/// Fails with [`DemodError::InvalidFactor`] when the factor is not
/// strictly greater than 1 (the receiver only ever downsamples).
pub fn resample(signal: &Signal, target_rate: f32) -> Result<Signal> {
    let factor = f64::from(signal.sample_rate()) / f64::from(target_rate);
    if !(factor > 1.0) {
        return Err(DemodError::InvalidFactor);
    }

    let data = signal.samples();
    let mut kept = Vec::with_capacity((data.len() as f64 / factor).ceil() as usize);
    let mut pos = 0.0f64;
    while pos < data.len() as f64 {
        kept.push(data[pos.floor() as usize]);
        pos += factor;
    }

    log::debug!(
        "resampled {} -> {} samples (factor {:.4})",
        data.len(),
        kept.len(),
        factor
    );
    Signal::new(kept, target_rate)
}

/// Slice a signal into consecutive non-overlapping frames of `length`
/// samples, padding the tail with the running mean of everything buffered
/// so far (recomputed after each append) so the padding does not bias the
/// tail energy. Frame `i` starts at `i * length / sample_rate` seconds.
///
/// Input whose length is already a multiple of `length` gets no padding.
pub fn frame(signal: &Signal, length: usize) -> Result<(Vec<Frame>, Vec<f32>)> {
    if length == 0 {
        return Err(DemodError::InvalidConfig(
            "frame length must be non-zero".into(),
        ));
    }

    let mut data = signal.samples().to_vec();
    while data.len() % length != 0 {
        let mean = data.iter().sum::<f32>() / data.len() as f32;
        data.push(mean);
    }

    let frame_count = data.len() / length;
    let mut frames = Vec::with_capacity(frame_count);
    let mut times = Vec::with_capacity(frame_count);
    for (i, chunk) in data.chunks_exact(length).enumerate() {
        let start_time = (i * length) as f32 / signal.sample_rate();
        frames.push(Frame {
            samples: chunk.to_vec(),
            start_time,
        });
        times.push(start_time);
    }

    Ok((frames, times))
}
