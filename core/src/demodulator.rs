//! Pipeline facade: one configured receiver running the whole chain.
//!
//! raw signal -> conditioner -> frames -> feature series -> CFAR ->
//! pulse validation -> interval decoding. Every intermediate product is
//! returned so callers can dump diagnostics.

use crate::cfar::{self, CfarResult};
use crate::conditioner::{self, Signal};
use crate::decode::{self, CodeDictionary, DecodedMessage};
use crate::error::Result;
use crate::feature::{FeatureExtractor, FeatureSeries};
use crate::goertzel::Goertzel;
use crate::heterodyne::Heterodyne;
use crate::pulse::{self, PulseCheck};
use crate::spectral::BandMean;
use crate::wavelet::WaveletBank;

/// Which per-frame detection feature to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureMethod {
    /// Raw FFT band-mean.
    Fft,
    /// Blackman-windowed FFT band-mean.
    WindowedFft,
    /// Single-bin Goertzel power.
    Goertzel,
    /// Heterodyne downconvert + FIR chain.
    Heterodyne,
    /// Quadrature wavelet correlation.
    Wavelet,
}

/// Full receiver configuration. The code dictionary is loaded once at
/// startup and passed in here explicitly; the pipeline stages themselves
/// stay pure.
#[derive(Debug, Clone)]
pub struct DemodConfig {
    /// Emulated ADC sample rate in S/s.
    pub adc_rate: f32,
    /// ADC buffer length in samples per frame.
    pub buffer_len: usize,
    pub method: FeatureMethod,
    /// Band-pass edges for the FFT band-mean methods, Hz.
    pub on_freq: f32,
    pub off_freq: f32,
    /// Carrier frequency for Goertzel, heterodyne and wavelet methods, Hz.
    pub target_freq: f32,
    /// Heterodyne local oscillator frequency, Hz.
    pub lo_freq: f32,
    pub antialias_taps: Vec<f32>,
    pub bandpass_taps: Vec<f32>,
    /// Carrier cycles spanned by the wavelet pair.
    pub wavelet_periods: f32,
    /// CFAR reference cells per side.
    pub cfar_cells: usize,
    /// Adaptive threshold offset (0 for the plain detector).
    pub cfar_offset: f32,
    /// Expected pulse width, ms.
    pub pulse_width_ms: f32,
    /// Inter-pulse init interval, seconds.
    pub init_interval_s: f32,
    pub dictionary: CodeDictionary,
}

impl Default for DemodConfig {
    fn default() -> Self {
        Self {
            adc_rate: crate::DEFAULT_ADC_RATE,
            buffer_len: crate::DEFAULT_BUFFER_LEN,
            method: FeatureMethod::Goertzel,
            on_freq: crate::DEFAULT_ON_FREQ,
            off_freq: crate::DEFAULT_OFF_FREQ,
            target_freq: crate::DEFAULT_TARGET_FREQ,
            lo_freq: 55_000.0,
            antialias_taps: vec![0.2; 5],
            bandpass_taps: vec![-0.25, 0.5, -0.25],
            wavelet_periods: 10.0,
            cfar_cells: crate::DEFAULT_CFAR_CELLS,
            cfar_offset: 0.0,
            pulse_width_ms: crate::DEFAULT_PULSE_WIDTH_MS,
            init_interval_s: crate::DEFAULT_INIT_INTERVAL_S,
            dictionary: CodeDictionary::new(),
        }
    }
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone)]
pub struct DemodOutput {
    pub features: FeatureSeries,
    pub cfar: CfarResult,
    pub pulses: PulseCheck,
    pub message: DecodedMessage,
}

pub struct Demodulator {
    config: DemodConfig,
    extractor: FeatureExtractor,
}

impl Demodulator {
    pub fn new(config: DemodConfig) -> Result<Self> {
        let extractor = match config.method {
            FeatureMethod::Fft => FeatureExtractor::Spectral(BandMean::new(
                config.buffer_len,
                config.adc_rate,
                config.on_freq,
                config.off_freq,
                false,
            )?),
            FeatureMethod::WindowedFft => FeatureExtractor::Spectral(BandMean::new(
                config.buffer_len,
                config.adc_rate,
                config.on_freq,
                config.off_freq,
                true,
            )?),
            FeatureMethod::Goertzel => {
                FeatureExtractor::Goertzel(Goertzel::new(config.adc_rate, config.target_freq))
            }
            FeatureMethod::Heterodyne => FeatureExtractor::Heterodyne(Heterodyne::new(
                config.adc_rate,
                config.target_freq,
                config.lo_freq,
                config.antialias_taps.clone(),
                config.bandpass_taps.clone(),
            )?),
            FeatureMethod::Wavelet => FeatureExtractor::Wavelet(WaveletBank::new(
                config.adc_rate,
                config.target_freq,
                config.wavelet_periods,
            )?),
        };
        Ok(Self { config, extractor })
    }

    pub fn config(&self) -> &DemodConfig {
        &self.config
    }

    /// Run the full chain on one acquired signal.
    ///
    /// The signal is downsampled to the ADC rate unless it already is at
    /// that rate; a source below the ADC rate fails with `InvalidFactor`
    /// and aborts the run, since nothing downstream can work without a
    /// valid frame set.
    pub fn run(&self, signal: &Signal) -> Result<DemodOutput> {
        let conditioned = if signal.sample_rate() == self.config.adc_rate {
            signal.clone()
        } else {
            conditioner::resample(signal, self.config.adc_rate)?
        };

        let (frames, _times) = conditioner::frame(&conditioned, self.config.buffer_len)?;
        log::debug!(
            "{} frames of {} samples at {} S/s",
            frames.len(),
            self.config.buffer_len,
            self.config.adc_rate
        );

        let features = self.extractor.series(&frames)?;

        let guard = cfar::guard_cells(
            self.config.pulse_width_ms,
            self.config.adc_rate,
            self.config.buffer_len,
        );
        let cfar = cfar::cfar(
            &features.values,
            guard,
            self.config.cfar_cells,
            self.config.cfar_offset,
        );

        let pulses = pulse::check_pulse(
            &cfar.detect,
            self.config.adc_rate,
            self.config.buffer_len,
            self.config.pulse_width_ms,
        );

        let message = decode::decode_intervals(
            &pulses.end_times,
            self.config.init_interval_s,
            &self.config.dictionary,
        );
        log::info!(
            "{} pings, {} validated pulse end times",
            message.pings,
            pulses.end_times.len()
        );

        Ok(DemodOutput {
            features,
            cfar,
            pulses,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodeOutcome;
    use crate::error::DemodError;

    #[test]
    fn test_upsampling_source_aborts_run() {
        let demod = Demodulator::new(DemodConfig::default()).unwrap();
        let signal = Signal::new(vec![0.0; 1024], 48_000.0).unwrap();
        assert!(matches!(
            demod.run(&signal),
            Err(DemodError::InvalidFactor)
        ));
    }

    #[test]
    fn test_silent_signal_yields_insufficient_data() {
        let demod = Demodulator::new(DemodConfig::default()).unwrap();
        let signal = Signal::new(vec![0.0; 256 * 64], 150_000.0).unwrap();
        let out = demod.run(&signal).unwrap();
        assert_eq!(out.features.len(), 64);
        assert!(out.cfar.detect.iter().all(|&d| d == 0));
        assert_eq!(out.message.pings, 0);
        assert_eq!(out.message.outcome, DecodeOutcome::InsufficientData);
    }

    #[test]
    fn test_all_methods_construct() {
        for method in [
            FeatureMethod::Fft,
            FeatureMethod::WindowedFft,
            FeatureMethod::Goertzel,
            FeatureMethod::Heterodyne,
            FeatureMethod::Wavelet,
        ] {
            let config = DemodConfig {
                method,
                ..DemodConfig::default()
            };
            assert!(Demodulator::new(config).is_ok(), "{method:?}");
        }
    }

    #[test]
    fn test_output_shapes_consistent() {
        let demod = Demodulator::new(DemodConfig::default()).unwrap();
        let signal = Signal::new(vec![0.01; 256 * 10], 150_000.0).unwrap();
        let out = demod.run(&signal).unwrap();
        assert_eq!(out.features.len(), out.cfar.threshold.len());
        assert_eq!(out.cfar.detect.len(), out.pulses.detect.len());
    }
}
