//! Acoustic tag telemetry demodulator
//!
//! Emulates what a resource-constrained embedded receiver does to decode
//! coded pulse trains (PPM fish-tag pings) from a sampled waveform:
//! downsample to the ADC rate, buffer into fixed frames, extract one
//! detection feature per frame, CFAR-threshold against local noise,
//! validate pulse widths and decode the ID from inter-pulse intervals.

pub mod cfar;
pub mod conditioner;
pub mod decode;
pub mod demodulator;
pub mod error;
pub mod feature;
pub mod filter;
pub mod goertzel;
pub mod heterodyne;
pub mod pulse;
pub mod spectral;
pub mod wavelet;
pub mod window;

pub use conditioner::{Frame, Signal};
pub use decode::{CodeDictionary, DecodeOutcome, DecodedMessage};
pub use demodulator::{DemodConfig, DemodOutput, Demodulator, FeatureMethod};
pub use error::{DemodError, Result};
pub use feature::{FeatureExtractor, FeatureSeries};

// Acquisition defaults (embedded receiver profile)
pub const DEFAULT_ADC_RATE: f32 = 150_000.0;
pub const DEFAULT_BUFFER_LEN: usize = 256;

// Detection band defaults (69 kHz tag carrier)
pub const DEFAULT_ON_FREQ: f32 = 68_000.0;
pub const DEFAULT_OFF_FREQ: f32 = 70_000.0;
pub const DEFAULT_TARGET_FREQ: f32 = 69_000.0;

// Pulse timing defaults
pub const DEFAULT_PULSE_WIDTH_MS: f32 = 5.0;
pub const DEFAULT_INIT_INTERVAL_S: f32 = 0.34;
pub const DEFAULT_CFAR_CELLS: usize = 10;

/// Pulse width acceptance tolerance in seconds (2 ms each side)
pub const PULSE_TOLERANCE_S: f32 = 0.002;

/// Minimum spacing before a stale rising edge may validate a pulse (100 ms)
pub const FALLBACK_HOLDOFF_S: f32 = 0.1;
