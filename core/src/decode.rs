//! ID decoding from validated pulse timing.
//!
//! Two independent strategies over the same contract:
//! - interval-dictionary: quantize successive pulse end-time differences
//!   to centiseconds and look them up against a code dictionary;
//! - correlation-mask: cross-correlate the packetized detection stream
//!   against a mask of expected pulse positions for a known ID.

use std::collections::BTreeMap;

use crate::error::{DemodError, Result};

/// Read-only mapping from a quantized inter-pulse interval in
/// centiseconds to the symbol it encodes. Supplied by configuration at
/// startup and passed explicitly into every decode run.
#[derive(Debug, Clone, Default)]
pub struct CodeDictionary {
    map: BTreeMap<i64, String>,
}

impl CodeDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        Self {
            map: entries
                .into_iter()
                .map(|(k, v)| (k, v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, interval_cs: i64, symbol: impl Into<String>) {
        self.map.insert(interval_cs, symbol.into());
    }

    pub fn get(&self, interval_cs: i64) -> Option<&str> {
        self.map.get(&interval_cs).map(String::as_str)
    }

    pub fn min_interval(&self) -> Option<i64> {
        self.map.keys().next().copied()
    }

    pub fn max_interval(&self) -> Option<i64> {
        self.map.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Outcome of one decode run. Fewer than three pulses cannot anchor a
/// single interval pair, so the decoder reports that explicitly rather
/// than returning a silently empty message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Message(Vec<String>),
    InsufficientData,
}

/// Decoded symbol sequence plus the number of pulses that reached the
/// decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    pub pings: usize,
    pub outcome: DecodeOutcome,
}

fn to_centiseconds(seconds: f32) -> i64 {
    (f64::from(seconds) * 100.0).round() as i64
}

/// Interval-dictionary decoding of ordered pulse end timestamps.
///
/// Per interval (rounded to centiseconds): the init interval emits
/// "init"; an even interval in `(init, max(dict)]` is looked up; an
/// interval in `(2*min, 2*max)` reads as two merged or dropped symbols
/// and emits a "null" pair; anything else is skipped.
pub fn decode_intervals(
    end_times: &[f32],
    init_interval_s: f32,
    dict: &CodeDictionary,
) -> DecodedMessage {
    let pings = end_times.len();
    if pings <= 2 {
        log::debug!("only {pings} pings, not enough to decode");
        return DecodedMessage {
            pings,
            outcome: DecodeOutcome::InsufficientData,
        };
    }

    let init = to_centiseconds(init_interval_s);
    let mut symbols = Vec::new();

    for pair in end_times.windows(2) {
        let diff = to_centiseconds(pair[1] - pair[0]);

        if diff == init {
            symbols.push("init".to_string());
            continue;
        }

        let (Some(min), Some(max)) = (dict.min_interval(), dict.max_interval()) else {
            continue;
        };

        if diff % 2 == 0 && init < diff && diff <= max {
            match dict.get(diff) {
                Some(symbol) => symbols.push(symbol.to_string()),
                None => log::warn!("interval {diff} cs has no dictionary entry"),
            }
        } else if diff > 2 * min && diff < 2 * max {
            symbols.push("null".to_string());
            symbols.push("null".to_string());
        }
    }

    DecodedMessage {
        pings,
        outcome: DecodeOutcome::Message(symbols),
    }
}

/// Valid-mode correlation of the packetized detection stream against an
/// ID mask, plus the offset of an exact alignment if one exists.
#[derive(Debug, Clone)]
pub struct IdCorrelation {
    pub correlation: Vec<u32>,
    pub weight: u32,
    pub position: Option<usize>,
}

/// Build the expected-position mask for a known ID from its per-symbol
/// spacings (milliseconds). Each cumulative spacing is rounded to the
/// nearest packet slot and marked; slot 0 and the appended final slot are
/// always set.
pub fn build_id_mask(spacings_ms: &[f32], packet_ms: f32) -> Result<Vec<u8>> {
    if spacings_ms.is_empty() {
        return Err(DemodError::InvalidConfig("ID has no spacings".into()));
    }
    if packet_ms <= 0.0 {
        return Err(DemodError::InvalidConfig(
            "packet size must be positive".into(),
        ));
    }

    let total: f32 = spacings_ms.iter().sum();
    let slots = (total / packet_ms).round() as usize;
    if slots == 0 {
        return Err(DemodError::InvalidConfig(
            "ID shorter than one packet".into(),
        ));
    }

    let mut mask = vec![0u8; slots + 1];
    mask[0] = 1;
    let mut acc = 0.0f32;
    for &gap in &spacings_ms[..spacings_ms.len() - 1] {
        acc += gap;
        let idx = ((acc / packet_ms).round() as usize).min(slots);
        mask[idx] = 1;
    }
    mask[slots] = 1;

    Ok(mask)
}

/// Cross-correlate the packetized detections against the mask
/// (valid mode). A correlation equal to the mask weight at some offset is
/// an exact alignment; that offset is the decode position.
pub fn correlate_id(packets: &[u8], mask: &[u8]) -> Result<IdCorrelation> {
    if mask.is_empty() {
        return Err(DemodError::InvalidConfig("empty ID mask".into()));
    }
    if packets.len() < mask.len() {
        return Err(DemodError::InsufficientData);
    }

    let weight: u32 = mask.iter().map(|&m| u32::from(m)).sum();
    let mut correlation = Vec::with_capacity(packets.len() - mask.len() + 1);
    for offset in 0..=packets.len() - mask.len() {
        let c: u32 = mask
            .iter()
            .zip(&packets[offset..])
            .map(|(&m, &d)| u32::from(m * d))
            .sum();
        correlation.push(c);
    }

    let position = correlation.iter().position(|&c| c == weight);
    if let Some(pos) = position {
        log::debug!("ID alignment at packet offset {pos}");
    }

    Ok(IdCorrelation {
        correlation,
        weight,
        position,
    })
}
