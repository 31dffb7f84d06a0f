//! Cell-averaging CFAR thresholding over a feature series.
//!
//! Two-sided CFAR with a guard band derived from the expected pulse
//! width: guard cells adjacent to the cell under test are excluded from
//! the noise estimate because they may hold pulse energy. Too small a
//! guard bleeds signal into the estimate and suppresses detections; too
//! large a guard wastes reference cells.

/// Threshold and binary detection arrays aligned index-for-index with the
/// feature series they were computed from.
#[derive(Debug, Clone)]
pub struct CfarResult {
    pub threshold: Vec<f32>,
    pub detect: Vec<u8>,
}

/// Guard cell count scaled from the expected pulse width:
/// `5 * ceil(pulse_width_ms * Fs / (buffer_len * 1000))`.
pub fn guard_cells(pulse_width_ms: f32, sample_rate: f32, buffer_len: usize) -> usize {
    5 * (pulse_width_ms * sample_rate / (buffer_len as f32 * 1000.0)).ceil() as usize
}

/// Run CFAR over `features` with `cells` reference cells on each side of
/// the guard band.
///
/// A feature value of exactly 0 forces threshold 1 (defined degenerate
/// policy, never a detection). Reference windows are clipped to the
/// series bounds near the edges, using only the in-bounds side. `offset`
/// is subtracted from the computed threshold before comparison (0 for the
/// plain detector).
pub fn cfar(features: &[f32], guard: usize, cells: usize, offset: f32) -> CfarResult {
    let n = features.len();
    let mut threshold = Vec::with_capacity(n);
    let mut detect = Vec::with_capacity(n);

    for i in 0..n {
        let value = features[i];
        let res = if value == 0.0 {
            1.0
        } else {
            let left_lo = i.saturating_sub(guard + cells);
            let left_hi = i.saturating_sub(guard);
            let right_lo = (i + guard).min(n);
            let right_hi = (i + guard + cells).min(n);

            let mut sum = 0.0f32;
            let mut count = 0usize;
            for &x in &features[left_lo..left_hi] {
                sum += x;
                count += 1;
            }
            for &x in &features[right_lo..right_hi] {
                sum += x;
                count += 1;
            }

            if count == 0 {
                1.0
            } else {
                (sum / count as f32) / value - offset
            }
        };

        detect.push(u8::from(value > res));
        threshold.push(res);
    }

    CfarResult { threshold, detect }
}
