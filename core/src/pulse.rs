//! Pulse width validation over the CFAR detection stream.
//!
//! One O(n) pass of an edge state machine. A falling edge closes the
//! pulse opened by the most recent rising edge; its elapsed time must
//! match the expected pulse width within tolerance. The previous rising
//! edge is kept as a fallback for the case where two pulses merged into
//! one detection run, gated by a holdoff so the same physical pulse is
//! not accepted twice from stale edge history.

use crate::error::{DemodError, Result};
use crate::{FALLBACK_HOLDOFF_S, PULSE_TOLERANCE_S};

/// Validation verdict per index (-1 = no validated pulse ends here,
/// 1 = a pulse of the expected width ended here) plus the accepted end
/// timestamps in order.
#[derive(Debug, Clone)]
pub struct PulseCheck {
    pub detect: Vec<i8>,
    pub end_times: Vec<f32>,
}

impl PulseCheck {
    /// Number of validated pulses.
    pub fn count(&self) -> usize {
        self.end_times.len()
    }
}

/// Validate the binary detection stream against an expected pulse width
/// in milliseconds. Each index spans `buffer_len / sample_rate` seconds.
pub fn check_pulse(
    detect: &[u8],
    sample_rate: f32,
    buffer_len: usize,
    pulse_width_ms: f32,
) -> PulseCheck {
    let time_buf = buffer_len as f32 / sample_rate;
    let width = pulse_width_ms / 1000.0;

    let mut up = 0usize;
    let mut up_ant = 0usize;
    let mut last_end = -1.0f32;
    let mut prev = 0u8;

    let mut out = Vec::with_capacity(detect.len());
    let mut end_times = Vec::new();

    for (i, &d) in detect.iter().enumerate() {
        if d == 1 && prev == 0 {
            up_ant = up;
            up = i;
            out.push(-1);
        } else if d == 0 && prev == 1 {
            let elapsed = (i - up) as f32 * time_buf;
            let elapsed_ant = (i - up_ant) as f32 * time_buf;
            let t_end = i as f32 * time_buf;

            if (elapsed - width).abs() <= PULSE_TOLERANCE_S {
                out.push(1);
                end_times.push(t_end);
                last_end = t_end;
            } else if (elapsed_ant - width).abs() <= PULSE_TOLERANCE_S
                && t_end - last_end > FALLBACK_HOLDOFF_S
            {
                out.push(1);
                end_times.push(t_end);
                last_end = t_end;
            } else {
                out.push(-1);
            }
        } else {
            out.push(-1);
        }
        prev = d;
    }

    log::debug!("validated {} pulses", end_times.len());
    PulseCheck {
        detect: out,
        end_times,
    }
}

/// Packetized detections for the correlation-mask decoder: one flag per
/// fixed-length packet, set when any cell inside the packet detected.
#[derive(Debug, Clone)]
pub struct PacketDetect {
    pub detect: Vec<u8>,
    pub times: Vec<f32>,
}

/// Coarse position-insensitive variant of the pulse check: partition the
/// detection stream into packets of `packet_ms` and flag packets that
/// contain any detection. Used when precise pulse timing is unnecessary.
pub fn check_pulse_broad(
    detect: &[u8],
    sample_rate: f32,
    buffer_len: usize,
    packet_ms: f32,
) -> Result<PacketDetect> {
    let packet_len = ((packet_ms * sample_rate) / (buffer_len as f32 * 1000.0)) as usize;
    if packet_len == 0 {
        return Err(DemodError::InvalidConfig(format!(
            "packet of {packet_ms} ms is shorter than one buffer"
        )));
    }

    let mut padded = detect.to_vec();
    while padded.len() % packet_len != 0 {
        padded.push(0);
    }

    let packet_count = padded.len() / packet_len;
    let mut flags = Vec::with_capacity(packet_count);
    let mut times = Vec::with_capacity(packet_count);
    for (k, chunk) in padded.chunks_exact(packet_len).enumerate() {
        flags.push(u8::from(chunk.contains(&1)));
        times.push((k * packet_len) as f32 * buffer_len as f32 / sample_rate);
    }

    Ok(PacketDetect {
        detect: flags,
        times,
    })
}
