//! Direct-form convolution helpers used by the heterodyne and wavelet
//! feature extractors.
//!
//! Frame lengths here are a few hundred samples and tap counts are small,
//! so the O(N*M) direct form is the embedded-faithful choice over an FFT
//! product.

/// Full linear convolution (output length `a + b - 1`).
pub fn convolve_full(a: &[f32], b: &[f32]) -> Vec<f32> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0f32; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Centered convolution with output length `max(a, b)`, matching the
/// numpy `mode='same'` convention the reference filters were designed
/// against.
pub fn convolve_same(a: &[f32], b: &[f32]) -> Vec<f32> {
    let full = convolve_full(a, b);
    if full.is_empty() {
        return full;
    }
    let out_len = a.len().max(b.len());
    let start = (a.len().min(b.len()) - 1) / 2;
    full[start..start + out_len].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convolve_full_identity() {
        let x = vec![1.0, 2.0, 3.0];
        assert_eq!(convolve_full(&x, &[1.0]), x);
    }

    #[test]
    fn test_convolve_full_known_values() {
        // [1,2,3] * [0,1,0.5] = [0, 1, 2.5, 4, 1.5]
        let out = convolve_full(&[1.0, 2.0, 3.0], &[0.0, 1.0, 0.5]);
        let expected = [0.0, 1.0, 2.5, 4.0, 1.5];
        assert_eq!(out.len(), expected.len());
        for (o, e) in out.iter().zip(expected.iter()) {
            assert!((o - e).abs() < 1e-6);
        }
    }

    #[test]
    fn test_convolve_same_length_and_centering() {
        let sig = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let taps = vec![0.0, 1.0, 0.0];
        let out = convolve_same(&sig, &taps);
        // centered unit tap reproduces the signal
        assert_eq!(out, sig);
    }

    #[test]
    fn test_convolve_same_even_taps() {
        let sig = vec![1.0, 1.0, 1.0, 1.0];
        let out = convolve_same(&sig, &[0.5, 0.5]);
        assert_eq!(out.len(), 4);
        // full = [0.5, 1, 1, 1, 0.5]; same keeps indices 0..4
        assert!((out[0] - 0.5).abs() < 1e-6);
        assert!((out[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_convolve_empty() {
        assert!(convolve_full(&[], &[1.0]).is_empty());
        assert!(convolve_same(&[1.0], &[]).is_empty());
    }
}
