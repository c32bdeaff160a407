//! Short-time magnitude spectra, for spectrogram plots.
//!
//! Frames are centered on `k * hop_length` with zero padding and a periodic
//! Hann window, matching librosa's `stft` defaults.

use crate::{Error, Result};
use ndarray::Array2;
use realfft::RealFftPlanner;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Framing of the short-time Fourier transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StftConfig {
    pub n_fft: usize,
    pub hop_length: usize,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
        }
    }
}

impl StftConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_fft(mut self, n_fft: usize) -> Self {
        self.n_fft = n_fft;
        self
    }

    pub fn with_hop_length(mut self, hop_length: usize) -> Self {
        self.hop_length = hop_length;
        self
    }
}

/// Periodic Hann window of length `n`.
pub fn hann(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos())
        .collect()
}

/// Centre frequency in Hz of every STFT bin, `0..=n_fft / 2`.
pub fn fft_frequencies(sr: u32, n_fft: usize) -> Vec<f32> {
    (0..=n_fft / 2)
        .map(|k| k as f32 * sr as f32 / n_fft as f32)
        .collect()
}

/// Magnitude STFT of shape `(n_fft / 2 + 1, n_frames)`.
///
/// # Errors
/// Returns [`Error::InvalidSize`] for an empty signal or a zero `n_fft` or
/// `hop_length`.
///
/// # Example
/// ```
/// use warble::spectrum::{stft_magnitude, StftConfig};
///
/// let signal = vec![0.0f32; 4096];
/// let mag = stft_magnitude(&signal, &StftConfig::default()).unwrap();
/// assert_eq!(mag.dim(), (1025, 9));
/// ```
pub fn stft_magnitude(y: &[f32], config: &StftConfig) -> Result<Array2<f32>> {
    let sizes = [
        ("signal", y.len()),
        ("n_fft", config.n_fft),
        ("hop_length", config.hop_length),
    ];
    for (name, value) in sizes {
        if value == 0 {
            return Err(Error::InvalidSize {
                name,
                value,
                reason: "must be > 0",
            });
        }
    }

    let n_fft = config.n_fft;
    let pad = n_fft / 2;
    let mut padded = vec![0.0f32; pad];
    padded.extend_from_slice(y);
    padded.resize(padded.len() + pad, 0.0);
    let n_frames = padded.len().saturating_sub(n_fft) / config.hop_length + 1;
    let n_freq = n_fft / 2 + 1;

    let window = hann(n_fft);
    let plan = RealFftPlanner::<f32>::new().plan_fft_forward(n_fft);
    let frame = |k: usize| -> Result<Vec<f32>> {
        let start = k * config.hop_length;
        let mut input = plan.make_input_vec();
        for (i, x) in input.iter_mut().enumerate() {
            *x = padded.get(start + i).copied().unwrap_or(0.0) * window[i];
        }
        let mut output = plan.make_output_vec();
        plan.process(&mut input, &mut output)
            .map_err(|e| Error::InvalidParameter {
                name: "n_fft",
                value: n_fft.to_string(),
                reason: e.to_string(),
            })?;
        Ok(output.iter().map(|c| c.norm()).collect())
    };

    #[cfg(feature = "parallel")]
    let columns: Vec<Vec<f32>> = (0..n_frames)
        .into_par_iter()
        .map(frame)
        .collect::<Result<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let columns: Vec<Vec<f32>> = (0..n_frames).map(frame).collect::<Result<_>>()?;

    let mut magnitude = Array2::<f32>::zeros((n_freq, n_frames));
    for (t, column) in columns.iter().enumerate() {
        for (f, &m) in column.iter().enumerate() {
            magnitude[(f, t)] = m;
        }
    }
    Ok(magnitude)
}

/// Convert an amplitude spectrogram to dB: `20 * log10(max(S, amin) / ref)`.
///
/// With `top_db`, values are floored at `max - top_db`.
pub fn amplitude_to_db(
    amplitude: &Array2<f32>,
    ref_amplitude: f32,
    amin: f32,
    top_db: Option<f32>,
) -> Array2<f32> {
    let log_ref = 20.0 * ref_amplitude.max(amin).log10();
    let mut db = amplitude.mapv(|a| 20.0 * a.max(amin).log10() - log_ref);
    if let Some(top) = top_db {
        let floor = db.iter().copied().fold(f32::NEG_INFINITY, f32::max) - top;
        db.mapv_inplace(|v| v.max(floor));
    }
    db
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::tone;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_hann_shape() {
        let w = hann(8);
        assert_abs_diff_eq!(w[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(w[4], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(w[2], w[6], epsilon = 1e-6);
    }

    #[test]
    fn test_fft_frequencies() {
        let freqs = fft_frequencies(22050, 2048);
        assert_eq!(freqs.len(), 1025);
        assert_eq!(freqs[0], 0.0);
        assert_abs_diff_eq!(freqs[1024], 11025.0, epsilon = 1e-2);
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        let sr = 22050;
        let mag = stft_magnitude(&tone(1000.0, sr, 0.5), &StftConfig::default()).unwrap();
        let column = mag.column(mag.ncols() / 2);
        let peak = column
            .iter()
            .enumerate()
            .fold(0, |best, (k, &m)| if m > column[best] { k } else { best });
        // 1000 Hz / (22050 / 2048) = 92.9
        assert_eq!(peak, 93);
    }

    #[test]
    fn test_amplitude_to_db_floor() {
        let amp = Array2::from_shape_vec((1, 3), vec![1.0, 0.1, 0.0]).unwrap();
        let db = amplitude_to_db(&amp, 1.0, 1e-5, Some(80.0));
        assert_abs_diff_eq!(db[(0, 0)], 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(db[(0, 1)], -20.0, epsilon = 1e-4);
        assert_abs_diff_eq!(db[(0, 2)], -80.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rejects_empty_and_zero_sizes() {
        assert!(stft_magnitude(&[], &StftConfig::default()).is_err());
        assert!(stft_magnitude(&[0.0; 64], &StftConfig::new().with_hop_length(0)).is_err());
        assert!(stft_magnitude(&[0.0; 64], &StftConfig::new().with_n_fft(0)).is_err());
    }
}
