//! Pitch curves: uniformly time-stepped f0 tracks with explicit unvoiced frames.

use crate::{Error, Result};
use serde::Serialize;

/// A fundamental-frequency track produced by a pitch tracker.
///
/// `frequencies[k]` is `None` when frame `k` is unvoiced, silent or the
/// tracker found no pitch. Construction validates the shape, so every
/// `PitchCurve` in circulation satisfies `times.len() == frequencies.len()`
/// and has strictly increasing, finite times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchCurve {
    times: Vec<f32>,
    frequencies: Vec<Option<f32>>,
}

impl PitchCurve {
    /// Build a curve from frame times (seconds) and optional frequencies (Hz).
    ///
    /// A `Some` frequency that is not a positive finite number is stored as
    /// `None`, so an unvoiced frame has exactly one representation.
    ///
    /// # Errors
    /// - [`Error::LengthMismatch`] if the two sequences differ in length
    /// - [`Error::NonMonotonicTimes`] if a time is non-finite or not greater
    ///   than its predecessor
    ///
    /// # Example
    /// ```
    /// use warble::PitchCurve;
    ///
    /// let curve = PitchCurve::new(vec![0.0, 0.01, 0.02], vec![Some(440.0), None, Some(441.0)]).unwrap();
    /// assert_eq!(curve.len(), 3);
    /// assert_eq!(curve.voiced_count(), 2);
    /// ```
    pub fn new(times: Vec<f32>, frequencies: Vec<Option<f32>>) -> Result<Self> {
        if times.len() != frequencies.len() {
            return Err(Error::LengthMismatch {
                times: times.len(),
                frequencies: frequencies.len(),
            });
        }
        for (index, &t) in times.iter().enumerate() {
            if !t.is_finite() || (index > 0 && t <= times[index - 1]) {
                return Err(Error::NonMonotonicTimes { index });
            }
        }
        let frequencies = frequencies
            .into_iter()
            .map(|f| f.filter(|hz| hz.is_finite() && *hz > 0.0))
            .collect();
        Ok(Self { times, frequencies })
    }

    /// Build a curve from a frame-rate track, deriving `times[k] = k * hop / sr`.
    ///
    /// Non-finite and non-positive frequencies become missing frames, which
    /// matches trackers that report unvoiced frames as `0.0` or `NaN`.
    pub fn from_frames(frequencies: &[f32], sr: u32, hop_length: usize) -> Result<Self> {
        if sr == 0 {
            return Err(Error::InvalidSize {
                name: "sr",
                value: 0,
                reason: "must be > 0",
            });
        }
        if hop_length == 0 {
            return Err(Error::InvalidSize {
                name: "hop_length",
                value: 0,
                reason: "must be > 0",
            });
        }
        let step = hop_length as f64 / sr as f64;
        let times = (0..frequencies.len())
            .map(|k| (k as f64 * step) as f32)
            .collect();
        Self::new(times, frequencies.iter().copied().map(Some).collect())
    }

    /// Frame times in seconds.
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    /// Per-frame frequencies in Hz; `None` marks an unvoiced frame.
    pub fn frequencies(&self) -> &[Option<f32>] {
        &self.frequencies
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of frames carrying a frequency.
    pub fn voiced_count(&self) -> usize {
        self.frequencies.iter().filter(|f| f.is_some()).count()
    }

    /// Duration covered by the frame times, zero for curves shorter than two frames.
    pub fn duration(&self) -> f32 {
        match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}
