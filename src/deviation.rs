//! Per-step pitch deviation along an alignment path.

use crate::align::{check_path, AlignmentPath};
use crate::convert::cents_between;
use crate::curve::PitchCurve;
use crate::Result;
use log::debug;
use serde::Serialize;

/// Signed deviation in cents for every step of an alignment path.
///
/// Positive values mean the candidate is sharp of the reference, negative
/// values flat. A step is `None` when either side of the pair is unvoiced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DeviationSeries(Vec<Option<f32>>);

impl DeviationSeries {
    pub fn new(values: Vec<Option<f32>>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Option<f32>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deviations of the steps where both sides were voiced, in path order.
    pub fn voiced(&self) -> impl Iterator<Item = f32> + '_ {
        self.0.iter().filter_map(|&d| d)
    }

    pub fn voiced_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_some()).count()
    }
}

impl From<Vec<Option<f32>>> for DeviationSeries {
    fn from(values: Vec<Option<f32>>) -> Self {
        Self(values)
    }
}

/// Compute the deviation of `candidate` from `reference` along `path`.
///
/// Each voiced pair yields `1200 * log2(candidate_hz / reference_hz)`; no
/// smoothing or outlier rejection is applied.
///
/// # Errors
/// Returns [`crate::Error::InvalidParameter`] if `path` does not end on the last
/// frame of both curves, i.e. it was computed for a different pair.
///
/// # Example
/// ```
/// use warble::{align, deviation, PitchCurve};
///
/// let reference = PitchCurve::new(vec![0.0, 1.0], vec![Some(440.0), None]).unwrap();
/// let candidate = PitchCurve::new(vec![0.0, 1.0], vec![Some(880.0), Some(880.0)]).unwrap();
/// let path = align::AlignmentPath::new(vec![(0, 0), (1, 1)], 2, 2).unwrap();
/// let devs = deviation::compute_deviations(&reference, &candidate, &path).unwrap();
/// assert!((devs.values()[0].unwrap() - 1200.0).abs() < 1e-3);
/// assert_eq!(devs.values()[1], None);
/// ```
pub fn compute_deviations(
    reference: &PitchCurve,
    candidate: &PitchCurve,
    path: &AlignmentPath,
) -> Result<DeviationSeries> {
    check_path(reference, candidate, path)?;
    let f_ref = reference.frequencies();
    let f_cand = candidate.frequencies();

    let values: Vec<Option<f32>> = path
        .iter()
        .map(|(i, j)| match (f_ref[i], f_cand[j]) {
            (Some(a), Some(b)) => cents_between(a, b),
            _ => None,
        })
        .collect();

    let series = DeviationSeries(values);
    debug!(
        "deviation: {} of {} path steps voiced on both sides",
        series.voiced_count(),
        series.len()
    );
    Ok(series)
}

/// One step of the aligned contour: the reference time and both pitches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignedFrame {
    pub time: f32,
    pub reference_hz: Option<f32>,
    pub candidate_hz: Option<f32>,
}

/// Resample both curves onto the path, indexed by reference time.
pub fn aligned_contour(
    reference: &PitchCurve,
    candidate: &PitchCurve,
    path: &AlignmentPath,
) -> Result<Vec<AlignedFrame>> {
    check_path(reference, candidate, path)?;
    Ok(path
        .iter()
        .map(|(i, j)| AlignedFrame {
            time: reference.times()[i],
            reference_hz: reference.frequencies()[i],
            candidate_hz: candidate.frequencies()[j],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn curve(freqs: &[Option<f32>]) -> PitchCurve {
        let times = (0..freqs.len()).map(|k| k as f32).collect();
        PitchCurve::new(times, freqs.to_vec()).unwrap()
    }

    #[test]
    fn test_sign_convention() {
        let reference = curve(&[Some(440.0), Some(440.0)]);
        let candidate = curve(&[Some(466.1638), Some(415.3047)]);
        let path = AlignmentPath::new(vec![(0, 0), (1, 1)], 2, 2).unwrap();
        let devs = compute_deviations(&reference, &candidate, &path).unwrap();
        assert_abs_diff_eq!(devs.values()[0].unwrap(), 100.0, epsilon = 1e-2);
        assert_abs_diff_eq!(devs.values()[1].unwrap(), -100.0, epsilon = 1e-2);
    }

    #[test]
    fn test_missing_on_either_side() {
        let reference = curve(&[None, Some(440.0), None]);
        let candidate = curve(&[Some(440.0), None, None]);
        let path = AlignmentPath::new(vec![(0, 0), (1, 1), (2, 2)], 3, 3).unwrap();
        let devs = compute_deviations(&reference, &candidate, &path).unwrap();
        assert_eq!(devs.values(), &[None, None, None]);
        assert_eq!(devs.voiced_count(), 0);
    }

    #[test]
    fn test_repeated_frames_follow_path() {
        let reference = curve(&[Some(440.0)]);
        let candidate = curve(&[Some(440.0), Some(880.0)]);
        let path = AlignmentPath::new(vec![(0, 0), (0, 1)], 1, 2).unwrap();
        let devs = compute_deviations(&reference, &candidate, &path).unwrap();
        assert_eq!(devs.len(), 2);
        let voiced: Vec<f32> = devs.voiced().collect();
        assert_abs_diff_eq!(voiced[0], 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(voiced[1], 1200.0, epsilon = 1e-3);
    }

    #[test]
    fn test_aligned_contour() {
        let reference = curve(&[Some(440.0), None]);
        let candidate = curve(&[Some(441.0), Some(442.0), Some(443.0)]);
        let path = AlignmentPath::new(vec![(0, 0), (1, 1), (1, 2)], 2, 3).unwrap();
        let frames = aligned_contour(&reference, &candidate, &path).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].time, 1.0);
        assert_eq!(frames[2].reference_hz, None);
        assert_eq!(frames[2].candidate_hz, Some(443.0));
    }

    #[test]
    fn test_path_from_other_curves_is_rejected() {
        let reference = curve(&[Some(440.0), Some(440.0)]);
        let candidate = curve(&[Some(440.0), Some(440.0)]);
        let path = AlignmentPath::new(vec![(0, 0), (1, 1), (2, 2)], 3, 3).unwrap();
        assert!(compute_deviations(&reference, &candidate, &path).is_err());
        assert!(aligned_contour(&reference, &candidate, &path).is_err());
        assert!(crate::align::time_map(&reference, &candidate, &path).is_err());
    }
}
