//! Dynamic time warping between two pitch curves.
//!
//! Both curves are mapped to cents against a common reference frequency and
//! aligned with classic DTW under the absolute-difference cost. Unvoiced
//! frames enter the cost matrix as `0` cents, i.e. as if they sat exactly on
//! the reference pitch. This anchors silence to a fixed pitch rather than
//! excluding it from the cost, so long rests on one side can pull the path
//! towards frames near the reference pitch on the other. Whether silence
//! should instead be masked out of the accumulation is an open question.

use crate::convert::track_to_cents;
use crate::curve::PitchCurve;
use crate::{Error, Result};
use log::debug;
use ndarray::Array2;
use serde::Serialize;

/// Monotonic, unit-step correspondence between reference and candidate frames.
///
/// Pairs are `(reference_index, candidate_index)`. The first pair is `(0, 0)`,
/// the last pairs the final frames of both curves, and consecutive pairs
/// differ by `(1, 0)`, `(0, 1)` or `(1, 1)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AlignmentPath(Vec<(usize, usize)>);

impl AlignmentPath {
    /// Validate an externally supplied path against the curve lengths.
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if the path does not start at
    /// `(0, 0)`, does not end at `(reference_len - 1, candidate_len - 1)`, or
    /// takes a step other than `(1, 0)`, `(0, 1)` or `(1, 1)`.
    pub fn new(
        pairs: Vec<(usize, usize)>,
        reference_len: usize,
        candidate_len: usize,
    ) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidParameter {
            name: "path",
            value: format!("{} pairs", pairs.len()),
            reason,
        };
        if reference_len == 0 || candidate_len == 0 {
            return Err(invalid("curves must be non-empty".to_string()));
        }
        if pairs.first() != Some(&(0, 0)) {
            return Err(invalid("must start at (0, 0)".to_string()));
        }
        let end = (reference_len - 1, candidate_len - 1);
        if pairs.last() != Some(&end) {
            return Err(invalid(format!("must end at {:?}", end)));
        }
        for (k, w) in pairs.windows(2).enumerate() {
            let di = w[1].0.wrapping_sub(w[0].0);
            let dj = w[1].1.wrapping_sub(w[0].1);
            if !matches!((di, dj), (1, 0) | (0, 1) | (1, 1)) {
                return Err(invalid(format!("illegal step at position {}", k + 1)));
            }
        }
        Ok(Self(pairs))
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated path; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().copied()
    }

    /// Reference frame index of every step.
    pub fn reference_indices(&self) -> Vec<usize> {
        self.0.iter().map(|&(i, _)| i).collect()
    }

    /// Candidate frame index of every step.
    pub fn candidate_indices(&self) -> Vec<usize> {
        self.0.iter().map(|&(_, j)| j).collect()
    }
}

/// Result of aligning two curves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alignment {
    /// Warping path in forward time order.
    pub path: AlignmentPath,
    /// Accumulated cost at the end of the path, in cents.
    pub cost: f32,
}

/// Align two pitch curves on the cents scale.
///
/// # Arguments
/// * `reference` - Reference performance
/// * `candidate` - Learner performance
/// * `reference_hz` - Frequency mapped to 0 cents (440.0 for A4)
///
/// # Errors
/// - [`Error::EmptyContour`] if either curve has no frames
/// - [`Error::InvalidParameter`] if `reference_hz` is not a positive finite number
///
/// # Example
/// ```
/// use warble::{align, PitchCurve};
///
/// let a = PitchCurve::new(vec![0.0, 1.0, 2.0], vec![Some(440.0); 3]).unwrap();
/// let alignment = align::align(&a, &a, 440.0).unwrap();
/// assert_eq!(alignment.path.pairs(), &[(0, 0), (1, 1), (2, 2)]);
/// ```
pub fn align(reference: &PitchCurve, candidate: &PitchCurve, reference_hz: f32) -> Result<Alignment> {
    if reference.is_empty() {
        return Err(Error::EmptyContour { which: "reference" });
    }
    if candidate.is_empty() {
        return Err(Error::EmptyContour { which: "candidate" });
    }
    if !(reference_hz.is_finite() && reference_hz > 0.0) {
        return Err(Error::InvalidParameter {
            name: "reference_hz",
            value: reference_hz.to_string(),
            reason: "must be a positive frequency".to_string(),
        });
    }

    let a = zero_filled_cents(reference, reference_hz);
    let b = zero_filled_cents(candidate, reference_hz);
    let (cost, path) = dtw(&a, &b)?;
    Ok(Alignment { path, cost })
}

fn zero_filled_cents(curve: &PitchCurve, reference_hz: f32) -> Vec<f32> {
    track_to_cents(curve.frequencies(), reference_hz)
        .into_iter()
        .map(|c| c.unwrap_or(0.0))
        .collect()
}

/// DTW over two scalar sequences with cost `|a[i] - b[j]|`.
///
/// The accumulated cost matrix has an extra leading row and column set to
/// infinity, with the origin at zero:
///
/// `C[i][j] = |a[i-1] - b[j-1]| + min(C[i-1][j-1], C[i-1][j], C[i][j-1])`
///
/// Backtracking starts at `C[N][M]` and moves to the cheapest predecessor.
/// Ties resolve diagonal first, then up (reference advances alone), then
/// left (candidate advances alone).
///
/// # Returns
/// Tuple of (total cost, path)
///
/// # Errors
/// Returns [`Error::EmptyContour`] if either sequence is empty.
///
/// # Example
/// ```
/// use warble::align::dtw;
///
/// let (cost, path) = dtw(&[0.0, 100.0, 200.0], &[0.0, 100.0, 100.0, 200.0]).unwrap();
/// assert_eq!(cost, 0.0);
/// assert_eq!(path.pairs(), &[(0, 0), (1, 1), (1, 2), (2, 3)]);
/// ```
pub fn dtw(a: &[f32], b: &[f32]) -> Result<(f32, AlignmentPath)> {
    let n = a.len();
    let m = b.len();
    if n == 0 {
        return Err(Error::EmptyContour { which: "reference" });
    }
    if m == 0 {
        return Err(Error::EmptyContour { which: "candidate" });
    }
    debug!("dtw: {} x {} cost matrix", n, m);

    let mut cost = Array2::<f32>::from_elem((n + 1, m + 1), f32::INFINITY);
    cost[(0, 0)] = 0.0;

    for i in 1..=n {
        for j in 1..=m {
            let min_cost = cost[(i - 1, j - 1)]
                .min(cost[(i - 1, j)])
                .min(cost[(i, j - 1)]);
            cost[(i, j)] = (a[i - 1] - b[j - 1]).abs() + min_cost;
        }
    }

    // Backtrack in matrix coordinates; cell (i, j) is frame pair (i - 1, j - 1)
    let mut path = Vec::with_capacity(n + m);
    let (mut i, mut j) = (n, m);
    path.push((i - 1, j - 1));

    while (i, j) != (1, 1) {
        let diag = cost[(i - 1, j - 1)];
        let up = cost[(i - 1, j)];
        let left = cost[(i, j - 1)];

        if diag <= up && diag <= left {
            i -= 1;
            j -= 1;
        } else if up <= left {
            i -= 1;
        } else {
            j -= 1;
        }
        path.push((i - 1, j - 1));
    }

    path.reverse();
    let total = cost[(n, m)];
    debug!("dtw: path of {} steps, cost {:.2}", path.len(), total);
    Ok((total, AlignmentPath(path)))
}

/// Check that `path` ends on the last frame of both curves.
///
/// A validated [`AlignmentPath`] is only in bounds for the curve lengths it
/// was built against; this rejects a path computed for a different pair.
pub(crate) fn check_path(
    reference: &PitchCurve,
    candidate: &PitchCurve,
    path: &AlignmentPath,
) -> Result<()> {
    let end = (
        reference.len().wrapping_sub(1),
        candidate.len().wrapping_sub(1),
    );
    if path.pairs().last() != Some(&end) {
        return Err(Error::InvalidParameter {
            name: "path",
            value: format!("{:?}", path.pairs().last()),
            reason: format!("does not end at {:?} for these curves", end),
        });
    }
    Ok(())
}

/// Frame times on both sides of every path step, `(reference_time, candidate_time)`.
///
/// A path following the diagonal `reference_time == candidate_time` means the
/// learner kept the reference timing.
///
/// # Errors
/// Returns [`Error::InvalidParameter`] if `path` was computed for curves of
/// different lengths.
pub fn time_map(
    reference: &PitchCurve,
    candidate: &PitchCurve,
    path: &AlignmentPath,
) -> Result<Vec<(f32, f32)>> {
    check_path(reference, candidate, path)?;
    Ok(path
        .iter()
        .map(|(i, j)| (reference.times()[i], candidate.times()[j]))
        .collect())
}

/// Timing offsets of the candidate along an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingSummary {
    /// Mean of `candidate_time - reference_time` over path steps (positive = late).
    pub mean_offset: f32,
    /// Largest absolute offset along the path.
    pub max_abs_offset: f32,
}

impl TimingSummary {
    pub fn from_time_map(map: &[(f32, f32)]) -> Self {
        if map.is_empty() {
            return Self {
                mean_offset: 0.0,
                max_abs_offset: 0.0,
            };
        }
        let mut sum = 0.0f64;
        let mut max_abs = 0.0f32;
        for &(t_ref, t_cand) in map {
            let d = t_cand - t_ref;
            sum += d as f64;
            max_abs = max_abs.max(d.abs());
        }
        Self {
            mean_offset: (sum / map.len() as f64) as f32,
            max_abs_offset: max_abs,
        }
    }
}
