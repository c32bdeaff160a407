//! One-call comparison of two performances.
//!
//! [`compare`] runs the pure engine on two pitch curves. [`compare_recordings`]
//! adds the external stages in front of it: vocal isolation and pitch
//! tracking, both behind traits so callers can plug in any implementation.

use crate::align::{self, Alignment, TimingSummary};
use crate::classify::{self, AccuracyReport, AccuracyThresholds};
use crate::curve::PitchCurve;
use crate::deviation::{self, DeviationSeries};
use crate::io::Waveform;
use crate::Result;
use log::debug;
use serde::Serialize;

/// Isolates the vocal line from a mixed recording.
pub trait VocalSeparator {
    /// Return the vocal stem, at the input sample rate or a resampled one.
    ///
    /// Failures surface as [`crate::Error::Extraction`].
    fn separate(&self, mixture: &Waveform) -> Result<Waveform>;
}

/// Estimates a uniformly stepped f0 curve from a waveform.
pub trait PitchTracker {
    fn track(&self, waveform: &Waveform) -> Result<PitchCurve>;
}

/// Settings for one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompareConfig {
    /// Frequency mapped to 0 cents during alignment
    pub reference_hz: f32,
    pub thresholds: AccuracyThresholds,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            reference_hz: 440.0,
            thresholds: AccuracyThresholds::default(),
        }
    }
}

impl CompareConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_hz(mut self, reference_hz: f32) -> Self {
        self.reference_hz = reference_hz;
        self
    }

    pub fn with_thresholds(mut self, thresholds: AccuracyThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// Everything derived from one reference/candidate pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub alignment: Alignment,
    pub deviations: DeviationSeries,
    pub timing: TimingSummary,
    pub report: AccuracyReport,
}

/// Compare a candidate performance against a reference.
///
/// # Errors
/// - [`crate::Error::EmptyContour`] if either curve has no frames
/// - [`crate::Error::InvalidParameter`] for an invalid reference frequency or thresholds
///
/// # Example
/// ```
/// use warble::pipeline::{compare, CompareConfig};
/// use warble::classify::Verdict;
/// use warble::PitchCurve;
///
/// let reference = PitchCurve::new(vec![0.0, 1.0, 2.0], vec![Some(440.0); 3]).unwrap();
/// let result = compare(&reference, &reference, &CompareConfig::default()).unwrap();
/// assert_eq!(result.report.summary().unwrap().verdict, Verdict::Excellent);
/// ```
pub fn compare(
    reference: &PitchCurve,
    candidate: &PitchCurve,
    config: &CompareConfig,
) -> Result<Comparison> {
    config.thresholds.validate()?;
    debug!(
        "compare: reference {} frames ({} voiced), candidate {} frames ({} voiced)",
        reference.len(),
        reference.voiced_count(),
        candidate.len(),
        candidate.voiced_count()
    );

    let alignment = align::align(reference, candidate, config.reference_hz)?;
    let deviations = deviation::compute_deviations(reference, candidate, &alignment.path)?;
    let map = align::time_map(reference, candidate, &alignment.path)?;
    let timing = TimingSummary::from_time_map(&map);
    let report = classify::classify(&deviations, &config.thresholds)?;

    Ok(Comparison {
        alignment,
        deviations,
        timing,
        report,
    })
}

/// The isolated vocals and tracked curves alongside the comparison built from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingComparison {
    #[serde(skip)]
    pub reference_vocals: Waveform,
    #[serde(skip)]
    pub candidate_vocals: Waveform,
    pub reference: PitchCurve,
    pub candidate: PitchCurve,
    pub comparison: Comparison,
}

/// Isolate vocals, track pitch for both recordings, then [`compare`].
///
/// The two recordings are processed independently; with the `parallel`
/// feature they run on separate rayon workers and join before alignment.
pub fn compare_recordings<S, T>(
    separator: &S,
    tracker: &T,
    reference: &Waveform,
    candidate: &Waveform,
    config: &CompareConfig,
) -> Result<RecordingComparison>
where
    S: VocalSeparator + Sync + ?Sized,
    T: PitchTracker + Sync + ?Sized,
{
    let extract = |wave: &Waveform| -> Result<(Waveform, PitchCurve)> {
        let vocals = separator.separate(wave)?;
        let curve = tracker.track(&vocals)?;
        Ok((vocals, curve))
    };

    #[cfg(feature = "parallel")]
    let (reference_side, candidate_side) = rayon::join(|| extract(reference), || extract(candidate));
    #[cfg(not(feature = "parallel"))]
    let (reference_side, candidate_side) = (extract(reference), extract(candidate));

    let (reference_vocals, reference_curve) = reference_side?;
    let (candidate_vocals, candidate_curve) = candidate_side?;

    let comparison = compare(&reference_curve, &candidate_curve, config)?;
    Ok(RecordingComparison {
        reference_vocals,
        candidate_vocals,
        reference: reference_curve,
        candidate: candidate_curve,
        comparison,
    })
}
