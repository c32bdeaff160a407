use std::sync::atomic::{AtomicUsize, Ordering};

use warble::classify::Verdict;
use warble::io::{tone, Waveform};
use warble::pipeline::{compare_recordings, CompareConfig, PitchTracker, VocalSeparator};
use warble::separate::Passthrough;
use warble::track::PyinTracker;
use warble::{Error, PitchCurve, Result};

/// Tracker that reads a constant pitch from the first sample.
struct ConstantTracker;

impl PitchTracker for ConstantTracker {
    fn track(&self, waveform: &Waveform) -> Result<PitchCurve> {
        let hz = waveform.samples.first().copied();
        let n = waveform.samples.len();
        let times = (0..n).map(|k| k as f32 * 0.01).collect();
        PitchCurve::new(times, vec![hz.filter(|&f| f > 0.0); n])
    }
}

struct FailingSeparator;

impl VocalSeparator for FailingSeparator {
    fn separate(&self, _mixture: &Waveform) -> Result<Waveform> {
        Err(Error::Extraction("no vocals".to_string()))
    }
}

struct CountingSeparator(AtomicUsize);

impl VocalSeparator for CountingSeparator {
    fn separate(&self, mixture: &Waveform) -> Result<Waveform> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(mixture.clone())
    }
}

#[test]
fn stub_collaborators_feed_the_engine() {
    let reference = Waveform::new(vec![440.0; 5], 100);
    let candidate = Waveform::new(vec![440.0; 7], 100);
    let separator = CountingSeparator(AtomicUsize::new(0));
    let result = compare_recordings(
        &separator,
        &ConstantTracker,
        &reference,
        &candidate,
        &CompareConfig::default(),
    )
    .unwrap();

    assert_eq!(separator.0.load(Ordering::SeqCst), 2);
    assert_eq!(result.reference_vocals, reference);
    assert_eq!(result.candidate_vocals, candidate);
    assert_eq!(result.reference.len(), 5);
    assert_eq!(result.candidate.len(), 7);
    let s = result.comparison.report.summary().unwrap();
    assert_eq!(s.verdict, Verdict::Excellent);
}

#[test]
fn extraction_failure_propagates() {
    let wave = Waveform::new(vec![440.0; 3], 100);
    let result = compare_recordings(
        &FailingSeparator,
        &ConstantTracker,
        &wave,
        &wave,
        &CompareConfig::default(),
    );
    assert!(matches!(result, Err(Error::Extraction(_))));
}

#[test]
fn empty_tracked_curve_is_rejected() {
    let reference = Waveform::new(Vec::new(), 100);
    let candidate = Waveform::new(vec![440.0; 3], 100);
    let result = compare_recordings(
        &Passthrough,
        &ConstantTracker,
        &reference,
        &candidate,
        &CompareConfig::default(),
    );
    assert!(matches!(result, Err(Error::EmptyContour { which: "reference" })));
}

#[test]
fn pyin_on_tones_detects_sharp_singer() {
    let sr = 22050;
    let reference = Waveform::new(tone(220.0, sr, 1.0), sr);
    let candidate = Waveform::new(tone(220.0 * 2f32.powf(1.0 / 12.0), sr, 1.0), sr);
    let result = compare_recordings(
        &Passthrough,
        &PyinTracker::default(),
        &reference,
        &candidate,
        &CompareConfig::default(),
    )
    .unwrap();

    let s = result.comparison.report.summary().unwrap();
    assert!((s.median - 100.0).abs() < 10.0, "median {}", s.median);
    assert!(s.seriously_off > s.accurate);
}

#[test]
fn comparison_serializes_to_json() {
    let wave = Waveform::new(vec![440.0; 3], 100);
    let result = compare_recordings(
        &Passthrough,
        &ConstantTracker,
        &wave,
        &wave,
        &CompareConfig::default(),
    )
    .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["comparison"]["report"]["status"], "scored");
    assert_eq!(json["comparison"]["alignment"]["path"][0][0], 0);
    assert_eq!(json["comparison"]["deviations"].as_array().unwrap().len(), 3);
    assert!(json.get("reference_vocals").is_none());
}
