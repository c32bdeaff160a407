use approx::assert_abs_diff_eq;
use warble::classify::{Trend, Verdict};
use warble::pipeline::{compare, CompareConfig};
use warble::PitchCurve;

fn curve(freqs: &[Option<f32>]) -> PitchCurve {
    let times = (0..freqs.len()).map(|k| k as f32).collect();
    PitchCurve::new(times, freqs.to_vec()).unwrap()
}

#[test]
fn identical_performance_is_excellent() {
    let reference = curve(&[Some(440.0); 3]);
    let candidate = curve(&[Some(440.0); 3]);
    let result = compare(&reference, &candidate, &CompareConfig::default()).unwrap();

    assert_eq!(result.alignment.path.pairs(), &[(0, 0), (1, 1), (2, 2)]);
    for d in result.deviations.values() {
        assert_abs_diff_eq!(d.unwrap(), 0.0, epsilon = 1e-4);
    }
    let s = result.report.summary().unwrap();
    assert_eq!(s.accurate, 3);
    assert_abs_diff_eq!(s.accurate_pct, 100.0, epsilon = 1e-4);
    assert_eq!(s.verdict, Verdict::Excellent);
    assert_eq!(s.verdict.label(), "excellent");
    assert_eq!(s.trend, None);
}

#[test]
fn semitone_sharp_is_seriously_off() {
    let reference = curve(&[Some(440.0); 3]);
    let candidate = curve(&[Some(466.16); 3]);
    let result = compare(&reference, &candidate, &CompareConfig::default()).unwrap();

    assert_eq!(result.alignment.path.pairs(), &[(0, 0), (1, 1), (2, 2)]);
    for d in result.deviations.values() {
        assert_abs_diff_eq!(d.unwrap(), 100.0, epsilon = 0.05);
    }
    let s = result.report.summary().unwrap();
    assert_eq!(s.seriously_off, 3);
    assert_abs_diff_eq!(s.mean, 100.0, epsilon = 0.05);
    assert_eq!(s.trend, Some(Trend::Sharp));
    assert_eq!(s.verdict, Verdict::NeedsSubstantialPractice);
    assert!(s.narrative.contains("sharp"));
}

#[test]
fn slower_candidate_is_warped_onto_reference() {
    // Candidate sings the same three notes, holding each twice as long
    let reference = curve(&[Some(220.0), Some(330.0), Some(440.0)]);
    let candidate = curve(&[
        Some(220.0),
        Some(220.0),
        Some(330.0),
        Some(330.0),
        Some(440.0),
        Some(440.0),
    ]);
    let result = compare(&reference, &candidate, &CompareConfig::default()).unwrap();

    assert_eq!(result.alignment.path.len(), 6);
    assert!(result.alignment.cost.abs() < 1e-2);
    let s = result.report.summary().unwrap();
    assert_eq!(s.accurate, 6);
    assert!(result.timing.max_abs_offset > 0.0);
}

#[test]
fn unvoiced_frames_are_excluded_from_statistics() {
    let reference = curve(&[Some(440.0), None, Some(440.0), Some(440.0)]);
    let candidate = curve(&[Some(440.0), None, Some(452.0), None]);
    let result = compare(&reference, &candidate, &CompareConfig::default()).unwrap();

    let s = result.report.summary().unwrap();
    assert_eq!(s.total, result.deviations.voiced_count());
    assert!(s.total < result.deviations.len());
}

#[test]
fn silent_takes_give_insufficient_data() {
    let reference = curve(&[None; 4]);
    let candidate = curve(&[None; 5]);
    let result = compare(&reference, &candidate, &CompareConfig::default()).unwrap();

    assert!(result.report.is_insufficient());
    assert!(result.deviations.values().iter().all(Option::is_none));
    assert!(!result.report.narrative().is_empty());
}
