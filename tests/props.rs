use proptest::prelude::*;
use warble::classify::{classify, AccuracyThresholds};
use warble::convert::hz_to_cents;
use warble::pipeline::{compare, CompareConfig};
use warble::{align, DeviationSeries, PitchCurve};

fn pitch_track() -> impl Strategy<Value = Vec<Option<f32>>> {
    prop::collection::vec(prop::option::weighted(0.8, 80.0f32..1000.0), 1..40)
}

fn curve(freqs: Vec<Option<f32>>) -> PitchCurve {
    let times = (0..freqs.len()).map(|k| k as f32 * 0.01).collect();
    PitchCurve::new(times, freqs).unwrap()
}

proptest! {
    #[test]
    fn path_is_monotonic_unit_step(a in pitch_track(), b in pitch_track()) {
        let (n, m) = (a.len(), b.len());
        let alignment = align::align(&curve(a), &curve(b), 440.0).unwrap();
        let pairs = alignment.path.pairs();

        prop_assert_eq!(pairs[0], (0, 0));
        prop_assert_eq!(*pairs.last().unwrap(), (n - 1, m - 1));
        for w in pairs.windows(2) {
            let step = (w[1].0 - w[0].0, w[1].1 - w[0].1);
            prop_assert!(matches!(step, (1, 0) | (0, 1) | (1, 1)));
        }
        prop_assert!(alignment.cost >= 0.0);
    }

    #[test]
    fn identity_alignment_is_diagonal(a in pitch_track()) {
        let c = curve(a.clone());
        let result = compare(&c, &c, &CompareConfig::default()).unwrap();
        for (k, (i, j)) in result.alignment.path.iter().enumerate() {
            prop_assert_eq!((i, j), (k, k));
        }
        for (d, f) in result.deviations.values().iter().zip(&a) {
            match (d, f) {
                (Some(d), Some(_)) => {
                    prop_assert!(d.abs() < 1e-3);
                }
                (None, None) => {}
                _ => {
                    prop_assert!(false, "missingness differs: {:?} vs {:?}", d, f);
                }
            }
        }
    }

    #[test]
    fn cents_strictly_increasing(f in 1.0f32..10_000.0, ratio in 1.01f32..4.0) {
        let lo = hz_to_cents(Some(f), 440.0).unwrap();
        let hi = hz_to_cents(Some(f * ratio), 440.0).unwrap();
        prop_assert!(hi > lo);
    }

    #[test]
    fn classifier_totals_add_up(devs in prop::collection::vec(prop::option::of(-300.0f32..300.0), 0..100)) {
        let series = DeviationSeries::new(devs);
        let report = classify(&series, &AccuracyThresholds::default()).unwrap();
        match report.summary() {
            Some(s) => {
                prop_assert_eq!(s.accurate + s.slightly_off + s.seriously_off, s.total);
                prop_assert_eq!(s.total, series.voiced_count());
                let pct = s.accurate_pct + s.slightly_off_pct + s.seriously_off_pct;
                prop_assert!((pct - 100.0).abs() < 1e-3);
            }
            None => {
                prop_assert_eq!(series.voiced_count(), 0);
            }
        }
    }
}
