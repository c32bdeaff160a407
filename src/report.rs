//! Plain-text rendering of an [`AccuracyReport`].
//!
//! The text has four blocks in a fixed order: overall statistics, tier
//! distribution, reference thresholds and the overall verdict.

use crate::classify::{AccuracyReport, AccuracySummary, AccuracyThresholds};
use std::fmt::{self, Write};

/// Render a report as text.
///
/// # Example
/// ```
/// use warble::classify::{classify, AccuracyThresholds};
/// use warble::{report, DeviationSeries};
///
/// let thresholds = AccuracyThresholds::default();
/// let devs = DeviationSeries::new(vec![Some(3.0), Some(-2.0)]);
/// let text = report::render_text(&classify(&devs, &thresholds).unwrap(), &thresholds);
/// assert!(text.contains("Overall statistics"));
/// assert!(text.contains("Excellent!"));
/// ```
pub fn render_text(report: &AccuracyReport, thresholds: &AccuracyThresholds) -> String {
    match report {
        AccuracyReport::InsufficientData { narrative } => format!("{}\n", narrative),
        AccuracyReport::Scored(summary) => render_summary(summary, thresholds),
    }
}

fn render_summary(s: &AccuracySummary, t: &AccuracyThresholds) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_summary(&mut out, s, t);
    out
}

fn write_summary(out: &mut String, s: &AccuracySummary, t: &AccuracyThresholds) -> fmt::Result {
    let direction = if s.mean > 0.0 { "sharp" } else { "flat" };

    writeln!(out, "Intonation report")?;
    writeln!(out, "=================")?;
    writeln!(out)?;

    writeln!(out, "Overall statistics:")?;
    writeln!(out, "- Mean deviation: {:.1} cents ({})", s.mean, direction)?;
    writeln!(out, "- Standard deviation: {:.1} cents", s.std_dev)?;
    writeln!(out, "- Median deviation: {:.1} cents", s.median)?;
    writeln!(out)?;

    writeln!(out, "Distribution:")?;
    writeln!(
        out,
        "- Accurate (<{} cents): {} frames ({:.1}%)",
        t.accurate_cents, s.accurate, s.accurate_pct
    )?;
    writeln!(
        out,
        "- Slightly off ({}-{} cents): {} frames ({:.1}%)",
        t.accurate_cents, t.slight_cents, s.slightly_off, s.slightly_off_pct
    )?;
    writeln!(
        out,
        "- Seriously off (>={} cents): {} frames ({:.1}%)",
        t.slight_cents, s.seriously_off, s.seriously_off_pct
    )?;
    writeln!(out)?;

    writeln!(out, "Reference:")?;
    writeln!(
        out,
        "- 25 cents is about a quarter semitone, hard for most listeners to notice"
    )?;
    writeln!(out, "- 50 cents is half a semitone, clearly audible")?;
    writeln!(out, "- 100 cents is a full semitone, plainly out of tune")?;
    writeln!(out)?;

    writeln!(out, "Verdict:")?;
    writeln!(out, "{}", s.narrative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::deviation::DeviationSeries;

    #[test]
    fn test_blocks_in_order() {
        let t = AccuracyThresholds::default();
        let devs = DeviationSeries::new(vec![Some(100.0), Some(100.0), Some(100.0)]);
        let text = render_text(&classify(&devs, &t).unwrap(), &t);

        let positions: Vec<usize> = ["Overall statistics:", "Distribution:", "Reference:", "Verdict:"]
            .iter()
            .map(|h| text.find(h).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("Mean deviation: 100.0 cents (sharp)"));
        assert!(text.contains("Seriously off (>=50 cents): 3 frames (100.0%)"));
        assert!(text.contains("Overall trend: sharp"));
    }

    #[test]
    fn test_insufficient_is_one_sentence() {
        let t = AccuracyThresholds::default();
        let report = classify(&DeviationSeries::new(vec![None]), &t).unwrap();
        let text = render_text(&report, &t);
        assert_eq!(text.lines().count(), 1);
        assert!(!text.contains("Distribution"));
    }

    #[test]
    fn test_ends_with_narrative() {
        let t = AccuracyThresholds::default();
        let report = classify(&DeviationSeries::new(vec![Some(-40.0), Some(-45.0)]), &t).unwrap();
        let text = render_text(&report, &t);
        let narrative = report.narrative();
        assert!(text.ends_with(&format!("Verdict:\n{}\n", narrative)));
        assert!(text.contains("Mean deviation: -42.5 cents (flat)"));
        assert_eq!(text.lines().filter(|l| l.starts_with("- ")).count(), 9);
    }
}
