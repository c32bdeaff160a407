//! Accuracy tiers, aggregate statistics and the qualitative verdict.

use crate::deviation::DeviationSeries;
use crate::{Error, Result};
use log::{debug, warn};
use serde::Serialize;

/// Thresholds for tiering deviations and phrasing the verdict.
///
/// # Example
/// ```
/// use warble::classify::AccuracyThresholds;
///
/// let thresholds = AccuracyThresholds::new()
///     .with_accurate_cents(20.0)
///     .with_slight_cents(40.0);
/// assert!(thresholds.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyThresholds {
    /// `|deviation|` below this is accurate
    pub accurate_cents: f32,
    /// `|deviation|` below this (and not accurate) is slightly off
    pub slight_cents: f32,
    /// Accuracy percentage above which the verdict is excellent
    pub excellent_pct: f32,
    /// Accuracy percentage above which the verdict is good
    pub good_pct: f32,
    /// Accuracy percentage above which the verdict is "needs practice"
    pub practice_pct: f32,
    /// `|mean|` above this adds a sharp/flat trend note
    pub trend_cents: f32,
}

impl Default for AccuracyThresholds {
    fn default() -> Self {
        Self {
            accurate_cents: 25.0,
            slight_cents: 50.0,
            excellent_pct: 80.0,
            good_pct: 60.0,
            practice_pct: 40.0,
            trend_cents: 30.0,
        }
    }
}

impl AccuracyThresholds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accurate_cents(mut self, cents: f32) -> Self {
        self.accurate_cents = cents;
        self
    }

    pub fn with_slight_cents(mut self, cents: f32) -> Self {
        self.slight_cents = cents;
        self
    }

    /// Set the excellent / good / needs-practice percentage boundaries.
    pub fn with_verdict_pcts(mut self, excellent: f32, good: f32, practice: f32) -> Self {
        self.excellent_pct = excellent;
        self.good_pct = good;
        self.practice_pct = practice;
        self
    }

    pub fn with_trend_cents(mut self, cents: f32) -> Self {
        self.trend_cents = cents;
        self
    }

    /// Check that the tiers and verdict boundaries are ordered.
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        fn invalid(name: &'static str, value: f32, reason: &str) -> Error {
            Error::InvalidParameter {
                name,
                value: value.to_string(),
                reason: reason.to_string(),
            }
        }

        if !(self.accurate_cents.is_finite() && self.accurate_cents > 0.0) {
            return Err(invalid("accurate_cents", self.accurate_cents, "must be > 0"));
        }
        if !(self.slight_cents.is_finite() && self.slight_cents > self.accurate_cents) {
            return Err(invalid(
                "slight_cents",
                self.slight_cents,
                "must be greater than accurate_cents",
            ));
        }
        if !(self.practice_pct >= 0.0 && self.practice_pct < self.good_pct) {
            return Err(invalid(
                "practice_pct",
                self.practice_pct,
                "must be in [0, good_pct)",
            ));
        }
        if !(self.good_pct < self.excellent_pct && self.excellent_pct <= 100.0) {
            return Err(invalid(
                "excellent_pct",
                self.excellent_pct,
                "must be in (good_pct, 100]",
            ));
        }
        if !(self.trend_cents.is_finite() && self.trend_cents >= 0.0) {
            return Err(invalid("trend_cents", self.trend_cents, "must be >= 0"));
        }
        Ok(())
    }
}

/// Accuracy tier of a single deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Accurate,
    SlightlyOff,
    SeriouslyOff,
}

impl Tier {
    /// Tier of a deviation in cents; only its magnitude matters.
    pub fn classify(deviation: f32, thresholds: &AccuracyThresholds) -> Self {
        let magnitude = deviation.abs();
        if magnitude < thresholds.accurate_cents {
            Tier::Accurate
        } else if magnitude < thresholds.slight_cents {
            Tier::SlightlyOff
        } else {
            Tier::SeriouslyOff
        }
    }
}

/// Overall verdict, from the share of accurate frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Excellent,
    Good,
    NeedsPractice,
    NeedsSubstantialPractice,
}

impl Verdict {
    pub fn from_accuracy(accuracy_pct: f32, thresholds: &AccuracyThresholds) -> Self {
        if accuracy_pct > thresholds.excellent_pct {
            Verdict::Excellent
        } else if accuracy_pct > thresholds.good_pct {
            Verdict::Good
        } else if accuracy_pct > thresholds.practice_pct {
            Verdict::NeedsPractice
        } else {
            Verdict::NeedsSubstantialPractice
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Excellent => "excellent",
            Verdict::Good => "good, room to improve",
            Verdict::NeedsPractice => "needs practice",
            Verdict::NeedsSubstantialPractice => "needs substantial practice",
        }
    }
}

/// Direction of a consistent pitch bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Sharp,
    Flat,
}

impl Trend {
    /// Trend for a mean deviation, if it exceeds `trend_cents` in magnitude.
    pub fn from_mean(mean: f32, thresholds: &AccuracyThresholds) -> Option<Self> {
        if mean.abs() <= thresholds.trend_cents {
            None
        } else if mean > 0.0 {
            Some(Trend::Sharp)
        } else {
            Some(Trend::Flat)
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Trend::Sharp => {
                "Overall trend: sharp. Try relaxing the throat and bringing the pitch down."
            }
            Trend::Flat => {
                "Overall trend: flat. Try adding breath support and lifting the pitch."
            }
        }
    }
}

/// Statistics over the voiced deviations of one comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracySummary {
    /// Number of voiced deviations; the denominator of every percentage
    pub total: usize,
    pub mean: f32,
    /// Population standard deviation
    pub std_dev: f32,
    pub median: f32,
    pub accurate: usize,
    pub slightly_off: usize,
    pub seriously_off: usize,
    pub accurate_pct: f32,
    pub slightly_off_pct: f32,
    pub seriously_off_pct: f32,
    pub verdict: Verdict,
    pub trend: Option<Trend>,
    pub narrative: String,
}

/// Outcome of classifying a deviation series.
///
/// No voiced overlap at all is a legitimate result (both takes silent, or
/// extraction found nothing), so it is a variant rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccuracyReport {
    InsufficientData { narrative: String },
    Scored(AccuracySummary),
}

impl AccuracyReport {
    pub fn summary(&self) -> Option<&AccuracySummary> {
        match self {
            AccuracyReport::Scored(summary) => Some(summary),
            AccuracyReport::InsufficientData { .. } => None,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, AccuracyReport::InsufficientData { .. })
    }

    pub fn narrative(&self) -> &str {
        match self {
            AccuracyReport::Scored(summary) => &summary.narrative,
            AccuracyReport::InsufficientData { narrative } => narrative,
        }
    }
}

const INSUFFICIENT_NARRATIVE: &str =
    "Cannot assess intonation: no aligned frames were voiced in both recordings.";

/// Classify a deviation series into tiers and summarize it.
///
/// Missing steps are excluded from every statistic and denominator.
///
/// # Errors
/// Returns [`Error::InvalidParameter`] if `thresholds` fail validation.
///
/// # Example
/// ```
/// use warble::classify::{classify, AccuracyThresholds, Verdict};
/// use warble::DeviationSeries;
///
/// let devs = DeviationSeries::new(vec![Some(0.0), None, Some(10.0), Some(-60.0)]);
/// let report = classify(&devs, &AccuracyThresholds::default()).unwrap();
/// let summary = report.summary().unwrap();
/// assert_eq!(summary.total, 3);
/// assert_eq!(summary.accurate, 2);
/// assert_eq!(summary.seriously_off, 1);
/// assert_eq!(summary.verdict, Verdict::Good);
/// ```
pub fn classify(series: &DeviationSeries, thresholds: &AccuracyThresholds) -> Result<AccuracyReport> {
    thresholds.validate()?;

    let mut values: Vec<f32> = series.voiced().collect();
    if values.is_empty() {
        warn!(
            "no voiced deviations among {} path steps; report has insufficient data",
            series.len()
        );
        return Ok(AccuracyReport::InsufficientData {
            narrative: INSUFFICIENT_NARRATIVE.to_string(),
        });
    }

    let total = values.len();
    let n = total as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    let (mut accurate, mut slightly_off, mut seriously_off) = (0usize, 0usize, 0usize);
    for &v in &values {
        match Tier::classify(v, thresholds) {
            Tier::Accurate => accurate += 1,
            Tier::SlightlyOff => slightly_off += 1,
            Tier::SeriouslyOff => seriously_off += 1,
        }
    }

    values.sort_by(f32::total_cmp);
    let median = if total % 2 == 1 {
        values[total / 2]
    } else {
        ((values[total / 2 - 1] as f64 + values[total / 2] as f64) / 2.0) as f32
    };

    let pct = |count: usize| (100.0 * count as f64 / n) as f32;
    let accurate_pct = pct(accurate);
    let mean = mean as f32;
    let verdict = Verdict::from_accuracy(accurate_pct, thresholds);
    let trend = Trend::from_mean(mean, thresholds);
    let narrative = narrate(verdict, trend, accurate_pct);

    debug!(
        "classify: {} voiced, mean {:.1}, accurate {:.1}% -> {}",
        total,
        mean,
        accurate_pct,
        verdict.label()
    );

    Ok(AccuracyReport::Scored(AccuracySummary {
        total,
        mean,
        std_dev: variance.sqrt() as f32,
        median,
        accurate,
        slightly_off,
        seriously_off,
        accurate_pct,
        slightly_off_pct: pct(slightly_off),
        seriously_off_pct: pct(seriously_off),
        verdict,
        trend,
        narrative,
    }))
}

fn narrate(verdict: Verdict, trend: Option<Trend>, accurate_pct: f32) -> String {
    let mut text = match verdict {
        Verdict::Excellent => format!(
            "Excellent! {:.0}% of frames are within the accurate range.",
            accurate_pct
        ),
        Verdict::Good => format!(
            "Good. {:.0}% of frames are within the accurate range, with room to improve.",
            accurate_pct
        ),
        Verdict::NeedsPractice => format!(
            "Needs practice. Only {:.0}% of frames are within the accurate range.",
            accurate_pct
        ),
        Verdict::NeedsSubstantialPractice => format!(
            "Needs substantial practice. Only {:.0}% of frames are within the accurate range.",
            accurate_pct
        ),
    };
    if let Some(trend) = trend {
        text.push('\n');
        text.push_str(trend.advice());
    }
    text
}
