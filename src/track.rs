//! Probabilistic YIN (pYIN) pitch tracking.
//!
//! Mauch & Dixon (2014). Each frame turns the troughs of its cumulative mean
//! normalized difference function into a distribution over pitch bins, using a
//! beta prior over YIN thresholds. A hidden Markov model with a voiced and an
//! unvoiced copy of every pitch bin is then decoded with Viterbi, so voicing
//! decisions and octave choices are smoothed over time instead of being made
//! frame by frame.

use crate::curve::PitchCurve;
use crate::io::Waveform;
use crate::pipeline::PitchTracker;
use crate::{Error, Result};
use log::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Mass given to the lowest trough for thresholds no trough falls below.
const NO_TROUGH_PROB: f32 = 0.01;
/// Boltzmann parameter of the prior over trough rank.
const BOLTZMANN_PARAM: f32 = 2.0;
/// Midpoint samples per threshold bin when integrating the beta prior.
const BETA_SUBSTEPS: usize = 32;

/// Configuration for pYIN pitch tracking.
///
/// # Example
/// ```
/// use warble::track::PyinConfig;
///
/// let config = PyinConfig::new()
///     .with_fmin(80.0)
///     .with_fmax(1000.0);
/// assert_eq!(config.hop_length, 512);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PyinConfig {
    /// Length of analysis frames in samples
    pub frame_length: usize,
    /// Number of samples between frames
    pub hop_length: usize,
    /// Minimum frequency to consider in Hz
    pub fmin: f32,
    /// Maximum frequency to consider in Hz, capped at Nyquist
    pub fmax: f32,
    /// Number of YIN thresholds sampled from the beta prior
    pub n_thresholds: usize,
    /// Shape `(a, b)` of the beta prior over thresholds
    pub beta_params: (f32, f32),
    /// Width of a pitch bin in semitones
    pub resolution: f32,
    /// Per-frame probability of switching between voiced and unvoiced
    pub switch_prob: f32,
    /// Fastest pitch movement the model allows, in octaves per second
    pub max_transition_rate: f32,
}

impl Default for PyinConfig {
    /// Vocal range C2..C7 at librosa's default framing.
    fn default() -> Self {
        Self {
            frame_length: 2048,
            hop_length: 512,
            fmin: 65.41,
            fmax: 2093.0,
            n_thresholds: 100,
            beta_params: (2.0, 18.0),
            resolution: 0.1,
            switch_prob: 0.01,
            max_transition_rate: 35.92,
        }
    }
}

impl PyinConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame_length(mut self, frame_length: usize) -> Self {
        self.frame_length = frame_length;
        self
    }

    pub fn with_hop_length(mut self, hop_length: usize) -> Self {
        self.hop_length = hop_length;
        self
    }

    pub fn with_fmin(mut self, fmin: f32) -> Self {
        self.fmin = fmin;
        self
    }

    pub fn with_fmax(mut self, fmax: f32) -> Self {
        self.fmax = fmax;
        self
    }

    pub fn with_resolution(mut self, resolution: f32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_switch_prob(mut self, switch_prob: f32) -> Self {
        self.switch_prob = switch_prob;
        self
    }

    fn validate(&self, sr: u32) -> Result<()> {
        let sizes = [
            ("frame_length", self.frame_length),
            ("hop_length", self.hop_length),
            ("n_thresholds", self.n_thresholds),
            ("sample_rate", sr as usize),
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
        if !(self.fmin > 0.0 && self.fmin < self.fmax) {
            return Err(Error::InvalidParameter {
                name: "fmin",
                value: self.fmin.to_string(),
                reason: format!("must be in (0, fmax={})", self.fmax),
            });
        }
        if !(self.resolution > 0.0 && self.resolution <= 1.0) {
            return Err(Error::InvalidParameter {
                name: "resolution",
                value: self.resolution.to_string(),
                reason: "must be in (0, 1] semitones".to_string(),
            });
        }
        if !(self.switch_prob > 0.0 && self.switch_prob < 1.0) {
            return Err(Error::InvalidParameter {
                name: "switch_prob",
                value: self.switch_prob.to_string(),
                reason: "must be in (0, 1)".to_string(),
            });
        }
        let (a, b) = self.beta_params;
        if !(a > 0.0 && b > 0.0) {
            return Err(Error::InvalidParameter {
                name: "beta_params",
                value: format!("({}, {})", a, b),
                reason: "shape parameters must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Per-frame pYIN output.
#[derive(Debug, Clone, PartialEq)]
pub struct PyinFrames {
    /// Decoded f0 in Hz, `NaN` where the frame is unvoiced
    pub f0: Vec<f32>,
    /// Whether Viterbi decoding placed the frame in a voiced state
    pub voiced_flag: Vec<bool>,
    /// Probability mass the frame's observation puts on voiced states
    pub voiced_prob: Vec<f32>,
}

impl PyinFrames {
    pub fn len(&self) -> usize {
        self.f0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.f0.is_empty()
    }
}

/// [`PitchTracker`] backed by pYIN.
///
/// Frames decoded as unvoiced become missing frequencies; frame `k` sits at
/// `k * hop_length / sample_rate` seconds.
#[derive(Debug, Clone, Default)]
pub struct PyinTracker {
    pub config: PyinConfig,
}

impl PyinTracker {
    pub fn new(config: PyinConfig) -> Self {
        Self { config }
    }
}

impl PitchTracker for PyinTracker {
    fn track(&self, waveform: &Waveform) -> Result<PitchCurve> {
        let frames = pyin(&waveform.samples, waveform.sample_rate, &self.config)?;
        let f0: Vec<f32> = frames
            .f0
            .iter()
            .zip(&frames.voiced_flag)
            .map(|(&f, &voiced)| if voiced { f } else { f32::NAN })
            .collect();
        PitchCurve::from_frames(&f0, waveform.sample_rate, self.config.hop_length)
    }
}

/// Lag range and pitch-bin grid derived from a config at one sample rate.
struct Grid {
    win_length: usize,
    min_period: usize,
    max_period: usize,
    fmin: f32,
    bins_per_semitone: usize,
    n_bins: usize,
}

impl Grid {
    fn new(config: &PyinConfig, sr: u32) -> Result<Self> {
        let fmax = config.fmax.min(sr as f32 / 2.0);
        if config.fmin >= fmax {
            return Err(Error::InvalidParameter {
                name: "fmin",
                value: config.fmin.to_string(),
                reason: format!("must be below Nyquist ({} Hz)", sr / 2),
            });
        }

        let win_length = config.frame_length / 2;
        let min_period = ((sr as f32 / fmax).floor() as usize).max(1);
        let max_period = ((sr as f32 / config.fmin).ceil() as usize)
            .min(config.frame_length.saturating_sub(win_length + 1));
        if max_period <= min_period + 1 {
            return Err(Error::InvalidParameter {
                name: "frame_length",
                value: config.frame_length.to_string(),
                reason: format!("too short for fmin={} Hz at {} Hz", config.fmin, sr),
            });
        }

        let bins_per_semitone = (1.0 / config.resolution).ceil() as usize;
        let n_bins =
            (12.0 * bins_per_semitone as f32 * (fmax / config.fmin).log2()).floor() as usize + 1;

        Ok(Self {
            win_length,
            min_period,
            max_period,
            fmin: config.fmin,
            bins_per_semitone,
            n_bins,
        })
    }

    fn bins_per_octave(&self) -> f32 {
        12.0 * self.bins_per_semitone as f32
    }

    fn bin_hz(&self, bin: usize) -> f32 {
        self.fmin * 2.0f32.powf(bin as f32 / self.bins_per_octave())
    }

    fn hz_bin(&self, hz: f32) -> usize {
        let bin = (self.bins_per_octave() * (hz / self.fmin).log2()).round();
        bin.clamp(0.0, (self.n_bins - 1) as f32) as usize
    }
}

/// Estimate f0 with pYIN.
///
/// Frames are centered: the signal is zero-padded by `frame_length / 2` on
/// both sides and frame `k` starts at `k * hop_length` in the padded signal.
///
/// # Errors
/// Returns [`Error::Extraction`] for an empty signal, and a size or parameter
/// error for an invalid configuration or a frame too short for `fmin`.
///
/// # Example
/// ```
/// use warble::io::tone;
/// use warble::track::{pyin, PyinConfig};
///
/// let signal = tone(440.0, 22050, 0.5);
/// let frames = pyin(&signal, 22050, &PyinConfig::default()).unwrap();
/// assert_eq!(frames.f0.len(), frames.voiced_flag.len());
/// assert_eq!(frames.f0.len(), frames.voiced_prob.len());
/// ```
pub fn pyin(y: &[f32], sr: u32, config: &PyinConfig) -> Result<PyinFrames> {
    config.validate(sr)?;
    if y.is_empty() {
        return Err(Error::Extraction("waveform is empty".to_string()));
    }
    let grid = Grid::new(config, sr)?;

    let pad = config.frame_length / 2;
    let mut padded = vec![0.0f32; pad];
    padded.extend_from_slice(y);
    padded.resize(padded.len() + pad, 0.0);
    let n_frames = padded.len().saturating_sub(config.frame_length) / config.hop_length + 1;

    let beta_probs = beta_bin_probs(config.n_thresholds, config.beta_params);
    let observe = |k: usize| {
        let start = k * config.hop_length;
        let end = (start + config.frame_length).min(padded.len());
        frame_observation(&padded[start..end], &grid, &beta_probs, sr)
    };

    #[cfg(feature = "parallel")]
    let observations: Vec<(Vec<f32>, f32)> = (0..n_frames).into_par_iter().map(observe).collect();
    #[cfg(not(feature = "parallel"))]
    let observations: Vec<(Vec<f32>, f32)> = (0..n_frames).map(observe).collect();

    let max_semitones_per_frame = (config.max_transition_rate * 12.0 * config.hop_length as f32
        / sr as f32)
        .round() as usize;
    let half_width = max_semitones_per_frame * grid.bins_per_semitone / 2;
    let states = viterbi(&observations, grid.n_bins, half_width, config.switch_prob);

    let mut f0 = vec![f32::NAN; n_frames];
    let mut voiced_flag = vec![false; n_frames];
    for (k, &state) in states.iter().enumerate() {
        if state < grid.n_bins {
            voiced_flag[k] = true;
            f0[k] = grid.bin_hz(state);
        }
    }
    let voiced_prob = observations.into_iter().map(|(_, p)| p).collect();

    debug!(
        "pyin: {} frames, {} voiced, {} pitch bins",
        n_frames,
        voiced_flag.iter().filter(|&&v| v).count(),
        grid.n_bins
    );
    Ok(PyinFrames {
        f0,
        voiced_flag,
        voiced_prob,
    })
}

/// Probability of each of `n` equal threshold bins on `[0, 1]` under Beta(a, b).
fn beta_bin_probs(n: usize, (a, b): (f32, f32)) -> Vec<f32> {
    let step = 1.0 / (n * BETA_SUBSTEPS) as f64;
    let density = |t: f64| t.powf(a as f64 - 1.0) * (1.0 - t).powf(b as f64 - 1.0);
    let mass: Vec<f64> = (0..n)
        .map(|k| {
            (0..BETA_SUBSTEPS)
                .map(|s| density(((k * BETA_SUBSTEPS + s) as f64 + 0.5) * step))
                .sum::<f64>()
        })
        .collect();
    let total: f64 = mass.iter().sum();
    if total > 0.0 && total.is_finite() {
        mass.iter().map(|&m| (m / total) as f32).collect()
    } else {
        vec![1.0 / n as f32; n]
    }
}

/// Cumulative mean normalized difference for lags `0..=max_period`.
fn cmndf(frame: &[f32], win_length: usize, max_period: usize) -> Vec<f32> {
    let mut out = vec![1.0f32; max_period + 1];
    let mut running_sum = 0.0f32;
    for tau in 1..=max_period {
        let diff: f32 = frame[..win_length]
            .iter()
            .zip(&frame[tau..tau + win_length])
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        running_sum += diff;
        if running_sum > 0.0 {
            out[tau] = diff * tau as f32 / running_sum;
        }
    }
    out
}

/// Parabolic refinement of a trough at `tau`, in lags; zero when the fit is unstable.
fn parabolic_shift(c: &[f32], tau: usize) -> f32 {
    if tau == 0 || tau + 1 >= c.len() {
        return 0.0;
    }
    let (s0, s1, s2) = (c[tau - 1], c[tau], c[tau + 1]);
    let denom = s0 - 2.0 * s1 + s2;
    if denom.abs() <= 1e-10 {
        return 0.0;
    }
    let shift = 0.5 * (s0 - s2) / denom;
    if shift.abs() < 1.0 {
        shift
    } else {
        0.0
    }
}

/// Voiced observation probability per pitch bin, and their total mass.
fn frame_observation(frame: &[f32], grid: &Grid, beta_probs: &[f32], sr: u32) -> (Vec<f32>, f32) {
    let mut observation = vec![0.0f32; grid.n_bins];
    if frame.len() <= grid.max_period + grid.win_length {
        return (observation, 0.0);
    }

    let c = cmndf(frame, grid.win_length, grid.max_period);
    let (lo, hi) = (grid.min_period, grid.max_period);
    let troughs: Vec<usize> = (lo..=hi)
        .filter(|&tau| {
            let below_next = tau == hi || c[tau] <= c[tau + 1];
            if tau == lo {
                tau < hi && c[tau] < c[tau + 1]
            } else {
                c[tau] < c[tau - 1] && below_next
            }
        })
        .collect();
    if troughs.is_empty() {
        return (observation, 0.0);
    }

    // Trough probabilities, marginalised over thresholds
    let n_thresholds = beta_probs.len();
    let mut trough_probs = vec![0.0f32; troughs.len()];
    let global_min = troughs
        .iter()
        .enumerate()
        .fold(0, |best, (k, &tau)| if c[tau] < c[troughs[best]] { k } else { best });
    for (k, &beta) in beta_probs.iter().enumerate() {
        let threshold = (k + 1) as f32 / n_thresholds as f32;
        let below: Vec<usize> = (0..troughs.len())
            .filter(|&t| c[troughs[t]] < threshold)
            .collect();
        if below.is_empty() {
            trough_probs[global_min] += NO_TROUGH_PROB * beta;
        }
        let norm = 1.0 - (-BOLTZMANN_PARAM * below.len() as f32).exp();
        for (rank, &t) in below.iter().enumerate() {
            let prior = (1.0 - (-BOLTZMANN_PARAM).exp()) * (-BOLTZMANN_PARAM * rank as f32).exp()
                / norm;
            trough_probs[t] += prior * beta;
        }
    }

    for (&tau, &p) in troughs.iter().zip(&trough_probs) {
        if p <= 0.0 {
            continue;
        }
        let period = tau as f32 + parabolic_shift(&c, tau);
        if period > 0.0 {
            observation[grid.hz_bin(sr as f32 / period)] += p;
        }
    }
    let voiced_prob = observation.iter().sum::<f32>().clamp(0.0, 1.0);
    (observation, voiced_prob)
}

/// Most likely state per frame; states `0..n_bins` are voiced, `n_bins..2*n_bins` unvoiced.
///
/// Pitch moves at most `half_width` bins per frame under a triangular,
/// row-normalised transition; voicing flips with `switch_prob`. Decoding
/// starts from a uniform unvoiced state.
fn viterbi(
    observations: &[(Vec<f32>, f32)],
    n_bins: usize,
    half_width: usize,
    switch_prob: f32,
) -> Vec<usize> {
    let n_frames = observations.len();
    let n_states = 2 * n_bins;
    if n_frames == 0 || n_bins == 0 {
        return Vec::new();
    }

    let ln_tri: Vec<f32> = (0..=half_width)
        .map(|d| (1.0 - d as f32 / (half_width + 1) as f32).ln())
        .collect();
    let ln_norm: Vec<f32> = (0..n_bins)
        .map(|from| {
            let lo = from.saturating_sub(half_width);
            let hi = (from + half_width).min(n_bins - 1);
            (lo..=hi)
                .map(|to| ln_tri[from.abs_diff(to)].exp())
                .sum::<f32>()
                .ln()
        })
        .collect();
    let (ln_stay, ln_switch) = ((1.0 - switch_prob).ln(), switch_prob.ln());

    let ln_obs = |(voiced, voiced_prob): &(Vec<f32>, f32), state: usize| {
        let p = if state < n_bins {
            voiced[state]
        } else {
            (1.0 - voiced_prob) / n_bins as f32
        };
        (p + f32::MIN_POSITIVE).ln()
    };

    let ln_init = -(n_bins as f32).ln();
    let mut value: Vec<f32> = (0..n_states)
        .map(|s| {
            if s < n_bins {
                f32::NEG_INFINITY
            } else {
                ln_init + ln_obs(&observations[0], s)
            }
        })
        .collect();
    let mut backpointers: Vec<Vec<u32>> = Vec::with_capacity(n_frames.saturating_sub(1));

    for obs in &observations[1..] {
        // Fold the outgoing normalisation into the source value once per frame
        let source: Vec<f32> = value
            .iter()
            .enumerate()
            .map(|(s, &v)| v - ln_norm[s % n_bins])
            .collect();
        let step = |state: usize| -> (f32, u32) {
            let bin = state % n_bins;
            let voiced = state < n_bins;
            let lo = bin.saturating_sub(half_width);
            let hi = (bin + half_width).min(n_bins - 1);
            let mut best = (f32::NEG_INFINITY, state as u32);
            for (from_voiced, offset) in [(true, 0), (false, n_bins)] {
                let ln_layer = if from_voiced == voiced { ln_stay } else { ln_switch };
                for from in lo..=hi {
                    let score = source[offset + from] + ln_tri[bin.abs_diff(from)] + ln_layer;
                    if score > best.0 {
                        best = (score, (offset + from) as u32);
                    }
                }
            }
            (best.0 + ln_obs(obs, state), best.1)
        };

        #[cfg(feature = "parallel")]
        let scored: Vec<(f32, u32)> = (0..n_states).into_par_iter().map(step).collect();
        #[cfg(not(feature = "parallel"))]
        let scored: Vec<(f32, u32)> = (0..n_states).map(step).collect();

        value = scored.iter().map(|&(v, _)| v).collect();
        backpointers.push(scored.into_iter().map(|(_, b)| b).collect());
    }

    let mut state = value
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (s, &v)| if v > best.1 { (s, v) } else { best })
        .0;
    let mut states = vec![0usize; n_frames];
    states[n_frames - 1] = state;
    for (k, back) in backpointers.iter().enumerate().rev() {
        state = back[state] as usize;
        states[k] = state;
    }
    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::tone;
    use approx::assert_relative_eq;

    #[test]
    fn test_pyin_pure_tone() {
        let sr = 22050;
        let curve = PyinTracker::default()
            .track(&Waveform::new(tone(220.0, sr, 1.0), sr))
            .unwrap();
        assert!(curve.voiced_count() > curve.len() * 3 / 4);
        let close = curve
            .frequencies()
            .iter()
            .flatten()
            .filter(|&&f| (f - 220.0).abs() < 3.0)
            .count();
        assert!(close * 10 >= curve.voiced_count() * 9, "{} of {}", close, curve.voiced_count());
    }

    #[test]
    fn test_pyin_silence_is_unvoiced() {
        let sr = 22050;
        let frames = pyin(&vec![0.0; sr as usize / 2], sr, &PyinConfig::default()).unwrap();
        assert!(!frames.is_empty());
        assert!(frames.voiced_flag.iter().all(|&v| !v));
        assert!(frames.f0.iter().all(|f| f.is_nan()));
        assert!(frames.voiced_prob.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_pyin_frame_count_and_times() {
        let sr = 22050;
        let wave = Waveform::new(tone(330.0, sr, 0.5), sr);
        let frames = pyin(&wave.samples, sr, &PyinConfig::default()).unwrap();
        assert_eq!(frames.len(), wave.samples.len() / 512 + 1);

        let curve = PyinTracker::default().track(&wave).unwrap();
        assert_eq!(curve.len(), frames.len());
        assert_relative_eq!(curve.times()[2], 1024.0 / 22050.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pyin_rejects_bad_input() {
        let cfg = PyinConfig::default();
        assert!(matches!(pyin(&[], 22050, &cfg), Err(Error::Extraction(_))));
        assert!(pyin(&[0.0; 4096], 22050, &cfg.clone().with_hop_length(0)).is_err());
        assert!(pyin(&[0.0; 4096], 22050, &cfg.clone().with_fmin(3000.0)).is_err());
        assert!(pyin(&[0.0; 4096], 22050, &cfg.clone().with_frame_length(16)).is_err());
        assert!(pyin(&[0.0; 4096], 22050, &cfg.clone().with_switch_prob(0.0)).is_err());
    }

    #[test]
    fn test_beta_bin_probs_sum_to_one() {
        let probs = beta_bin_probs(100, (2.0, 18.0));
        assert_eq!(probs.len(), 100);
        assert_relative_eq!(probs.iter().sum::<f32>(), 1.0, epsilon = 1e-4);
        // Beta(2, 18) peaks at 1/18
        let peak = probs
            .iter()
            .enumerate()
            .fold(0, |best, (k, &p)| if p > probs[best] { k } else { best });
        assert!((4..=6).contains(&peak), "peak bin {}", peak);
    }

    #[test]
    fn test_grid_bins() {
        let grid = Grid::new(&PyinConfig::default(), 22050).unwrap();
        // 2093 Hz sits just under five octaves above 65.41 Hz
        assert_eq!(grid.n_bins, 600);
        assert_eq!(grid.hz_bin(65.41), 0);
        assert_eq!(grid.hz_bin(10_000.0), 599);
        assert_relative_eq!(grid.bin_hz(120), 65.41 * 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_viterbi_prefers_persistent_voicing() {
        // One bin, strongly voiced except a weak middle frame; decoding
        // always opens unvoiced (state 1)
        let obs: Vec<(Vec<f32>, f32)> = [0.99, 0.99, 0.3, 0.99, 0.99]
            .iter()
            .map(|&p| (vec![p], p))
            .collect();
        assert_eq!(viterbi(&obs, 1, 0, 0.01), vec![1, 0, 0, 0, 0]);
    }
}
