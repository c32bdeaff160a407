//! PPM plots of a comparison.
//!
//! Enable with the `display` feature in Cargo.toml:
//!
//! ```toml
//! [dependencies]
//! warble = { version = "0.1", features = ["display"] }
//! ```

use crate::classify::{AccuracyThresholds, Tier};
use crate::curve::PitchCurve;
use crate::deviation::{AlignedFrame, DeviationSeries};
use crate::io::Waveform;
use crate::spectrum::{self, StftConfig};
use crate::Result;
use std::path::Path;

pub type Rgb = (u8, u8, u8);

const WHITE: Rgb = (255, 255, 255);
const BLACK: Rgb = (0, 0, 0);
const GRAY: Rgb = (160, 160, 160);
const LIGHT_GRAY: Rgb = (225, 225, 225);
const BLUE: Rgb = (31, 119, 180);
const RED: Rgb = (214, 39, 40);
const GREEN: Rgb = (44, 160, 44);
const ORANGE: Rgb = (255, 127, 14);

/// Deviation plots are clipped to this many cents either side of zero.
pub const DEVIATION_RANGE_CENTS: f32 = 200.0;

/// Upper edge of spectrogram plots; the vocal range sits below it.
pub const SPECTROGRAM_MAX_HZ: f32 = 2000.0;

/// Dynamic range of spectrogram plots below their loudest bin.
const SPECTROGRAM_TOP_DB: f32 = 80.0;

/// Colour of a deviation: green, orange and red by tier, gray when missing.
pub fn tier_color(deviation: Option<f32>, thresholds: &AccuracyThresholds) -> Rgb {
    match deviation.map(|d| Tier::classify(d, thresholds)) {
        Some(Tier::Accurate) => GREEN,
        Some(Tier::SlightlyOff) => ORANGE,
        Some(Tier::SeriouslyOff) => RED,
        None => GRAY,
    }
}

/// An RGB raster, row-major from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: usize, height: usize, background: Rgb) -> Self {
        let mut pixels = Vec::with_capacity(width * height * 3);
        for _ in 0..(width * height) {
            pixels.extend_from_slice(&[background.0, background.1, background.2]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 3;
        Some((self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]))
    }

    pub fn set(&mut self, x: usize, y: usize, color: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) * 3;
        self.pixels[idx] = color.0;
        self.pixels[idx + 1] = color.1;
        self.pixels[idx + 2] = color.2;
    }

    pub fn hline(&mut self, y: usize, color: Rgb) {
        for x in 0..self.width {
            self.set(x, y, color);
        }
    }

    /// Bresenham line between two pixel positions.
    pub fn line(&mut self, from: (usize, usize), to: (usize, usize), color: Rgb) {
        let (mut x0, mut y0) = (from.0 as i64, from.1 as i64);
        let (x1, y1) = (to.0 as i64, to.1 as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set(x0 as usize, y0 as usize, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Stack canvases top to bottom, `gap` background rows apart.
    ///
    /// The result is as wide as the widest canvas; narrower ones are left-aligned.
    pub fn vstack(canvases: &[Canvas], gap: usize, background: Rgb) -> Canvas {
        let width = canvases.iter().map(|c| c.width).max().unwrap_or(0);
        let height = canvases.iter().map(|c| c.height).sum::<usize>()
            + gap * canvases.len().saturating_sub(1);
        let mut out = Canvas::new(width, height, background);
        let mut top = 0;
        for canvas in canvases {
            for y in 0..canvas.height {
                let src = y * canvas.width * 3;
                let dst = ((top + y) * width) * 3;
                out.pixels[dst..dst + canvas.width * 3]
                    .copy_from_slice(&canvas.pixels[src..src + canvas.width * 3]);
            }
            top += canvas.height + gap;
        }
        out
    }

    /// Write the canvas as a binary PPM (P6) file.
    pub fn save_ppm<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        use std::io::Write;

        let mut file = std::fs::File::create(path)?;
        writeln!(file, "P6")?;
        writeln!(file, "{} {}", self.width, self.height)?;
        writeln!(file, "255")?;
        file.write_all(&self.pixels)?;
        Ok(())
    }
}

/// Maps data coordinates onto a canvas, y growing upwards.
struct Axes {
    x_min: f32,
    x_span: f32,
    y_min: f32,
    y_span: f32,
    width: usize,
    height: usize,
}

impl Axes {
    fn new(x: (f32, f32), y: (f32, f32), width: usize, height: usize) -> Self {
        Self {
            x_min: x.0,
            x_span: (x.1 - x.0).max(1e-6),
            y_min: y.0,
            y_span: (y.1 - y.0).max(1e-6),
            width,
            height,
        }
    }

    fn px(&self, x: f32, y: f32) -> (usize, usize) {
        let fx = ((x - self.x_min) / self.x_span).clamp(0.0, 1.0);
        let fy = ((y - self.y_min) / self.y_span).clamp(0.0, 1.0);
        let col = (fx * (self.width - 1) as f32).round() as usize;
        let row = ((1.0 - fy) * (self.height - 1) as f32).round() as usize;
        (col, row)
    }
}

fn hz_range<'a>(values: impl Iterator<Item = &'a Option<f32>>) -> (f32, f32) {
    let (lo, hi) = values
        .flatten()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo.is_finite() {
        (lo * 0.95, hi * 1.05)
    } else {
        (0.0, 1.0)
    }
}

/// Draw a pitch track, breaking the line at unvoiced frames.
fn draw_track(canvas: &mut Canvas, axes: &Axes, points: impl Iterator<Item = (f32, Option<f32>)>, color: Rgb) {
    let mut prev: Option<(usize, usize)> = None;
    for (t, hz) in points {
        match hz {
            Some(hz) => {
                let p = axes.px(t, hz);
                match prev {
                    Some(q) => canvas.line(q, p, color),
                    None => canvas.set(p.0, p.1, color),
                }
                prev = Some(p);
            }
            None => prev = None,
        }
    }
}

/// Both raw pitch curves on their own time axes: reference blue, candidate red.
pub fn contour_plot(reference: &PitchCurve, candidate: &PitchCurve, width: usize, height: usize) -> Canvas {
    let mut canvas = Canvas::new(width, height, WHITE);
    if width == 0 || height == 0 {
        return canvas;
    }
    let t_max = reference.duration().max(candidate.duration());
    let y = hz_range(reference.frequencies().iter().chain(candidate.frequencies()));
    let axes = Axes::new((0.0, t_max), y, width, height);

    for (curve, color) in [(reference, BLUE), (candidate, RED)] {
        let points = curve
            .times()
            .iter()
            .copied()
            .zip(curve.frequencies().iter().copied());
        draw_track(&mut canvas, &axes, points, color);
    }
    canvas
}

/// Both pitch curves resampled onto the alignment path, on the reference time axis.
pub fn aligned_contour_plot(frames: &[AlignedFrame], width: usize, height: usize) -> Canvas {
    let mut canvas = Canvas::new(width, height, WHITE);
    let (Some(first), Some(last)) = (frames.first(), frames.last()) else {
        return canvas;
    };
    if width == 0 || height == 0 {
        return canvas;
    }
    let y = hz_range(
        frames
            .iter()
            .flat_map(|f| [&f.reference_hz, &f.candidate_hz]),
    );
    let axes = Axes::new((first.time, last.time), y, width, height);

    draw_track(&mut canvas, &axes, frames.iter().map(|f| (f.time, f.reference_hz)), BLUE);
    draw_track(&mut canvas, &axes, frames.iter().map(|f| (f.time, f.candidate_hz)), RED);
    canvas
}

/// Deviation per path step, coloured by tier, clipped to ±200 cents.
///
/// Guides mark zero (black), ±50 and ±100 cents (gray).
pub fn deviation_plot(
    deviations: &DeviationSeries,
    thresholds: &AccuracyThresholds,
    width: usize,
    height: usize,
) -> Canvas {
    let mut canvas = Canvas::new(width, height, WHITE);
    if width == 0 || height == 0 || deviations.is_empty() {
        return canvas;
    }
    let n = deviations.len();
    let axes = Axes::new(
        (0.0, (n - 1) as f32),
        (-DEVIATION_RANGE_CENTS, DEVIATION_RANGE_CENTS),
        width,
        height,
    );

    for guide in [-100.0, -50.0, 50.0, 100.0] {
        canvas.hline(axes.px(0.0, guide).1, LIGHT_GRAY);
    }
    canvas.hline(axes.px(0.0, 0.0).1, BLACK);

    for (k, &d) in deviations.values().iter().enumerate() {
        let color = tier_color(d, thresholds);
        let (x, y) = axes.px(k as f32, d.unwrap_or(0.0));
        canvas.set(x, y, color);
    }
    canvas
}

/// Alignment time map against the ideal diagonal (dashed black).
pub fn rhythm_plot(time_map: &[(f32, f32)], width: usize, height: usize) -> Canvas {
    let mut canvas = Canvas::new(width, height, WHITE);
    if width == 0 || height == 0 || time_map.is_empty() {
        return canvas;
    }
    let t_max = time_map
        .iter()
        .fold(0.0f32, |m, &(a, b)| m.max(a).max(b));
    let axes = Axes::new((0.0, t_max), (0.0, t_max), width, height);

    let steps = width.max(height);
    for k in (0..steps).step_by(8) {
        let t = t_max * k as f32 / steps as f32;
        let (x, y) = axes.px(t, t);
        for d in 0..4 {
            let t2 = t_max * (k + d).min(steps) as f32 / steps as f32;
            let (x2, y2) = axes.px(t2, t2);
            canvas.line((x, y), (x2, y2), BLACK);
        }
    }

    let mut prev: Option<(usize, usize)> = None;
    for &(t_ref, t_cand) in time_map {
        let p = axes.px(t_ref, t_cand);
        if let Some(q) = prev {
            canvas.line(q, p, BLUE);
        }
        prev = Some(p);
    }
    canvas
}

/// Polynomial fit of the viridis colour map, `t` in `[0, 1]`.
fn viridis(t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let r = 0.267004 + t * (0.003991 + t * (1.096452 + t * (-2.146305 + t * 1.167419)));
    let g = 0.004874 + t * (1.015861 + t * (-0.107203 + t * (-0.449175 + t * 0.539506)));
    let b = 0.329415 + t * (1.421511 + t * (-2.482568 + t * (1.871714 + t * -0.140092)));
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0) as u8;
    (byte(r), byte(g), byte(b))
}

/// dB spectrogram of a waveform from 0 Hz up to `max_hz`, one pixel per bin and frame.
///
/// Levels are relative to the loudest bin and floored 80 dB below it; low
/// frequencies are at the bottom.
///
/// # Errors
/// Returns [`crate::Error::InvalidSize`] for an empty waveform.
pub fn spectrogram_plot(waveform: &Waveform, max_hz: f32) -> Result<Canvas> {
    let config = StftConfig::default();
    let magnitude = spectrum::stft_magnitude(&waveform.samples, &config)?;
    let loudest = magnitude.iter().copied().fold(0.0f32, f32::max);
    let db = spectrum::amplitude_to_db(&magnitude, loudest, 1e-5, Some(SPECTROGRAM_TOP_DB));

    let n_rows = spectrum::fft_frequencies(waveform.sample_rate, config.n_fft)
        .iter()
        .take_while(|&&f| f <= max_hz)
        .count()
        .max(1);
    let n_frames = db.ncols();
    let rows = db.slice(ndarray::s![..n_rows, ..]);
    let lo = rows.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = rows.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let span = (hi - lo).max(1e-10);

    let mut canvas = Canvas::new(n_frames, n_rows, BLACK);
    for ((bin, t), &v) in rows.indexed_iter() {
        canvas.set(t, n_rows - 1 - bin, viridis((v - lo) / span));
    }
    Ok(canvas)
}

/// Reference spectrogram above the candidate's, both up to `max_hz`.
pub fn spectrogram_comparison(
    reference: &Waveform,
    candidate: &Waveform,
    max_hz: f32,
) -> Result<Canvas> {
    let panels = [
        spectrogram_plot(reference, max_hz)?,
        spectrogram_plot(candidate, max_hz)?,
    ];
    Ok(Canvas::vstack(&panels, 8, WHITE))
}
