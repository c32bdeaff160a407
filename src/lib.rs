//! Vocal intonation comparison for Rust.
//!
//! Warble compares a learner's sung performance with a reference take. Both
//! recordings become pitch curves, the curves are aligned in time with
//! dynamic time warping on a cents scale, and the aligned pitch difference is
//! summarized into accuracy tiers, statistics and a verdict.
//!
//! # Quick Start
//!
//! ```rust
//! use warble::{pipeline, PitchCurve};
//!
//! let times = vec![0.0, 0.01, 0.02];
//! let reference = PitchCurve::new(times.clone(), vec![Some(440.0); 3]).unwrap();
//! let candidate = PitchCurve::new(times, vec![Some(466.16); 3]).unwrap();
//!
//! let result = pipeline::compare(&reference, &candidate, &pipeline::CompareConfig::default()).unwrap();
//! let summary = result.report.summary().unwrap();
//! assert_eq!(summary.seriously_off, 3);
//! assert!(summary.mean > 99.0);
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`curve`] | Validated pitch curves with explicit unvoiced frames |
//! | [`convert`] | Hz to cents, MIDI and note names |
//! | [`align`] | DTW alignment, alignment paths, timing map |
//! | [`deviation`] | Per-step pitch deviation along a path |
//! | [`classify`] | Accuracy tiers, statistics and verdict |
//! | [`report`] | Plain-text report rendering |
//! | [`pipeline`] | One-call comparison, separator and tracker traits |
//! | [`track`] | pYIN pitch tracker |
//! | [`separate`] | Pass-through and demucs vocal separation |
//! | [`io`] | WAV loading and saving |
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Empty or malformed curves are errors;
//! a comparison with no voiced overlap is not, and comes back as
//! [`classify::AccuracyReport::InsufficientData`].
//!
//! # Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `parallel` | Track both recordings concurrently with rayon (default) |
//! | `display` | PPM plots of pitch, deviation, timing and vocal spectrograms |

#![deny(unsafe_code)]

pub mod error;
pub use error::{Error, Result};

pub mod align;
pub mod classify;
pub mod convert;
pub mod curve;
pub mod deviation;
pub mod io;
pub mod pipeline;
pub mod report;
pub mod separate;
pub mod track;

#[cfg(feature = "display")]
pub mod display;
#[cfg(feature = "display")]
pub mod spectrum;

pub use align::{Alignment, AlignmentPath};
pub use classify::{AccuracyReport, AccuracyThresholds};
pub use curve::PitchCurve;
pub use deviation::DeviationSeries;
