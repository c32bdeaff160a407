//! Pitch conversions: Hz to cents, MIDI and note names.

pub(crate) const A4_HZ: f32 = 440.0;
pub(crate) const MIDI_A4: f32 = 69.0;
pub(crate) const CENTS_PER_OCTAVE: f32 = 1200.0;

mod pitch;

pub use pitch::*;

#[cfg(test)]
mod tests;
