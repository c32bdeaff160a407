//! WAV input/output for mono waveforms.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

/// A mono waveform and its sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("hound error: {0}")]
    Hound(#[from] hound::Error),
    #[error("unsupported number of channels")]
    UnsupportedChannels,
}

/// Load a WAV file and mix it down to mono.
///
/// Integer PCM is scaled to `[-1.0, 1.0)`; 32-bit float is read as-is.
///
/// # Errors
/// Returns `crate::Error::Audio` if the file cannot be read or has no channels.
pub fn load_wav<P: AsRef<Path>>(path: P) -> crate::Result<Waveform> {
    let mut reader = WavReader::open(path).map_err(AudioError::Hound)?;
    let spec = reader.spec();

    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AudioError::UnsupportedChannels.into());
    }
    let mut samples: Vec<f32> = Vec::new();

    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => {
            for s in reader.samples::<f32>() {
                samples.push(s.map_err(AudioError::Hound)?);
            }
        }
        (SampleFormat::Int, bits) if bits <= 16 => {
            let scale = (1i32 << (bits - 1)) as f32;
            for s in reader.samples::<i16>() {
                samples.push(s.map_err(AudioError::Hound)? as f32 / scale);
            }
        }
        (SampleFormat::Int, bits) => {
            let scale = (1i64 << (bits - 1)) as f32;
            for s in reader.samples::<i32>() {
                samples.push(s.map_err(AudioError::Hound)? as f32 / scale);
            }
        }
    }

    Ok(Waveform {
        samples: to_mono(&samples, channels),
        sample_rate: spec.sample_rate,
    })
}

/// Average interleaved channels into a single channel.
pub fn to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Save a mono waveform as 16-bit PCM WAV.
///
/// Samples are clipped to `[-1.0, 1.0]` before quantization.
pub fn save_wav<P: AsRef<Path>>(path: P, waveform: &Waveform) -> crate::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(AudioError::Hound)?;
    for &sample in &waveform.samples {
        let s = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(s).map_err(AudioError::Hound)?;
    }
    writer.finalize().map_err(AudioError::Hound)?;
    Ok(())
}

/// Generate a pure tone.
pub fn tone(frequency: f32, sr: u32, duration: f32) -> Vec<f32> {
    let n_samples = (sr as f32 * duration) as usize;
    (0..n_samples)
        .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / sr as f32).sin())
        .collect()
}
