//! Vocal isolation backends.

use crate::io::{load_wav, save_wav, Waveform};
use crate::pipeline::VocalSeparator;
use crate::{Error, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns its input unchanged, for recordings that are already a cappella.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl VocalSeparator for Passthrough {
    fn separate(&self, mixture: &Waveform) -> Result<Waveform> {
        Ok(mixture.clone())
    }
}

static JOB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Runs the `demucs` two-stem separation as a subprocess.
///
/// Each call writes the mixture to `work_dir/<job>.wav`, runs
/// `demucs --two-stems vocals -n <model> -o <work_dir> <job>.wav` and reads
/// back `work_dir/<model>/<job>/vocals.wav`. The job input and every stem
/// demucs wrote for it are removed once the call returns, whether or not
/// separation succeeded.
#[derive(Debug, Clone)]
pub struct DemucsSeparator {
    pub program: PathBuf,
    pub model: String,
    pub work_dir: PathBuf,
}

impl DemucsSeparator {
    pub fn new<P: AsRef<Path>>(work_dir: P) -> Self {
        Self {
            program: PathBuf::from("demucs"),
            model: "htdemucs".to_string(),
            work_dir: work_dir.as_ref().to_path_buf(),
        }
    }

    pub fn with_program<P: AsRef<Path>>(mut self, program: P) -> Self {
        self.program = program.as_ref().to_path_buf();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Location demucs writes the vocal stem of `job` to.
    pub fn vocals_path(&self, job: &str) -> PathBuf {
        self.work_dir.join(&self.model).join(job).join("vocals.wav")
    }
}

impl DemucsSeparator {
    fn run(&self, input: &Path, job: &str) -> Result<Waveform> {
        debug!("demucs: separating {}", input.display());
        let output = Command::new(&self.program)
            .arg("--two-stems")
            .arg("vocals")
            .arg("-n")
            .arg(&self.model)
            .arg("-o")
            .arg(&self.work_dir)
            .arg(input)
            .output()
            .map_err(|e| {
                Error::Extraction(format!("failed to run {}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            warn!(
                "demucs stderr: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(Error::Extraction(format!(
                "demucs exited with {}",
                output.status
            )));
        }

        let vocals = self.vocals_path(job);
        if !vocals.exists() {
            return Err(Error::Extraction(format!(
                "demucs produced no vocal stem at {}",
                vocals.display()
            )));
        }
        load_wav(&vocals)
    }

    /// Remove the job input, its stem directory and the model directory once empty.
    fn cleanup(&self, input: &Path, job: &str) {
        let model_dir = self.work_dir.join(&self.model);
        let stems = model_dir.join(job);
        if let Err(e) = std::fs::remove_file(input) {
            debug!("demucs: could not remove {}: {}", input.display(), e);
        }
        if stems.exists() {
            if let Err(e) = std::fs::remove_dir_all(&stems) {
                warn!("demucs: could not remove {}: {}", stems.display(), e);
            }
        }
        // Fails while another job still has stems here
        let _ = std::fs::remove_dir(&model_dir);
    }
}

impl VocalSeparator for DemucsSeparator {
    fn separate(&self, mixture: &Waveform) -> Result<Waveform> {
        std::fs::create_dir_all(&self.work_dir)?;
        let job = format!(
            "mix_{}_{}",
            std::process::id(),
            JOB_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let input = self.work_dir.join(format!("{}.wav", job));
        save_wav(&input, mixture)?;

        let result = self.run(&input, &job);
        self.cleanup(&input, &job);
        result
    }
}
