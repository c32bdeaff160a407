/// Crate-level error type for the warble intonation library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A pitch curve has no frames.
    #[error("{which} pitch curve is empty")]
    EmptyContour { which: &'static str },

    /// `times` and `frequencies` of a pitch curve disagree in length.
    #[error("pitch curve length mismatch: {times} times, {frequencies} frequencies")]
    LengthMismatch { times: usize, frequencies: usize },

    /// Frame times are not finite and strictly increasing.
    #[error("pitch curve times are not strictly increasing at frame {index}")]
    NonMonotonicTimes { index: usize },

    /// Invalid parameter value.
    #[error("invalid parameter `{name}`: got {value}, {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A required dimension is zero or invalid.
    #[error("invalid size for `{name}`: {value} ({reason})")]
    InvalidSize {
        name: &'static str,
        value: usize,
        reason: &'static str,
    },

    /// Vocal isolation or pitch tracking failed.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Audio I/O errors.
    #[error(transparent)]
    Audio(#[from] crate::io::AudioError),

    /// File I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for warble operations.
pub type Result<T> = std::result::Result<T, Error>;
