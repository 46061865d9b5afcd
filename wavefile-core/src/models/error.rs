use std::io;

use thiserror::Error;

/// Errors that can occur while reading, writing, or converting wave data.
///
/// All errors are reported to the immediate caller; nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WaveFileError {
    /// A `WaveFormat` could not be constructed (bad channel count, sample
    /// rate, or encoding/bit-depth pair).
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// `write`, `read`, or `close` was called on a closed stream.
    #[error("{0} is closed")]
    StreamClosed(&'static str),

    /// The container is structurally broken: bad magic, missing chunk,
    /// sizes that overrun the source, or an incomplete sample frame.
    #[error("malformed container: {0}")]
    Malformed(String),

    /// A recognized but unhandled format, or a conversion that cannot be
    /// performed (e.g. an unsupported channel remapping).
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Sample values that do not fit the format they are tagged with.
    #[error("invalid samples: {0}")]
    InvalidSamples(String),

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<io::Error> for WaveFileError {
    fn from(e: io::Error) -> Self {
        WaveFileError::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WaveFileError>;
