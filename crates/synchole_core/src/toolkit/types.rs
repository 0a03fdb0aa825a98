//! Error types for probing and extraction.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reading one file's metadata.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Source file not found.
    #[error("Source file not found: {0}")]
    SourceNotFound(PathBuf),

    /// The tool could not be started.
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The tool ran but reported failure.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// Output was not the JSON we expected.
    #[error("Failed to parse ffprobe output: {0}")]
    InvalidOutput(#[from] serde_json::Error),

    /// A required property was missing or unusable.
    #[error("{path}: missing {what}")]
    MissingField { path: PathBuf, what: &'static str },

    /// No video or audio stream at all.
    #[error("No video or audio stream in {0}")]
    NoStreams(PathBuf),
}

/// Failure decoding one file's waveform.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Source file not found.
    #[error("Source file not found: {0}")]
    SourceNotFound(PathBuf),

    /// The tool could not be started.
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// FFmpeg exited with an error (e.g. no audio track).
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// Decoding succeeded but produced nothing.
    #[error("No audio samples extracted from {0}")]
    Empty(PathBuf),
}

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Result type for extraction operations.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// First `max` characters of tool stderr, for error messages.
pub(crate) fn stderr_excerpt(stderr: &[u8], max: usize) -> String {
    String::from_utf8_lossy(stderr).trim().chars().take(max).collect()
}
