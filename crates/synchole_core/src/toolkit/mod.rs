//! External media tooling.
//!
//! Probing and waveform extraction are delegated to ffprobe/ffmpeg. The
//! matchers and the session only see the [`MediaToolkit`] trait, so tests
//! drive them with deterministic fakes.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use synchole_core::toolkit::{FfmpegToolkit, MediaToolkit};
//!
//! let toolkit = FfmpegToolkit::default();
//! let descriptor = toolkit.probe(Path::new("/footage/A001.mov"))?;
//! let waveform = toolkit.extract(&descriptor.path, 8000)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod ffmpeg;
mod ffprobe;
mod types;

pub use ffmpeg::FfmpegToolkit;
pub use ffprobe::descriptor_from_ffprobe_json;
pub use types::{ExtractionError, ExtractionResult, ProbeError, ProbeResult};

use std::path::Path;

use crate::analysis::AudioData;
use crate::models::MediaDescriptor;

/// Capability for reading media metadata and decoded audio.
///
/// Each call is a one-shot blocking request; implementations do not retry.
pub trait MediaToolkit {
    /// Read a file's technical profile.
    fn probe(&self, path: &Path) -> ProbeResult<MediaDescriptor>;

    /// Decode a file's audio as mono samples at `sample_rate`.
    ///
    /// Must fail rather than return partial data.
    fn extract(&self, path: &Path, sample_rate: u32) -> ExtractionResult<AudioData>;
}

impl<T: MediaToolkit + ?Sized> MediaToolkit for &T {
    fn probe(&self, path: &Path) -> ProbeResult<MediaDescriptor> {
        (**self).probe(path)
    }

    fn extract(&self, path: &Path, sample_rate: u32) -> ExtractionResult<AudioData> {
        (**self).extract(path, sample_rate)
    }
}
