//! FFmpeg-backed toolkit.
//!
//! Extracts audio as mono raw f64 samples at the analysis rate and probes
//! metadata through ffprobe.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::ffprobe::probe_file;
use super::types::{stderr_excerpt, ExtractionError, ExtractionResult, ProbeResult};
use super::MediaToolkit;
use crate::analysis::AudioData;
use crate::config::ToolSettings;
use crate::models::MediaDescriptor;

/// [`MediaToolkit`] that shells out to ffmpeg and ffprobe.
#[derive(Debug, Clone)]
pub struct FfmpegToolkit {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
}

impl FfmpegToolkit {
    /// Use explicit binary paths.
    pub fn new(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Build from the `[tools]` settings section.
    pub fn from_settings(tools: &ToolSettings) -> Self {
        Self::new(&tools.ffmpeg_path, &tools.ffprobe_path)
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe_path
    }
}

impl Default for FfmpegToolkit {
    /// Resolve both tools from `PATH`.
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl MediaToolkit for FfmpegToolkit {
    fn probe(&self, path: &Path) -> ProbeResult<MediaDescriptor> {
        probe_file(&self.ffprobe_path, path)
    }

    fn extract(&self, path: &Path, sample_rate: u32) -> ExtractionResult<AudioData> {
        if !path.exists() {
            return Err(ExtractionError::SourceNotFound(path.to_path_buf()));
        }

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-i")
            .arg(path)
            .arg("-vn") // No video
            .arg("-ac")
            .arg("1") // Mono
            .arg("-ar")
            .arg(sample_rate.to_string())
            .arg("-f")
            .arg("f64le")
            .arg("-acodec")
            .arg("pcm_f64le")
            .arg("-loglevel")
            .arg("error")
            .arg("pipe:1");

        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        tracing::debug!("Running FFmpeg: {:?}", cmd);

        let spawn_error = |e| ExtractionError::Spawn {
            tool: "ffmpeg".to_string(),
            source: e,
        };

        let mut child = cmd.spawn().map_err(spawn_error)?;

        // Drain stdout before waiting so a full pipe can't stall ffmpeg.
        let mut buffer = Vec::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_end(&mut buffer).map_err(spawn_error)?;
        }
        let output = child.wait_with_output().map_err(spawn_error)?;

        if !output.status.success() {
            return Err(ExtractionError::CommandFailed {
                tool: "ffmpeg".to_string(),
                exit_code: output.status.code().unwrap_or(-1),
                message: stderr_excerpt(&output.stderr, 200),
            });
        }

        let samples = bytes_to_f64_samples(&buffer);
        if samples.is_empty() {
            return Err(ExtractionError::Empty(path.to_path_buf()));
        }

        tracing::debug!(
            "Extracted {} samples ({:.2}s) from {}",
            samples.len(),
            samples.len() as f64 / sample_rate as f64,
            path.display()
        );

        Ok(AudioData::new(samples, sample_rate))
    }
}

/// Convert raw little-endian f64 bytes to samples.
///
/// A trailing partial sample is dropped.
fn bytes_to_f64_samples(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .filter_map(|chunk| chunk.try_into().ok().map(f64::from_le_bytes))
        .collect()
}
