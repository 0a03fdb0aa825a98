//! Probed media descriptors.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::timecode::Timecode;

/// Where a descriptor's start timecode came from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimecodeSource {
    /// The file carried no usable timecode.
    #[default]
    Absent,
    /// Read from the file's metadata.
    Embedded { timecode: Timecode },
    /// Broadcast WAV sample offset since midnight. `timecode` is the
    /// display reading; the start itself stays sample-exact.
    TimeReference {
        timecode: Timecode,
        samples: u64,
        sample_rate: u32,
    },
    /// Backfilled after acoustic matching.
    ///
    /// `seconds` keeps the exact start; `timecode` is its frame-quantized
    /// reading for display.
    Synthesized { timecode: Timecode, seconds: f64 },
}

impl TimecodeSource {
    /// The timecode, observed or synthesized.
    pub fn timecode(&self) -> Option<&Timecode> {
        match self {
            Self::Absent => None,
            Self::Embedded { timecode }
            | Self::TimeReference { timecode, .. }
            | Self::Synthesized { timecode, .. } => Some(timecode),
        }
    }

    /// Start position in seconds, exact for sample references and
    /// synthesized values.
    pub fn start_seconds(&self) -> Option<f64> {
        match self {
            Self::Absent => None,
            Self::Embedded { timecode } => Some(timecode.to_seconds()),
            Self::TimeReference {
                samples,
                sample_rate,
                ..
            } => Some(*samples as f64 / (*sample_rate).max(1) as f64),
            Self::Synthesized { seconds, .. } => Some(*seconds),
        }
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self, Self::Synthesized { .. })
    }
}

/// Technical profile of one probed file.
///
/// `path` is the identity key and should be absolute; the document
/// builder hashes it into asset ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub path: PathBuf,
    #[serde(default)]
    pub timecode: TimecodeSource,
    /// Duration in seconds.
    pub duration: f64,
    pub has_video: bool,
    pub has_audio: bool,
    pub fps_num: u32,
    pub fps_den: u32,
    /// Pixels; 0 for audio-only files.
    pub width: u32,
    pub height: u32,
    /// Hz.
    pub sample_rate: u32,
    pub channels: u32,
}

impl MediaDescriptor {
    /// Descriptor for a video file (with a scratch audio track).
    pub fn video(
        path: impl Into<PathBuf>,
        duration: f64,
        (fps_num, fps_den): (u32, u32),
        (width, height): (u32, u32),
    ) -> Self {
        Self {
            path: path.into(),
            timecode: TimecodeSource::Absent,
            duration,
            has_video: true,
            has_audio: true,
            fps_num,
            fps_den,
            width,
            height,
            sample_rate: 48000,
            channels: 2,
        }
    }

    /// Descriptor for an audio-only file.
    pub fn audio(path: impl Into<PathBuf>, duration: f64, sample_rate: u32, channels: u32) -> Self {
        Self {
            path: path.into(),
            timecode: TimecodeSource::Absent,
            duration,
            has_video: false,
            has_audio: true,
            fps_num: 30,
            fps_den: 1,
            width: 0,
            height: 0,
            sample_rate,
            channels,
        }
    }

    /// Attach an embedded timecode.
    pub fn with_timecode(mut self, timecode: Timecode) -> Self {
        self.timecode = TimecodeSource::Embedded { timecode };
        self
    }

    /// Set audio stream properties.
    pub fn with_audio(mut self, sample_rate: u32, channels: u32) -> Self {
        self.has_audio = true;
        self.sample_rate = sample_rate;
        self.channels = channels;
        self
    }

    /// Mark the file as having no audio stream.
    pub fn without_audio(mut self) -> Self {
        self.has_audio = false;
        self
    }

    /// Copy of this descriptor carrying a synthesized start.
    pub fn with_synthesized_timecode(&self, timecode: Timecode, seconds: f64) -> Self {
        Self {
            timecode: TimecodeSource::Synthesized { timecode, seconds },
            ..self.clone()
        }
    }

    /// Frame rate as a float; falls back to 30 fps when the ratio is degenerate.
    pub fn fps(&self) -> f64 {
        if self.fps_num == 0 || self.fps_den == 0 {
            30.0
        } else {
            self.fps_num as f64 / self.fps_den as f64
        }
    }

    pub fn timecode(&self) -> Option<&Timecode> {
        self.timecode.timecode()
    }

    pub fn has_timecode(&self) -> bool {
        self.timecode.timecode().is_some()
    }

    /// Start position on the recording clock, if known.
    pub fn start_seconds(&self) -> Option<f64> {
        self.timecode.start_seconds()
    }

    /// File name component, used for sorting and diagnostics.
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }

    /// File stem, used for clip names.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name())
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
