//! Video/audio match results.

use serde::{Deserialize, Serialize};

use super::enums::MatchMethod;
use super::media::MediaDescriptor;

/// A video paired with an external audio recording.
///
/// `offset_seconds` keeps the producing matcher's own sign convention:
///
/// - [`MatchMethod::Timecode`]: `video start - audio start` on the
///   recording clock. Positive means the audio started earlier.
/// - [`MatchMethod::Correlation`]: correlation lag divided by the analysis
///   rate. Positive means the audio's first sample lines up that far into
///   the video's waveform, i.e. the audio started later.
///
/// [`SyncMatch::timeline_offset`] converts both into the timecode
/// convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMatch {
    pub video: MediaDescriptor,
    pub audio: MediaDescriptor,
    pub offset_seconds: f64,
    pub method: MatchMethod,
    /// Normalized correlation peak (correlation matches only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl SyncMatch {
    /// Match produced by timecode overlap.
    pub fn by_timecode(video: MediaDescriptor, audio: MediaDescriptor, offset_seconds: f64) -> Self {
        Self {
            video,
            audio,
            offset_seconds,
            method: MatchMethod::Timecode,
            confidence: None,
        }
    }

    /// Match produced by waveform correlation.
    pub fn by_correlation(
        video: MediaDescriptor,
        audio: MediaDescriptor,
        offset_seconds: f64,
        confidence: f64,
    ) -> Self {
        Self {
            video,
            audio,
            offset_seconds,
            method: MatchMethod::Correlation,
            confidence: Some(confidence),
        }
    }

    /// Offset as `video start - audio start`, whatever the method.
    pub fn timeline_offset(&self) -> f64 {
        match self.method {
            MatchMethod::Timecode => self.offset_seconds,
            MatchMethod::Correlation => -self.offset_seconds,
        }
    }

    /// One-line human summary, e.g. `offset +1.250s (audio leads)`.
    pub fn summary(&self) -> String {
        let offset = self.timeline_offset();
        let direction = if offset > 0.0 { "audio leads" } else { "audio trails" };
        match self.confidence {
            Some(conf) => format!(
                "{} <-> {}: offset {:+.3}s ({}), confidence {:.1}%",
                self.video.file_name(),
                self.audio.file_name(),
                offset,
                direction,
                conf * 100.0
            ),
            None => format!(
                "{} <-> {}: offset {:+.3}s ({})",
                self.video.file_name(),
                self.audio.file_name(),
                offset,
                direction
            ),
        }
    }
}

/// Sort matches by video file name for reporting.
pub(crate) fn sort_by_video_name(matches: &mut [SyncMatch]) {
    matches.sort_by_key(|m| m.video.file_name());
}
