//! Core enums used throughout the library.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Strategy used to pair video files with external audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Overlap of embedded production timecode.
    #[default]
    Timecode,
    /// FFT cross-correlation of extracted waveforms.
    Audio,
}

impl SyncMode {
    /// Get the display name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Timecode => "Timecode",
            Self::Audio => "Audio Waveform",
        }
    }

    /// Key used in config files.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Timecode => "timecode",
            Self::Audio => "audio",
        }
    }

    /// Get all available modes.
    pub fn all() -> &'static [SyncMode] {
        &[Self::Timecode, Self::Audio]
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SyncMode {
    type Err = String;

    /// Parse a mode key. Unknown keys are returned verbatim as the error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "timecode" | "tc" => Ok(Self::Timecode),
            "audio" | "waveform" => Ok(Self::Audio),
            _ => Err(s.to_string()),
        }
    }
}

/// How a particular match was produced.
///
/// The two methods use different offset sign conventions, see
/// [`SyncMatch`](super::SyncMatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Timecode,
    Correlation,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMethod::Timecode => write!(f, "timecode"),
            MatchMethod::Correlation => write!(f, "correlation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_mode_parses_aliases() {
        assert_eq!("timecode".parse::<SyncMode>(), Ok(SyncMode::Timecode));
        assert_eq!(" Audio ".parse::<SyncMode>(), Ok(SyncMode::Audio));
        assert_eq!("waveform".parse::<SyncMode>(), Ok(SyncMode::Audio));
    }

    #[test]
    fn sync_mode_rejects_unknown() {
        assert_eq!("video-diff".parse::<SyncMode>(), Err("video-diff".to_string()));
    }

    #[test]
    fn sync_mode_serializes_lowercase() {
        let json = serde_json::to_string(&SyncMode::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
    }
}
