//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::fcpxml::{DEFAULT_EVENT_NAME, DEFAULT_FCPXML_VERSION, DEFAULT_MAX_DENOMINATOR};
use crate::logging::LogLevel;
use crate::matching::{
    CorrelationConfig, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MIN_SAMPLES, DEFAULT_TOLERANCE_SECS,
};
use crate::models::SyncMode;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Matching strategy.
    #[serde(default)]
    pub matching: MatchingSettings,

    /// Waveform correlation tuning.
    #[serde(default)]
    pub correlation: CorrelationSettings,

    /// Output document.
    #[serde(default)]
    pub document: DocumentSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// External tool locations.
    #[serde(default)]
    pub tools: ToolSettings,
}

/// Matching strategy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingSettings {
    /// `"timecode"` or `"audio"`. Kept as a string so an unknown mode is
    /// reported when a run starts rather than failing the whole load.
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Near-miss tolerance for timecode ranges, in seconds.
    #[serde(default = "default_tolerance")]
    pub tolerance_secs: f64,
}

fn default_mode() -> String {
    SyncMode::default().key().to_string()
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE_SECS
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            tolerance_secs: default_tolerance(),
        }
    }
}

/// Waveform correlation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSettings {
    /// Analysis sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Minimum normalized peak to accept a pair (0.0 - 1.0).
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Waveforms shorter than this many samples are skipped.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

fn default_sample_rate() -> u32 {
    crate::analysis::DEFAULT_ANALYSIS_SAMPLE_RATE
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_min_samples() -> usize {
    DEFAULT_MIN_SAMPLES
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            confidence_threshold: default_confidence_threshold(),
            min_samples: default_min_samples(),
        }
    }
}

impl From<&CorrelationSettings> for CorrelationConfig {
    fn from(settings: &CorrelationSettings) -> Self {
        Self {
            sample_rate: settings.sample_rate,
            confidence_threshold: settings.confidence_threshold,
            min_samples: settings.min_samples,
        }
    }
}

/// Output document settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSettings {
    /// Name of the event holding the synced clips.
    #[serde(default = "default_event_name")]
    pub event_name: String,

    /// FCPXML version written on the root element.
    #[serde(default = "default_fcpxml_version")]
    pub fcpxml_version: String,

    /// Largest denominator for free-form rational times.
    #[serde(default = "default_max_denominator")]
    pub max_denominator: u64,
}

fn default_event_name() -> String {
    DEFAULT_EVENT_NAME.to_string()
}

fn default_fcpxml_version() -> String {
    DEFAULT_FCPXML_VERSION.to_string()
}

fn default_max_denominator() -> u64 {
    DEFAULT_MAX_DENOMINATOR
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            event_name: default_event_name(),
            fcpxml_version: default_fcpxml_version(),
            max_denominator: default_max_denominator(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for console output.
    #[serde(default)]
    pub level: LogLevel,

    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of recent lines kept for error reports.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
        }
    }
}

/// External tool paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// ffmpeg binary (name on `PATH` or absolute path).
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,

    /// ffprobe binary (name on `PATH` or absolute path).
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
        }
    }
}

/// Config sections for atomic updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Matching,
    Correlation,
    Document,
    Logging,
    Tools,
}

impl ConfigSection {
    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Matching => "matching",
            ConfigSection::Correlation => "correlation",
            ConfigSection::Document => "document",
            ConfigSection::Logging => "logging",
            ConfigSection::Tools => "tools",
        }
    }

    pub fn all() -> &'static [ConfigSection] {
        &[
            ConfigSection::Matching,
            ConfigSection::Correlation,
            ConfigSection::Document,
            ConfigSection::Logging,
            ConfigSection::Tools,
        ]
    }
}
