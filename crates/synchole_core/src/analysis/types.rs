//! Core types for waveform analysis.

use serde::{Deserialize, Serialize};

/// Mono waveform extracted from a source file.
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Samples as f64, already downmixed to mono.
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl AudioData {
    /// Create new audio data from samples.
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        let duration_secs = if sample_rate == 0 {
            0.0
        } else {
            samples.len() as f64 / sample_rate as f64
        };
        Self {
            samples,
            sample_rate,
            duration_secs,
        }
    }

    /// Get the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if audio data is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Peak of a cross-correlation between a reference and a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Signed lag of the peak in samples.
    ///
    /// Positive: the candidate's first sample aligns `lag` samples into the
    /// reference. Negative: the candidate starts before the reference.
    pub lag_samples: i64,
    /// Normalized peak magnitude (0.0 - 1.0).
    pub confidence: f64,
}

impl CorrelationResult {
    /// Result used when a signal has no energy.
    pub fn silent() -> Self {
        Self {
            lag_samples: 0,
            confidence: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_data_computes_duration() {
        let audio = AudioData::new(vec![0.0; 16000], 8000);
        assert_eq!(audio.len(), 16000);
        assert!((audio.duration_secs - 2.0).abs() < 1e-12);
    }
}
