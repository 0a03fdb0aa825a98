//! SMPTE-style timecode values.
//!
//! A `Timecode` is a clock reading (`HH:MM:SS:FF`) tied to a frame rate.
//! Drop-frame markers (`;`) are accepted on input but carry no meaning;
//! output always uses `:`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing a timecode string.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimecodeError {
    /// The string did not split into exactly four fields.
    #[error("Timecode '{input}' must have 4 fields, found {found}")]
    FieldCount { input: String, found: usize },

    /// A field was not a non-negative integer.
    #[error("Timecode '{input}' has a non-numeric field '{field}'")]
    InvalidField { input: String, field: String },

    /// Frame rate was zero, negative or not finite.
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),
}

/// Result type for timecode operations.
pub type TimecodeResult<T> = Result<T, TimecodeError>;

/// An immutable timecode reading at a given frame rate.
///
/// `frames < round(fps)` is expected but not enforced; out-of-range
/// fields from malformed metadata are carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timecode {
    hours: u32,
    minutes: u32,
    seconds: u32,
    frames: u32,
    fps: f64,
}

impl Timecode {
    /// Build a timecode from its fields.
    pub fn new(hours: u32, minutes: u32, seconds: u32, frames: u32, fps: f64) -> TimecodeResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(TimecodeError::InvalidFrameRate(fps));
        }
        Ok(Self {
            hours,
            minutes,
            seconds,
            frames,
            fps,
        })
    }

    /// Parse `HH:MM:SS:FF` (or `HH:MM:SS;FF`, `HH;MM;SS;FF`) at `fps`.
    pub fn parse(input: &str, fps: f64) -> TimecodeResult<Self> {
        let fields: Vec<&str> = input.trim().split([':', ';']).collect();
        if fields.len() != 4 {
            return Err(TimecodeError::FieldCount {
                input: input.to_string(),
                found: fields.len(),
            });
        }

        let mut values = [0u32; 4];
        for (slot, field) in values.iter_mut().zip(&fields) {
            let trimmed = field.trim();
            let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
            *slot = digits.parse().map_err(|_| TimecodeError::InvalidField {
                input: input.to_string(),
                field: field.to_string(),
            })?;
        }

        Self::new(values[0], values[1], values[2], values[3], fps)
    }

    /// Build the timecode nearest to `seconds` at `fps`.
    ///
    /// Negative inputs clamp to zero. Frames are rounded to the nearest
    /// whole frame, carrying into seconds when they reach `round(fps)`.
    pub fn from_seconds(seconds: f64, fps: f64) -> TimecodeResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(TimecodeError::InvalidFrameRate(fps));
        }
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };

        let mut whole = seconds.floor() as u64;
        let nominal = (fps.round() as u64).max(1);
        let mut frames = ((seconds - seconds.floor()) * fps).round() as u64;
        if frames >= nominal {
            whole += 1;
            frames = 0;
        }

        Self::new(
            (whole / 3600) as u32,
            ((whole % 3600) / 60) as u32,
            (whole % 60) as u32,
            frames as u32,
            fps,
        )
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Seconds since `00:00:00:00`.
    pub fn to_seconds(&self) -> f64 {
        self.hours as f64 * 3600.0
            + self.minutes as f64 * 60.0
            + self.seconds as f64
            + self.frames as f64 / self.fps
    }

    /// Zero-padded `HH:MM:SS:FF`.
    pub fn format(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colon_separated() {
        let tc = Timecode::parse("01:02:03:04", 24.0).unwrap();
        assert_eq!(tc.hours(), 1);
        assert_eq!(tc.minutes(), 2);
        assert_eq!(tc.seconds(), 3);
        assert_eq!(tc.frames(), 4);
    }

    #[test]
    fn accepts_drop_frame_separator() {
        let ndf = Timecode::parse("00:59:58:12", 29.97).unwrap();
        let df = Timecode::parse("00:59:58;12", 29.97).unwrap();
        assert_eq!(ndf.to_seconds(), df.to_seconds());
        assert_eq!(df.format(), "00:59:58:12");
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(matches!(
            Timecode::parse("01:00:00", 24.0),
            Err(TimecodeError::FieldCount { found: 3, .. })
        ));
        assert!(matches!(
            Timecode::parse("01:00:00:00:00", 24.0),
            Err(TimecodeError::FieldCount { found: 5, .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_field() {
        assert!(matches!(
            Timecode::parse("01:xx:00:00", 24.0),
            Err(TimecodeError::InvalidField { .. })
        ));
        assert!(Timecode::parse("01::00:00", 24.0).is_err());
    }

    #[test]
    fn rejects_bad_frame_rate() {
        assert!(Timecode::parse("01:00:00:00", 0.0).is_err());
        assert!(Timecode::parse("01:00:00:00", f64::NAN).is_err());
    }

    #[test]
    fn malformed_frames_pass_through() {
        let tc = Timecode::parse("00:00:01:30", 24.0).unwrap();
        assert_eq!(tc.frames(), 30);
        assert!((tc.to_seconds() - 2.25).abs() < 1e-9);
    }

    #[test]
    fn to_seconds_combines_fields() {
        let tc = Timecode::parse("01:00:00:12", 24.0).unwrap();
        assert!((tc.to_seconds() - 3600.5).abs() < 1e-9);
    }

    #[test]
    fn format_reparse_is_stable() {
        for input in ["1:2:3:4", "10;20;30;5", " 00:00:00:00 ", "23:59:59:23"] {
            let first = Timecode::parse(input, 25.0).unwrap();
            let again = Timecode::parse(&first.format(), 25.0).unwrap();
            assert_eq!(first.to_seconds(), again.to_seconds(), "input {input}");
        }
    }

    #[test]
    fn one_frame_is_one_over_fps() {
        for fps in [23.976, 24.0, 25.0, 29.97, 60.0] {
            let a = Timecode::new(0, 10, 5, 3, fps).unwrap();
            let b = Timecode::new(0, 10, 5, 4, fps).unwrap();
            let delta = b.to_seconds() - a.to_seconds();
            assert!((delta - 1.0 / fps).abs() < 1e-9, "fps {fps}");
        }
    }

    #[test]
    fn from_seconds_round_trips_whole_frames() {
        let tc = Timecode::from_seconds(3600.0, 24.0).unwrap();
        assert_eq!(tc.format(), "01:00:00:00");

        let tc = Timecode::from_seconds(3598.5, 24.0).unwrap();
        assert_eq!(tc.format(), "00:59:58:12");
    }

    #[test]
    fn from_seconds_carries_full_second() {
        let tc = Timecode::from_seconds(9.999, 24.0).unwrap();
        assert_eq!(tc.format(), "00:00:10:00");
    }

    #[test]
    fn from_seconds_clamps_negative() {
        let tc = Timecode::from_seconds(-4.0, 24.0).unwrap();
        assert_eq!(tc.to_seconds(), 0.0);
    }
}
