//! Error types for matching.

use thiserror::Error;

use crate::timecode::TimecodeError;

/// How many offending file names an error message lists.
const MAX_EXAMPLES: usize = 3;

/// Matching could not start, or could not finish a pairing.
#[derive(Error, Debug)]
pub enum MatchError {
    /// No video files to match.
    #[error("No video files to match")]
    NoVideoFiles,

    /// No audio files to match.
    #[error("No audio files to match")]
    NoAudioFiles,

    /// None of the video files carries a timecode.
    #[error("No video file has an embedded timecode (e.g. {})", .examples.join(", "))]
    NoVideoTimecode { examples: Vec<String> },

    /// None of the audio files carries a timecode.
    #[error("No audio file has an embedded timecode (e.g. {})", .examples.join(", "))]
    NoAudioTimecode { examples: Vec<String> },

    /// A placeholder timecode could not be built.
    #[error("Failed to synthesize timecode: {0}")]
    Timecode(#[from] TimecodeError),
}

impl MatchError {
    /// Video-side error naming the first few files.
    pub fn no_video_timecode<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NoVideoTimecode {
            examples: names.into_iter().take(MAX_EXAMPLES).map(Into::into).collect(),
        }
    }

    /// Audio-side error naming the first few files.
    pub fn no_audio_timecode<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NoAudioTimecode {
            examples: names.into_iter().take(MAX_EXAMPLES).map(Into::into).collect(),
        }
    }
}

/// Result type for matching operations.
pub type MatchResult<T> = Result<T, MatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn examples_are_capped() {
        let err = MatchError::no_video_timecode(["a.mov", "b.mov", "c.mov", "d.mov"]);
        match &err {
            MatchError::NoVideoTimecode { examples } => assert_eq!(examples.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "No video file has an embedded timecode (e.g. a.mov, b.mov, c.mov)"
        );
    }

    #[test]
    fn audio_message_is_distinct() {
        let err = MatchError::no_audio_timecode(vec!["T01.wav".to_string()]);
        assert!(err.to_string().starts_with("No audio file"));
    }
}
