//! Pairing video files with external audio recordings.
//!
//! Two strategies:
//!
//! - [`TimecodeMatcher`]: overlap of embedded timecode ranges. Cheap, and
//!   exact when the recorders were jam-synced.
//! - [`CorrelationMatcher`]: FFT cross-correlation of extracted waveforms,
//!   for footage without usable timecode.
//!
//! Both assign greedily and return matches sorted by video file name.

mod correlation;
mod timecode;
pub mod types;

pub use correlation::{
    CorrelationConfig, CorrelationEvent, CorrelationMatcher, PairCorrelations, PairScore,
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MIN_SAMPLES, SYNTHESIZED_BASE_SECS,
};
pub use timecode::{TimecodeMatcher, DEFAULT_TOLERANCE_SECS};
pub use types::{MatchError, MatchResult};
