//! Final Cut Pro XML timeline generation.
//!
//! [`TimelineBuilder`] turns matches into an [`FcpxmlDocument`] tree and
//! [`write_document`] serializes it. Each match becomes one `sync-clip`
//! whose spine holds a gap carrying the external audio, then the video.
//!
//! # Usage
//!
//! ```
//! use synchole_core::fcpxml::{build_document, write_document};
//! use synchole_core::models::{MediaDescriptor, SyncMatch};
//! use synchole_core::timecode::Timecode;
//!
//! let video = MediaDescriptor::video("/footage/A001.mov", 10.0, (24, 1), (1920, 1080))
//!     .with_timecode(Timecode::parse("01:00:00:00", 24.0)?);
//! let audio = MediaDescriptor::audio("/sound/T01.wav", 20.0, 48000, 2)
//!     .with_timecode(Timecode::parse("00:59:58:00", 24.0)?);
//!
//! let doc = build_document(&[SyncMatch::by_timecode(video, audio, 2.0)], "Day 1");
//! let xml = write_document(&doc)?;
//! assert!(xml.contains("A001 - Synced"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
pub mod document;
pub mod rational;
mod writer;

pub use builder::{
    asset_id_for, build_document, file_url, TimelineBuilder, DEFAULT_EVENT_NAME,
    DEFAULT_FCPXML_VERSION,
};
pub use document::FcpxmlDocument;
pub use rational::{
    frame_aligned, sample_aligned, seconds_to_rational, whole_seconds, Rational,
    DEFAULT_MAX_DENOMINATOR,
};
pub use writer::{write_document, DocumentError, DocumentResult};
