//! Sync Hole Core - aligns video footage with separately recorded audio
//!
//! Pairs each video with its external audio recording, either by embedded
//! timecode or by waveform cross-correlation, and emits an FCPXML timeline
//! of synchronized clips.
//!
//! The crate has no UI dependencies. [`session::SyncSession`] drives a full
//! run; the matchers and the document builder can also be used directly.

pub mod analysis;
pub mod config;
pub mod fcpxml;
pub mod logging;
pub mod matching;
pub mod models;
pub mod session;
pub mod timecode;
pub mod toolkit;

pub use session::{SyncError, SyncReport, SyncResult, SyncSession};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
