//! Data models for Sync Hole.
//!
//! - Enums for sync strategy and match provenance
//! - Media descriptors produced by probing
//! - Match results consumed by the document builder

mod enums;
mod matches;
mod media;

pub use enums::{MatchMethod, SyncMode};
pub use matches::SyncMatch;
pub use media::{MediaDescriptor, TimecodeSource};

pub(crate) use matches::sort_by_video_name;
pub(crate) use media::file_name_of;
