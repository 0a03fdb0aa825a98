//! In-memory FCPXML document tree.
//!
//! Plain data: built by [`TimelineBuilder`](super::TimelineBuilder) and
//! serialized by [`write_document`](super::write_document).

use super::rational::Rational;

/// Root `<fcpxml>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct FcpxmlDocument {
    pub version: String,
    pub resources: Resources,
    pub event: Event,
}

/// `<resources>`: formats first, then assets, each in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resources {
    pub formats: Vec<Format>,
    pub assets: Vec<Asset>,
}

/// A shared `<format>` resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Format {
    Video(VideoFormat),
    Audio(AudioFormat),
}

impl Format {
    pub fn id(&self) -> &str {
        match self {
            Format::Video(f) => &f.id,
            Format::Audio(f) => &f.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoFormat {
    pub id: String,
    /// e.g. `FFVideoFormat1080p23.98`
    pub name: String,
    pub frame_duration: Rational,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioFormat {
    pub id: String,
    /// e.g. `FFAudioFormat48k`
    pub name: String,
    pub audio_rate: u32,
    pub audio_channels: u32,
}

/// One source file, with a single `<media-rep>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: String,
    pub name: String,
    /// Media start on the recording clock.
    pub start: Rational,
    pub duration: Rational,
    pub format: String,
    pub has_video: bool,
    pub has_audio: bool,
    pub audio_channels: u32,
    pub audio_rate: u32,
    /// `file://` URL of the absolute path.
    pub src: String,
}

/// `<event>` holding the synced clips.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub clips: Vec<SyncClip>,
}

/// `<sync-clip>` for one video/audio pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncClip {
    pub name: String,
    pub duration: Rational,
    pub format: String,
    pub tc_format: String,
    pub spine: Spine,
}

/// The clip's primary storyline: a gap carrying the external audio,
/// followed by the video.
#[derive(Debug, Clone, PartialEq)]
pub struct Spine {
    pub gap: Gap,
    pub video: AssetClip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gap {
    pub name: String,
    pub offset: Rational,
    pub start: Rational,
    pub duration: Rational,
    pub audio: AssetClip,
}

/// `<asset-clip>` referencing an [`Asset`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssetClip {
    pub asset_ref: String,
    pub name: String,
    pub offset: Rational,
    pub start: Rational,
    pub duration: Rational,
    /// Only set on video clips.
    pub format: Option<String>,
    pub tc_format: String,
    pub audio_role: String,
}
