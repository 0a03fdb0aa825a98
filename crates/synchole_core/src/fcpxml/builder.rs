//! Builds the document tree from a match list.
//!
//! Pure transform: no I/O. Formats are shared per signature, assets per
//! absolute path, so re-running on the same inputs yields the same ids.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::document::{
    Asset, AssetClip, AudioFormat, Event, FcpxmlDocument, Format, Gap, Resources, Spine,
    SyncClip, VideoFormat,
};
use super::rational::{
    frame_aligned, sample_aligned, seconds_to_rational, whole_seconds, Rational,
    DEFAULT_MAX_DENOMINATOR,
};
use crate::config::DocumentSettings;
use crate::models::{MediaDescriptor, SyncMatch};

pub const DEFAULT_FCPXML_VERSION: &str = "1.11";
pub const DEFAULT_EVENT_NAME: &str = "Synced Clips";

const TC_FORMAT: &str = "NDF";
const VIDEO_ROLE: &str = "dialogue";
const AUDIO_ROLE: &str = "dialogue.dialogue-1";

/// Characters left unescaped in file URLs: unreserved plus `/`.
const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Accumulates matches into an [`FcpxmlDocument`].
#[derive(Debug)]
pub struct TimelineBuilder {
    event_name: String,
    version: String,
    max_denominator: u64,
    formats: Vec<Format>,
    video_formats: HashMap<(u32, u32, u32, u32), String>,
    audio_formats: HashMap<(u32, u32), String>,
    assets: Vec<Asset>,
    asset_ids: HashMap<PathBuf, String>,
    clips: Vec<SyncClip>,
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_NAME)
    }
}

impl TimelineBuilder {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            version: DEFAULT_FCPXML_VERSION.to_string(),
            max_denominator: DEFAULT_MAX_DENOMINATOR,
            formats: Vec::new(),
            video_formats: HashMap::new(),
            audio_formats: HashMap::new(),
            assets: Vec::new(),
            asset_ids: HashMap::new(),
            clips: Vec::new(),
        }
    }

    /// Builder configured from the `[document]` settings section.
    pub fn from_settings(settings: &DocumentSettings) -> Self {
        Self::new(settings.event_name.clone())
            .with_version(settings.fcpxml_version.clone())
            .with_max_denominator(settings.max_denominator)
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_max_denominator(mut self, max_denominator: u64) -> Self {
        self.max_denominator = max_denominator.max(1);
        self
    }

    /// Add one synced clip, registering its formats and assets.
    pub fn add_match(&mut self, m: &SyncMatch) -> &mut Self {
        let video = &m.video;
        let audio = &m.audio;

        let video_format = self.video_format_id(video);
        let video_asset = self.asset_id(video, &video_format, true);
        let audio_format = self.audio_format_id(audio);
        let audio_asset = self.asset_id(audio, &audio_format, false);

        let v_tc = video.start_seconds().unwrap_or(0.0);
        let a_tc = audio.start_seconds().unwrap_or(0.0);

        // Positive when the audio started first.
        let diff = v_tc - a_tc;
        let gap_secs = diff.round().max(0.0);

        // Audio time `a_tc + diff` (= v_tc) must land where the video starts,
        // at `gap_secs` on the clip timeline. A negative lead-in trims the
        // audio's head instead.
        let lead_in = gap_secs - diff;
        let (audio_offset, audio_start, audio_duration) = if lead_in >= 0.0 {
            (lead_in, a_tc, audio.duration)
        } else {
            (0.0, a_tc - lead_in, (audio.duration + lead_in).max(0.0))
        };

        let audio_clip = AssetClip {
            asset_ref: audio_asset,
            name: audio.stem(),
            offset: sample_aligned(audio_offset, audio.sample_rate),
            start: sample_aligned(audio_start, audio.sample_rate),
            duration: sample_aligned(audio_duration, audio.sample_rate),
            format: None,
            tc_format: TC_FORMAT.to_string(),
            audio_role: AUDIO_ROLE.to_string(),
        };

        let video_clip = AssetClip {
            asset_ref: video_asset,
            name: video.stem(),
            offset: Rational::whole(gap_secs as i64),
            start: frame_aligned(v_tc, video.fps_num, video.fps_den),
            duration: frame_aligned(video.duration, video.fps_num, video.fps_den),
            format: Some(video_format.clone()),
            tc_format: TC_FORMAT.to_string(),
            audio_role: VIDEO_ROLE.to_string(),
        };

        tracing::debug!(
            "Clip {}: gap {}s, audio offset {:.6}s",
            video.stem(),
            gap_secs,
            audio_offset
        );

        self.clips.push(SyncClip {
            name: format!("{} - Synced", video.stem()),
            duration: whole_seconds(gap_secs + video.duration),
            format: video_format,
            tc_format: TC_FORMAT.to_string(),
            spine: Spine {
                gap: Gap {
                    name: "Gap".to_string(),
                    offset: Rational::ZERO,
                    start: Rational::ZERO,
                    duration: Rational::whole(gap_secs as i64),
                    audio: audio_clip,
                },
                video: video_clip,
            },
        });
        self
    }

    pub fn build(self) -> FcpxmlDocument {
        FcpxmlDocument {
            version: self.version,
            resources: Resources {
                formats: self.formats,
                assets: self.assets,
            },
            event: Event {
                name: self.event_name,
                clips: self.clips,
            },
        }
    }

    fn next_format_id(&self) -> String {
        format!("r{}", self.formats.len() + 1)
    }

    fn video_format_id(&mut self, video: &MediaDescriptor) -> String {
        let key = (video.width, video.height, video.fps_num, video.fps_den);
        if let Some(id) = self.video_formats.get(&key) {
            return id.clone();
        }

        let id = self.next_format_id();
        self.formats.push(Format::Video(VideoFormat {
            id: id.clone(),
            name: video_format_name(video),
            frame_duration: self.frame_duration(video),
            width: video.width,
            height: video.height,
        }));
        self.video_formats.insert(key, id.clone());
        id
    }

    /// Exact `fps_den/fps_num`; a degenerate rate falls back to the
    /// descriptor's nominal fps.
    fn frame_duration(&self, video: &MediaDescriptor) -> Rational {
        if video.fps_num == 0 || video.fps_den == 0 {
            return seconds_to_rational(1.0 / video.fps(), self.max_denominator);
        }
        Rational::reduced(video.fps_den as i64, video.fps_num as u64)
    }

    fn audio_format_id(&mut self, audio: &MediaDescriptor) -> String {
        let key = (audio.sample_rate, audio.channels);
        if let Some(id) = self.audio_formats.get(&key) {
            return id.clone();
        }

        let id = self.next_format_id();
        self.formats.push(Format::Audio(AudioFormat {
            id: id.clone(),
            name: audio_format_name(audio.sample_rate),
            audio_rate: audio.sample_rate,
            audio_channels: audio.channels,
        }));
        self.audio_formats.insert(key, id.clone());
        id
    }

    fn asset_id(&mut self, media: &MediaDescriptor, format: &str, is_video: bool) -> String {
        if let Some(id) = self.asset_ids.get(&media.path) {
            return id.clone();
        }

        let id = asset_id_for(&media.path);
        let tc = media.start_seconds().unwrap_or(0.0);
        let (start, duration) = if is_video {
            (
                frame_aligned(tc, media.fps_num, media.fps_den),
                frame_aligned(media.duration, media.fps_num, media.fps_den),
            )
        } else {
            (
                sample_aligned(tc, media.sample_rate),
                sample_aligned(media.duration, media.sample_rate),
            )
        };

        self.assets.push(Asset {
            id: id.clone(),
            name: media.stem(),
            start,
            duration,
            format: format.to_string(),
            has_video: is_video && media.has_video,
            has_audio: media.has_audio || !is_video,
            audio_channels: media.channels,
            audio_rate: media.sample_rate,
            src: file_url(&media.path),
        });
        self.asset_ids.insert(media.path.clone(), id.clone());
        id
    }
}

/// Build a complete document for `matches` in one call.
pub fn build_document(matches: &[SyncMatch], event_name: &str) -> FcpxmlDocument {
    let mut builder = TimelineBuilder::new(event_name);
    for m in matches {
        builder.add_match(m);
    }
    builder.build()
}

/// `r` + first 8 hex digits of the MD5 of the path.
pub fn asset_id_for(path: &Path) -> String {
    let digest = md5::compute(path.to_string_lossy().as_bytes());
    let hex = format!("{:x}", digest);
    format!("r{}", &hex[..8])
}

/// `file://` URL with the path percent-encoded.
pub fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy();
    format!("file://{}", utf8_percent_encode(&path, PATH_SET))
}

fn video_format_name(video: &MediaDescriptor) -> String {
    let rate = if video.fps_den == 1 {
        video.fps_num.to_string()
    } else {
        let rounded = (video.fps() * 100.0).round() / 100.0;
        rounded.to_string()
    };
    format!("FFVideoFormat{}p{}", video.height, rate)
}

fn audio_format_name(sample_rate: u32) -> String {
    if sample_rate % 1000 == 0 {
        format!("FFAudioFormat{}k", sample_rate / 1000)
    } else {
        format!("FFAudioFormat{:.1}k", sample_rate as f64 / 1000.0)
    }
}
