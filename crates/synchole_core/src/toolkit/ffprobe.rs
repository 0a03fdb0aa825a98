//! Media probing via `ffprobe -print_format json`.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use super::types::{stderr_excerpt, ProbeError, ProbeResult};
use crate::models::{MediaDescriptor, TimecodeSource};
use crate::timecode::Timecode;

/// Frame rate assumed when a file has no video stream.
const DEFAULT_FPS: (u32, u32) = (30, 1);
const DEFAULT_SAMPLE_RATE: u32 = 48000;
const DEFAULT_CHANNELS: u32 = 2;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
    duration: Option<String>,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    timecode: Option<String>,
    /// BWF: samples since midnight.
    time_reference: Option<String>,
}

/// Run ffprobe on `path` and build its descriptor.
pub(crate) fn probe_file(ffprobe: &Path, path: &Path) -> ProbeResult<MediaDescriptor> {
    let path = path
        .canonicalize()
        .map_err(|_| ProbeError::SourceNotFound(path.to_path_buf()))?;

    let mut cmd = Command::new(ffprobe);
    cmd.args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(&path);

    tracing::debug!("Running ffprobe: {:?}", cmd);

    let output = cmd.output().map_err(|e| ProbeError::Spawn {
        tool: "ffprobe".to_string(),
        source: e,
    })?;

    if !output.status.success() {
        return Err(ProbeError::CommandFailed {
            tool: "ffprobe".to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            message: stderr_excerpt(&output.stderr, 200),
        });
    }

    descriptor_from_ffprobe_json(&path, &String::from_utf8_lossy(&output.stdout))
}

/// Map ffprobe JSON output onto a [`MediaDescriptor`].
///
/// The embedded timecode is the first `timecode` tag found on the format
/// or any stream, parsed at the file's own frame rate. Audio-only files
/// fall back to the BWF `time_reference` tag. An unparseable timecode is
/// logged and treated as absent.
pub fn descriptor_from_ffprobe_json(path: &Path, json: &str) -> ProbeResult<MediaDescriptor> {
    let output: FfprobeOutput = serde_json::from_str(json)?;

    let video = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let audio = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    if video.is_none() && audio.is_none() {
        return Err(ProbeError::NoStreams(path.to_path_buf()));
    }

    let duration = output
        .format
        .duration
        .as_deref()
        .or_else(|| output.streams.iter().find_map(|s| s.duration.as_deref()))
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ProbeError::MissingField {
            path: path.to_path_buf(),
            what: "duration",
        })?;

    let (fps_num, fps_den) = video
        .and_then(|v| v.r_frame_rate.as_deref())
        .and_then(parse_frame_rate)
        .unwrap_or(DEFAULT_FPS);

    let sample_rate = audio
        .and_then(|a| a.sample_rate.as_deref())
        .and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|&sr| sr > 0)
        .unwrap_or(DEFAULT_SAMPLE_RATE);
    let channels = audio
        .and_then(|a| a.channels)
        .filter(|&c| c > 0)
        .unwrap_or(DEFAULT_CHANNELS);

    let mut descriptor = MediaDescriptor {
        path: path.to_path_buf(),
        timecode: TimecodeSource::Absent,
        duration,
        has_video: video.is_some(),
        has_audio: audio.is_some(),
        fps_num,
        fps_den,
        width: video.and_then(|v| v.width).unwrap_or(0),
        height: video.and_then(|v| v.height).unwrap_or(0),
        sample_rate,
        channels,
    };

    let fps = descriptor.fps();
    let tagged = std::iter::once(&output.format.tags)
        .chain(output.streams.iter().map(|s| &s.tags))
        .find_map(|t| t.timecode.as_deref());

    if let Some(raw) = tagged {
        match Timecode::parse(raw, fps) {
            Ok(timecode) => descriptor.timecode = TimecodeSource::Embedded { timecode },
            Err(e) => tracing::warn!("Ignoring timecode of {}: {}", path.display(), e),
        }
    } else if !descriptor.has_video {
        if let Some(samples) = output
            .format
            .tags
            .time_reference
            .as_deref()
            .and_then(|r| r.trim().parse::<u64>().ok())
        {
            let seconds = samples as f64 / sample_rate as f64;
            if let Ok(timecode) = Timecode::from_seconds(seconds, fps) {
                descriptor.timecode = TimecodeSource::TimeReference {
                    timecode,
                    samples,
                    sample_rate,
                };
            }
        }
    }

    Ok(descriptor)
}

/// Parse `"num/den"` (or a bare integer) into a positive ratio.
fn parse_frame_rate(raw: &str) -> Option<(u32, u32)> {
    let mut parts = raw.trim().splitn(2, '/');
    let num: u32 = parts.next()?.trim().parse().ok()?;
    let den: u32 = match parts.next() {
        Some(d) => d.trim().parse().ok()?,
        None => 1,
    };
    (num > 0 && den > 0).then_some((num, den))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMERA_JSON: &str = r#"{
        "streams": [
            {"codec_type": "video", "width": 3840, "height": 2160,
             "r_frame_rate": "24000/1001", "tags": {"timecode": "01:02:03;04"}},
            {"codec_type": "audio", "sample_rate": "48000", "channels": 2}
        ],
        "format": {"duration": "12.512000"}
    }"#;

    #[test]
    fn parses_camera_file() {
        let desc = descriptor_from_ffprobe_json(Path::new("/m/A001.mov"), CAMERA_JSON).unwrap();
        assert!(desc.has_video && desc.has_audio);
        assert_eq!((desc.fps_num, desc.fps_den), (24000, 1001));
        assert_eq!((desc.width, desc.height), (3840, 2160));
        assert_eq!((desc.sample_rate, desc.channels), (48000, 2));
        assert!((desc.duration - 12.512).abs() < 1e-9);
        assert_eq!(desc.timecode().unwrap().format(), "01:02:03:04");
    }

    #[test]
    fn audio_only_file_uses_defaults() {
        let json = r#"{
            "streams": [{"codec_type": "audio", "sample_rate": "96000", "channels": 1}],
            "format": {"duration": "30.0", "tags": {"timecode": "00:59:58:00"}}
        }"#;
        let desc = descriptor_from_ffprobe_json(Path::new("/m/T01.wav"), json).unwrap();
        assert!(!desc.has_video);
        assert_eq!((desc.fps_num, desc.fps_den), (30, 1));
        assert_eq!((desc.width, desc.height), (0, 0));
        assert_eq!(desc.sample_rate, 96000);
        assert!((desc.start_seconds().unwrap() - 3598.0).abs() < 1e-9);
    }

    #[test]
    fn bwf_time_reference_becomes_timecode() {
        let json = r#"{
            "streams": [{"codec_type": "audio", "sample_rate": "48000", "channels": 2}],
            "format": {"duration": "20.0", "tags": {"time_reference": "172800000"}}
        }"#;
        let desc = descriptor_from_ffprobe_json(Path::new("/m/T02.wav"), json).unwrap();
        assert_eq!(desc.timecode().unwrap().format(), "01:00:00:00");
        assert_eq!(desc.start_seconds(), Some(3600.0));
    }

    #[test]
    fn bwf_time_reference_keeps_sample_accuracy() {
        // 24 samples past the hour: well under one 30 fps frame.
        let json = r#"{
            "streams": [{"codec_type": "audio", "sample_rate": "48000", "channels": 2}],
            "format": {"duration": "20.0", "tags": {"time_reference": "172800024"}}
        }"#;
        let desc = descriptor_from_ffprobe_json(Path::new("/m/T03.wav"), json).unwrap();
        assert_eq!(desc.timecode().unwrap().format(), "01:00:00:00");
        assert_eq!(desc.start_seconds(), Some(172800024.0 / 48000.0));
        assert!(!desc.timecode.is_synthesized());
    }

    #[test]
    fn malformed_timecode_is_ignored() {
        let json = r#"{
            "streams": [{"codec_type": "video", "r_frame_rate": "25/1", "tags": {"timecode": "garbage"}}],
            "format": {"duration": "5.0"}
        }"#;
        let desc = descriptor_from_ffprobe_json(Path::new("/m/B.mov"), json).unwrap();
        assert!(!desc.has_timecode());
    }

    #[test]
    fn missing_duration_is_an_error() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {}}"#;
        let err = descriptor_from_ffprobe_json(Path::new("/m/x.wav"), json).unwrap_err();
        assert!(matches!(err, ProbeError::MissingField { what: "duration", .. }));
    }

    #[test]
    fn data_only_file_is_rejected() {
        let json = r#"{"streams": [{"codec_type": "data"}], "format": {"duration": "1.0"}}"#;
        assert!(matches!(
            descriptor_from_ffprobe_json(Path::new("/m/x.bin"), json),
            Err(ProbeError::NoStreams(_))
        ));
    }

    #[test]
    fn frame_rate_parsing() {
        assert_eq!(parse_frame_rate("30000/1001"), Some((30000, 1001)));
        assert_eq!(parse_frame_rate("25"), Some((25, 1)));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn probe_rejects_missing_file() {
        let result = probe_file(Path::new("ffprobe"), Path::new("/nonexistent/file.mov"));
        assert!(matches!(result, Err(ProbeError::SourceNotFound(_))));
    }
}
