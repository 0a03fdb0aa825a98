//! Matching by overlapping timecode ranges.

use super::types::{MatchError, MatchResult};
use crate::models::{sort_by_video_name, MediaDescriptor, SyncMatch};

/// Near-misses up to this many seconds still count as overlapping.
pub const DEFAULT_TOLERANCE_SECS: f64 = 0.5;

/// Pairs each video with the not-yet-used audio file whose timecode range
/// overlaps it the most.
///
/// Assignment is greedy in input order: an earlier video may take an audio
/// file a later video would have fit better.
#[derive(Debug, Clone, Copy)]
pub struct TimecodeMatcher {
    tolerance_secs: f64,
}

impl Default for TimecodeMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_SECS)
    }
}

impl TimecodeMatcher {
    pub fn new(tolerance_secs: f64) -> Self {
        Self {
            tolerance_secs: if tolerance_secs.is_finite() {
                tolerance_secs.max(0.0)
            } else {
                DEFAULT_TOLERANCE_SECS
            },
        }
    }

    pub fn tolerance_secs(&self) -> f64 {
        self.tolerance_secs
    }

    /// Match videos against audio files.
    ///
    /// Files without a timecode are skipped. Fails when either side has
    /// no timecode at all. The result is sorted by video file name and may
    /// be empty.
    pub fn match_files(
        &self,
        videos: &[MediaDescriptor],
        audios: &[MediaDescriptor],
    ) -> MatchResult<Vec<SyncMatch>> {
        if videos.is_empty() {
            return Err(MatchError::NoVideoFiles);
        }
        if audios.is_empty() {
            return Err(MatchError::NoAudioFiles);
        }
        if !videos.iter().any(MediaDescriptor::has_timecode) {
            return Err(MatchError::no_video_timecode(
                videos.iter().map(MediaDescriptor::file_name),
            ));
        }
        if !audios.iter().any(MediaDescriptor::has_timecode) {
            return Err(MatchError::no_audio_timecode(
                audios.iter().map(MediaDescriptor::file_name),
            ));
        }

        let mut used = vec![false; audios.len()];
        let mut matches = Vec::new();

        for video in videos {
            let Some(v_start) = video.start_seconds() else {
                tracing::debug!("Skipping {}: no timecode", video.file_name());
                continue;
            };
            let v_end = v_start + video.duration;

            let mut best: Option<(usize, f64)> = None;
            for (idx, audio) in audios.iter().enumerate() {
                if used[idx] {
                    continue;
                }
                let Some(a_start) = audio.start_seconds() else {
                    continue;
                };
                let a_end = a_start + audio.duration;

                let overlap = v_end.min(a_end) - v_start.max(a_start);
                if overlap < -self.tolerance_secs {
                    continue;
                }
                // Strictly greater: the first candidate wins ties.
                if best.map_or(true, |(_, best_overlap)| overlap > best_overlap) {
                    best = Some((idx, overlap));
                }
            }

            match best {
                Some((idx, overlap)) => {
                    used[idx] = true;
                    let audio = &audios[idx];
                    let offset = v_start - audio.start_seconds().unwrap_or(v_start);
                    tracing::info!(
                        "Matched {} <-> {} (overlap {:.3}s, offset {:+.3}s)",
                        video.file_name(),
                        audio.file_name(),
                        overlap,
                        offset
                    );
                    matches.push(SyncMatch::by_timecode(video.clone(), audio.clone(), offset));
                }
                None => tracing::debug!("No timecode overlap for {}", video.file_name()),
            }
        }

        sort_by_video_name(&mut matches);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timecode::Timecode;

    fn video(name: &str, tc: Option<&str>, duration: f64) -> MediaDescriptor {
        let desc = MediaDescriptor::video(format!("/v/{name}"), duration, (24, 1), (1920, 1080));
        match tc {
            Some(tc) => desc.with_timecode(Timecode::parse(tc, 24.0).unwrap()),
            None => desc,
        }
    }

    fn audio(name: &str, tc: Option<&str>, duration: f64) -> MediaDescriptor {
        let desc = MediaDescriptor::audio(format!("/a/{name}"), duration, 48000, 2);
        match tc {
            Some(tc) => desc.with_timecode(Timecode::parse(tc, 30.0).unwrap()),
            None => desc,
        }
    }

    #[test]
    fn audio_started_two_seconds_earlier() {
        let videos = [video("A001.mov", Some("01:00:00:00"), 10.0)];
        let audios = [audio("T01.wav", Some("00:59:58:00"), 20.0)];
        let matches = TimecodeMatcher::default().match_files(&videos, &audios).unwrap();
        assert_eq!(matches.len(), 1);
        assert!((matches[0].offset_seconds - 2.0).abs() < 1e-6);
    }

    #[test]
    fn identical_timecodes_have_zero_offset() {
        let videos = [video("A001.mov", Some("01:00:00:00"), 5.0)];
        let audios = [audio("T01.wav", Some("01:00:00:00"), 5.0)];
        let matches = TimecodeMatcher::default().match_files(&videos, &audios).unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].offset_seconds.abs() < 1e-6);
    }

    #[test]
    fn distant_ranges_do_not_match() {
        let videos = [video("A001.mov", Some("01:00:00:00"), 5.0)];
        let audios = [audio("T01.wav", Some("02:00:00:00"), 5.0)];
        let matches = TimecodeMatcher::default().match_files(&videos, &audios).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn near_miss_within_tolerance_matches() {
        // Audio ends 0.3s before the video starts.
        let videos = [video("A001.mov", Some("01:00:10:00"), 5.0)];
        let audios = [audio("T01.wav", Some("01:00:00:00"), 9.7)];
        let matches = TimecodeMatcher::default().match_files(&videos, &audios).unwrap();
        assert_eq!(matches.len(), 1);

        let strict = TimecodeMatcher::new(0.1).match_files(&videos, &audios).unwrap();
        assert!(strict.is_empty());
    }

    #[test]
    fn picks_largest_overlap() {
        let videos = [video("A001.mov", Some("01:00:00:00"), 10.0)];
        let audios = [
            audio("T01.wav", Some("00:59:55:00"), 7.0),
            audio("T02.wav", Some("01:00:01:00"), 20.0),
        ];
        let matches = TimecodeMatcher::default().match_files(&videos, &audios).unwrap();
        assert_eq!(matches[0].audio.file_name(), "T02.wav");
    }

    #[test]
    fn first_candidate_wins_ties() {
        let videos = [video("A001.mov", Some("01:00:00:00"), 10.0)];
        let audios = [
            audio("T02.wav", Some("01:00:00:00"), 10.0),
            audio("T01.wav", Some("01:00:00:00"), 10.0),
        ];
        let matches = TimecodeMatcher::default().match_files(&videos, &audios).unwrap();
        assert_eq!(matches[0].audio.file_name(), "T02.wav");
    }

    #[test]
    fn greedy_assignment_follows_input_order() {
        // A.mov would overlap T01 for 10s, but C.mov is processed first
        // and takes it, leaving A.mov the short T02.
        let videos = [
            video("C.mov", Some("01:00:00:00"), 4.0),
            video("A.mov", Some("01:00:00:00"), 10.0),
        ];
        let audios = [
            audio("T01.wav", Some("01:00:00:00"), 10.0),
            audio("T02.wav", Some("01:00:03:00"), 2.0),
        ];
        let matches = TimecodeMatcher::default().match_files(&videos, &audios).unwrap();
        assert_eq!(matches.len(), 2);
        // Sorted by video name for reporting.
        assert_eq!(matches[0].video.file_name(), "A.mov");
        assert_eq!(matches[0].audio.file_name(), "T02.wav");
        assert_eq!(matches[1].video.file_name(), "C.mov");
        assert_eq!(matches[1].audio.file_name(), "T01.wav");
    }

    #[test]
    fn each_audio_is_used_once() {
        let videos = [
            video("A.mov", Some("01:00:00:00"), 10.0),
            video("B.mov", Some("01:00:00:00"), 10.0),
        ];
        let audios = [audio("T01.wav", Some("01:00:00:00"), 10.0)];
        let matches = TimecodeMatcher::default().match_files(&videos, &audios).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].video.file_name(), "A.mov");
    }

    #[test]
    fn files_without_timecode_are_skipped() {
        let videos = [
            video("A.mov", None, 10.0),
            video("B.mov", Some("01:00:00:00"), 10.0),
        ];
        let audios = [
            audio("T00.wav", None, 10.0),
            audio("T01.wav", Some("01:00:00:00"), 10.0),
        ];
        let matches = TimecodeMatcher::default().match_files(&videos, &audios).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].video.file_name(), "B.mov");
    }

    #[test]
    fn no_video_timecode_is_reported() {
        let videos = [video("A.mov", None, 10.0), video("B.mov", None, 10.0)];
        let audios = [audio("T01.wav", Some("01:00:00:00"), 10.0)];
        let err = TimecodeMatcher::default().match_files(&videos, &audios).unwrap_err();
        match err {
            MatchError::NoVideoTimecode { examples } => {
                assert_eq!(examples, vec!["A.mov".to_string(), "B.mov".to_string()])
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn no_audio_timecode_is_reported() {
        let videos = [video("A.mov", Some("01:00:00:00"), 10.0)];
        let audios = [audio("T01.wav", None, 10.0)];
        let err = TimecodeMatcher::default().match_files(&videos, &audios).unwrap_err();
        assert!(matches!(err, MatchError::NoAudioTimecode { .. }));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let videos = [video("A.mov", Some("01:00:00:00"), 10.0)];
        let matcher = TimecodeMatcher::default();
        assert!(matches!(matcher.match_files(&[], &[]), Err(MatchError::NoVideoFiles)));
        assert!(matches!(matcher.match_files(&videos, &[]), Err(MatchError::NoAudioFiles)));
    }
}
