//! Matching by waveform cross-correlation.
//!
//! Used when timecode is missing or untrustworthy. Every usable video is
//! correlated against every usable audio file, the pairs are ranked by
//! confidence, and the strongest pairs are assigned greedily.

use serde::{Deserialize, Serialize};

use super::types::MatchResult;
use crate::analysis::{cross_correlate, AudioData, DEFAULT_ANALYSIS_SAMPLE_RATE};
use crate::models::{sort_by_video_name, MediaDescriptor, SyncMatch};
use crate::timecode::Timecode;
use crate::toolkit::MediaToolkit;

/// Minimum normalized peak to accept a pair.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.15;

/// Waveforms shorter than this are unusable (0.1s at 8 kHz).
pub const DEFAULT_MIN_SAMPLES: usize = 800;

/// Start assigned to a matched file that had no timecode (01:00:00:00).
pub const SYNTHESIZED_BASE_SECS: f64 = 3600.0;

/// Tuning for [`CorrelationMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Analysis sample rate in Hz.
    pub sample_rate: u32,
    /// Pairs below this confidence are never assigned.
    pub confidence_threshold: f64,
    /// Waveforms with fewer samples are excluded.
    pub min_samples: usize,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_ANALYSIS_SAMPLE_RATE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

/// Correlation peak for one video/audio pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    pub video_index: usize,
    pub audio_index: usize,
    /// Positive: the audio starts later than the video.
    pub lag_samples: i64,
    pub confidence: f64,
}

impl PairScore {
    /// Lag converted to seconds at `sample_rate`.
    pub fn lag_seconds(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.lag_samples as f64 / sample_rate as f64
    }
}

/// Step reported by [`CorrelationMatcher::match_files_with`].
#[derive(Debug, Clone, Copy)]
pub enum CorrelationEvent<'a> {
    /// One file's waveform was extracted. `usable` is false when the file
    /// was excluded.
    Extracted {
        descriptor: &'a MediaDescriptor,
        usable: bool,
    },
    /// One video/audio pair was correlated.
    Correlated {
        video: &'a MediaDescriptor,
        audio: &'a MediaDescriptor,
        score: PairScore,
    },
}

/// Lazily correlates every usable video against every usable audio file.
///
/// Yields one [`PairScore`] per pair, video-major, so a caller can report
/// progress or stop between pairs. Unusable waveforms (`None`) are skipped.
pub struct PairCorrelations<'a> {
    videos: &'a [Option<AudioData>],
    audios: &'a [Option<AudioData>],
    video_index: usize,
    audio_index: usize,
}

impl<'a> PairCorrelations<'a> {
    pub fn new(videos: &'a [Option<AudioData>], audios: &'a [Option<AudioData>]) -> Self {
        Self {
            videos,
            audios,
            video_index: 0,
            audio_index: 0,
        }
    }

    /// Number of pairs this iterator yields in total.
    pub fn total_pairs(&self) -> usize {
        let usable_videos = self.videos.iter().filter(|w| w.is_some()).count();
        let usable_audios = self.audios.iter().filter(|w| w.is_some()).count();
        usable_videos * usable_audios
    }
}

impl Iterator for PairCorrelations<'_> {
    type Item = PairScore;

    fn next(&mut self) -> Option<PairScore> {
        while self.video_index < self.videos.len() {
            let Some(video) = &self.videos[self.video_index] else {
                self.video_index += 1;
                self.audio_index = 0;
                continue;
            };

            while self.audio_index < self.audios.len() {
                let audio_index = self.audio_index;
                self.audio_index += 1;

                if let Some(audio) = &self.audios[audio_index] {
                    let result = cross_correlate(&video.samples, &audio.samples);
                    return Some(PairScore {
                        video_index: self.video_index,
                        audio_index,
                        lag_samples: result.lag_samples,
                        confidence: result.confidence,
                    });
                }
            }

            self.video_index += 1;
            self.audio_index = 0;
        }
        None
    }
}

/// Pairs files by the strongest waveform correlation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationMatcher {
    config: CorrelationConfig,
}

impl CorrelationMatcher {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// Extract one file's waveform at the analysis rate.
    ///
    /// Returns `None` (after logging) when extraction fails or the signal
    /// is too short to correlate.
    pub fn waveform<T: MediaToolkit>(
        &self,
        toolkit: &T,
        descriptor: &MediaDescriptor,
    ) -> Option<AudioData> {
        match toolkit.extract(&descriptor.path, self.config.sample_rate) {
            Ok(audio) if audio.len() >= self.config.min_samples => Some(audio),
            Ok(audio) => {
                tracing::warn!(
                    "Skipping {}: only {} samples of audio",
                    descriptor.file_name(),
                    audio.len()
                );
                None
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", descriptor.file_name(), e);
                None
            }
        }
    }

    /// Greedily accept pairs by descending confidence.
    ///
    /// A pair is skipped when either side is already taken; scanning stops
    /// at the first score under the threshold. Equal confidences keep their
    /// input order.
    pub fn assign(&self, mut scores: Vec<PairScore>) -> Vec<PairScore> {
        scores.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut used_videos = Vec::new();
        let mut used_audios = Vec::new();
        let mut accepted = Vec::new();

        for score in scores {
            if score.confidence.is_nan() || score.confidence < self.config.confidence_threshold {
                break;
            }
            if used_videos.contains(&score.video_index) || used_audios.contains(&score.audio_index)
            {
                continue;
            }
            used_videos.push(score.video_index);
            used_audios.push(score.audio_index);
            accepted.push(score);
        }
        accepted
    }

    /// Turn accepted scores into matches.
    ///
    /// A matched file without timecode gets a synthesized one: the video
    /// starts at 01:00:00:00 (or is placed from the audio's timecode), and
    /// the audio is placed relative to the video by the measured lag, both
    /// at the video's frame rate. Sorted by video file name.
    pub fn build_matches(
        &self,
        videos: &[MediaDescriptor],
        audios: &[MediaDescriptor],
        accepted: &[PairScore],
    ) -> MatchResult<Vec<SyncMatch>> {
        let mut matches = Vec::with_capacity(accepted.len());

        for score in accepted {
            let (Some(video), Some(audio)) =
                (videos.get(score.video_index), audios.get(score.audio_index))
            else {
                continue;
            };

            // Audio start minus video start on a shared clock.
            let offset = score.lag_seconds(self.config.sample_rate);
            let fps = video.fps();

            let (video, audio) = match (video.start_seconds(), audio.start_seconds()) {
                (Some(_), Some(_)) => (video.clone(), audio.clone()),
                (Some(v_start), None) => {
                    let a_start = (v_start + offset).max(0.0);
                    let audio = audio
                        .with_synthesized_timecode(Timecode::from_seconds(a_start, fps)?, a_start);
                    (video.clone(), audio)
                }
                (None, Some(a_start)) => {
                    let v_start = (a_start - offset).max(0.0);
                    let video = video
                        .with_synthesized_timecode(Timecode::from_seconds(v_start, fps)?, v_start);
                    (video, audio.clone())
                }
                (None, None) => {
                    let v_start = SYNTHESIZED_BASE_SECS;
                    let a_start = (v_start + offset).max(0.0);
                    let video = video
                        .with_synthesized_timecode(Timecode::from_seconds(v_start, fps)?, v_start);
                    let audio = audio
                        .with_synthesized_timecode(Timecode::from_seconds(a_start, fps)?, a_start);
                    (video, audio)
                }
            };

            tracing::info!(
                "Matched {} <-> {} (lag {:+.3}s, confidence {:.1}%)",
                video.file_name(),
                audio.file_name(),
                offset,
                score.confidence * 100.0
            );
            matches.push(SyncMatch::by_correlation(video, audio, offset, score.confidence));
        }

        sort_by_video_name(&mut matches);
        Ok(matches)
    }

    /// Extract, correlate, assign, and build matches in one pass.
    ///
    /// Files whose waveform is unusable are excluded rather than failing the
    /// run. The result may be empty.
    pub fn match_files<T: MediaToolkit>(
        &self,
        videos: &[MediaDescriptor],
        audios: &[MediaDescriptor],
        toolkit: &T,
    ) -> MatchResult<Vec<SyncMatch>> {
        self.match_files_with(videos, audios, toolkit, |_| {})
    }

    /// [`match_files`](Self::match_files), reporting each extraction and
    /// each correlated pair to `on_event` as it completes.
    pub fn match_files_with<T, F>(
        &self,
        videos: &[MediaDescriptor],
        audios: &[MediaDescriptor],
        toolkit: &T,
        mut on_event: F,
    ) -> MatchResult<Vec<SyncMatch>>
    where
        T: MediaToolkit,
        F: FnMut(CorrelationEvent<'_>),
    {
        let video_waves = self.extract_all(toolkit, videos, &mut on_event);
        let audio_waves = self.extract_all(toolkit, audios, &mut on_event);

        let mut scores = Vec::new();
        for score in PairCorrelations::new(&video_waves, &audio_waves) {
            tracing::debug!(
                "Pair {}x{}: lag {} samples, confidence {:.3}",
                score.video_index,
                score.audio_index,
                score.lag_samples,
                score.confidence
            );
            on_event(CorrelationEvent::Correlated {
                video: &videos[score.video_index],
                audio: &audios[score.audio_index],
                score,
            });
            scores.push(score);
        }

        let accepted = self.assign(scores);
        self.build_matches(videos, audios, &accepted)
    }

    fn extract_all<T, F>(
        &self,
        toolkit: &T,
        descriptors: &[MediaDescriptor],
        on_event: &mut F,
    ) -> Vec<Option<AudioData>>
    where
        T: MediaToolkit,
        F: FnMut(CorrelationEvent<'_>),
    {
        descriptors
            .iter()
            .map(|descriptor| {
                let wave = self.waveform(toolkit, descriptor);
                on_event(CorrelationEvent::Extracted {
                    descriptor,
                    usable: wave.is_some(),
                });
                wave
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::{ExtractionError, ExtractionResult, ProbeError, ProbeResult};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn noise(len: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    /// Serves canned waveforms; unknown paths fail extraction.
    #[derive(Default)]
    struct FakeToolkit {
        waves: HashMap<PathBuf, Vec<f64>>,
    }

    impl FakeToolkit {
        fn with(mut self, path: &str, samples: Vec<f64>) -> Self {
            self.waves.insert(PathBuf::from(path), samples);
            self
        }
    }

    impl MediaToolkit for FakeToolkit {
        fn probe(&self, path: &Path) -> ProbeResult<MediaDescriptor> {
            Err(ProbeError::SourceNotFound(path.to_path_buf()))
        }

        fn extract(&self, path: &Path, sample_rate: u32) -> ExtractionResult<AudioData> {
            self.waves
                .get(path)
                .map(|s| AudioData::new(s.clone(), sample_rate))
                .ok_or_else(|| ExtractionError::SourceNotFound(path.to_path_buf()))
        }
    }

    fn video(path: &str) -> MediaDescriptor {
        MediaDescriptor::video(path, 2.0, (25, 1), (1920, 1080))
    }

    fn audio(path: &str) -> MediaDescriptor {
        MediaDescriptor::audio(path, 2.0, 48000, 2)
    }

    fn score(v: usize, a: usize, confidence: f64) -> PairScore {
        PairScore {
            video_index: v,
            audio_index: a,
            lag_samples: 0,
            confidence,
        }
    }

    #[test]
    fn assign_is_greedy_by_confidence() {
        let matcher = CorrelationMatcher::default();
        let accepted = matcher.assign(vec![
            score(0, 0, 0.6),
            score(0, 1, 0.9),
            score(1, 1, 0.8),
            score(1, 0, 0.5),
        ]);
        let pairs: Vec<_> = accepted.iter().map(|s| (s.video_index, s.audio_index)).collect();
        // (1,1) loses to (0,1); (1,0) is still free.
        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn assign_stops_below_threshold() {
        let matcher = CorrelationMatcher::default();
        let accepted = matcher.assign(vec![score(0, 0, 0.14), score(1, 1, 0.15)]);
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].video_index, 1);
    }

    #[test]
    fn equal_confidence_keeps_input_order() {
        let matcher = CorrelationMatcher::default();
        let accepted = matcher.assign(vec![score(0, 0, 0.5), score(1, 0, 0.5)]);
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].video_index, 0);
    }

    #[test]
    fn pair_iterator_skips_unusable_waveforms() {
        let wave = Some(AudioData::new(noise(1000, 1), 8000));
        let videos = vec![wave.clone(), None, wave.clone()];
        let audios = vec![None, wave];
        let pairs = PairCorrelations::new(&videos, &audios);
        assert_eq!(pairs.total_pairs(), 2);

        let indices: Vec<_> = pairs.map(|s| (s.video_index, s.audio_index)).collect();
        assert_eq!(indices, vec![(0, 1), (2, 1)]);
    }

    #[test]
    fn recovers_shift_and_backfills_timecode() {
        let sig = noise(16000, 5);
        let shift = 400; // 50 ms at 8 kHz
        let toolkit = FakeToolkit::default()
            .with("/v/A.mov", sig[..12000].to_vec())
            .with("/a/T.wav", sig[shift..shift + 12000].to_vec());

        let matches = CorrelationMatcher::default()
            .match_files(&[video("/v/A.mov")], &[audio("/a/T.wav")], &toolkit)
            .unwrap();

        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert!((m.offset_seconds - 0.05).abs() <= 2.0 / 8000.0, "offset {}", m.offset_seconds);
        assert!(m.confidence.unwrap() > 0.5);

        assert!(m.video.timecode.is_synthesized());
        assert!(m.audio.timecode.is_synthesized());
        assert_eq!(m.video.timecode().unwrap().format(), "01:00:00:00");
        let v_start = m.video.start_seconds().unwrap();
        let a_start = m.audio.start_seconds().unwrap();
        assert!((v_start - a_start - m.timeline_offset()).abs() < 1e-9);
    }

    #[test]
    fn pairs_the_right_files() {
        let a = noise(10000, 21);
        let b = noise(10000, 22);
        let toolkit = FakeToolkit::default()
            .with("/v/A.mov", a.clone())
            .with("/v/B.mov", b.clone())
            .with("/a/TB.wav", b[100..].to_vec())
            .with("/a/TA.wav", a[300..].to_vec());

        let matches = CorrelationMatcher::default()
            .match_files(
                &[video("/v/B.mov"), video("/v/A.mov")],
                &[audio("/a/TB.wav"), audio("/a/TA.wav")],
                &toolkit,
            )
            .unwrap();

        let pairs: Vec<_> = matches
            .iter()
            .map(|m| (m.video.file_name(), m.audio.file_name()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("A.mov".to_string(), "TA.wav".to_string()),
                ("B.mov".to_string(), "TB.wav".to_string())
            ]
        );
    }

    #[test]
    fn unusable_files_are_excluded() {
        let sig = noise(4000, 9);
        let toolkit = FakeToolkit::default()
            .with("/v/A.mov", sig.clone())
            .with("/a/short.wav", sig[..100].to_vec())
            .with("/a/T.wav", sig.clone());

        let matches = CorrelationMatcher::default()
            .match_files(
                &[video("/v/A.mov"), video("/v/missing.mov")],
                &[audio("/a/short.wav"), audio("/a/T.wav")],
                &toolkit,
            )
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].audio.file_name(), "T.wav");
    }

    #[test]
    fn lag_seconds_divides_by_rate() {
        let s = PairScore {
            lag_samples: -4000,
            ..score(0, 0, 0.9)
        };
        assert!((s.lag_seconds(8000) + 0.5).abs() < 1e-12);
        assert_eq!(s.lag_seconds(0), 0.0);
    }

    #[test]
    fn match_hook_sees_every_extraction_and_pair() {
        let sig = noise(4000, 9);
        let toolkit = FakeToolkit::default()
            .with("/v/A.mov", sig.clone())
            .with("/v/B.mov", noise(4000, 10))
            .with("/a/T.wav", sig.clone());

        let mut extracted = Vec::new();
        let mut correlated = Vec::new();
        let matches = CorrelationMatcher::default()
            .match_files_with(
                &[video("/v/A.mov"), video("/v/B.mov")],
                &[audio("/a/T.wav"), audio("/a/missing.wav")],
                &toolkit,
                |event| match event {
                    CorrelationEvent::Extracted { descriptor, usable } => {
                        extracted.push((descriptor.file_name(), usable))
                    }
                    CorrelationEvent::Correlated { video, audio, score } => {
                        correlated.push((video.file_name(), audio.file_name(), score.confidence))
                    }
                },
            )
            .unwrap();

        assert_eq!(
            extracted,
            vec![
                ("A.mov".to_string(), true),
                ("B.mov".to_string(), true),
                ("T.wav".to_string(), true),
                ("missing.wav".to_string(), false),
            ]
        );
        let pairs: Vec<_> = correlated.iter().map(|(v, a, _)| (v.as_str(), a.as_str())).collect();
        assert_eq!(pairs, vec![("A.mov", "T.wav"), ("B.mov", "T.wav")]);
        assert!(correlated[0].2 > 0.5);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].video.file_name(), "A.mov");
    }

    #[test]
    fn unrelated_signals_yield_no_matches() {
        let toolkit = FakeToolkit::default()
            .with("/v/A.mov", noise(4000, 100))
            .with("/a/T.wav", noise(4000, 200));
        let matches = CorrelationMatcher::default()
            .match_files(&[video("/v/A.mov")], &[audio("/a/T.wav")], &toolkit)
            .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn existing_video_timecode_anchors_audio() {
        let tc = Timecode::parse("10:00:00:00", 25.0).unwrap();
        let videos = [video("/v/A.mov").with_timecode(tc)];
        let audios = [audio("/a/T.wav")];
        let accepted = [PairScore {
            video_index: 0,
            audio_index: 0,
            lag_samples: -8000,
            confidence: 0.9,
        }];

        let matches = CorrelationMatcher::default()
            .build_matches(&videos, &audios, &accepted)
            .unwrap();
        let m = &matches[0];
        assert!(!m.video.timecode.is_synthesized());
        // Audio started one second before the video.
        assert!((m.audio.start_seconds().unwrap() - 35999.0).abs() < 1e-9);
        assert!((m.timeline_offset() - 1.0).abs() < 1e-9);
    }
}
