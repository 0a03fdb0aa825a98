//! Single-run driver: probe, match, build the document.
//!
//! A [`SyncSession`] holds the settings for a run. [`SyncSession::run`]
//! probes every input through a [`MediaToolkit`], dispatches to the matcher
//! selected by the configured [`SyncMode`], and serializes the resulting
//! timeline. Progress and messages go through a [`RunLogger`].
//!
//! Files that fail to probe or decode are dropped with a warning; only
//! conditions that leave nothing to match abort the run.

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::config::{atomic_write, Settings};
use crate::fcpxml::{write_document, DocumentError, TimelineBuilder};
use crate::logging::RunLogger;
use crate::matching::{
    CorrelationConfig, CorrelationEvent, CorrelationMatcher, MatchError, TimecodeMatcher,
};
use crate::models::{MediaDescriptor, SyncMatch, SyncMode};
use crate::toolkit::MediaToolkit;

/// Run-level failure.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Input lists were empty or unusable.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Matching finished without pairing anything.
    #[error("No matches found between video and audio files")]
    NoMatchFound,

    /// The configured mode string is not recognized.
    #[error("Unsupported sync mode: '{0}' (expected \"timecode\" or \"audio\")")]
    UnsupportedMode(String),

    /// The timeline could not be serialized.
    #[error("Failed to write document: {0}")]
    Document(#[from] DocumentError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for session operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub mode: SyncMode,
    /// Matches sorted by video file name.
    pub matches: Vec<SyncMatch>,
    /// Serialized FCPXML.
    pub document_xml: String,
}

impl SyncReport {
    /// Write the document to `path`, replacing any existing file atomically.
    pub fn write_to(&self, path: impl AsRef<Path>) -> SyncResult<()> {
        atomic_write(path.as_ref(), self.document_xml.as_bytes())?;
        Ok(())
    }

    /// One line per match, e.g. `A001.mov <-> T01.wav: offset +2.000s (audio leads)`.
    pub fn summary_lines(&self) -> Vec<String> {
        self.matches.iter().map(SyncMatch::summary).collect()
    }
}

/// Drives one sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncSession {
    settings: Settings,
    mode_override: Option<SyncMode>,
}

impl SyncSession {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            mode_override: None,
        }
    }

    /// Use `mode` regardless of the configured mode string.
    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode_override = Some(mode);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The mode this session will run in.
    pub fn mode(&self) -> SyncResult<SyncMode> {
        match self.mode_override {
            Some(mode) => Ok(mode),
            None => self
                .settings
                .matching
                .mode
                .parse()
                .map_err(SyncError::UnsupportedMode),
        }
    }

    /// Sync `videos` against `audios` and build the timeline document.
    ///
    /// On failure the error is logged and the logger's tail is shown.
    pub fn run<P, T>(
        &self,
        videos: &[P],
        audios: &[P],
        toolkit: &T,
        logger: &RunLogger,
    ) -> SyncResult<SyncReport>
    where
        P: AsRef<Path>,
        T: MediaToolkit,
    {
        let result = self.run_inner(videos, audios, toolkit, logger);
        if let Err(e) = &result {
            logger.error(&e.to_string());
            logger.show_tail("sync");
        }
        logger.flush();
        result
    }

    fn run_inner<P, T>(
        &self,
        videos: &[P],
        audios: &[P],
        toolkit: &T,
        logger: &RunLogger,
    ) -> SyncResult<SyncReport>
    where
        P: AsRef<Path>,
        T: MediaToolkit,
    {
        if videos.is_empty() {
            return Err(MatchError::NoVideoFiles.into());
        }
        if audios.is_empty() {
            return Err(MatchError::NoAudioFiles.into());
        }
        let mode = self.mode()?;
        tracing::info!(
            "Sync run: {} video, {} audio, mode {}",
            videos.len(),
            audios.len(),
            mode.name()
        );

        let mut progress = Progress::new(logger, total_steps(mode, videos.len(), audios.len()));

        logger.phase("Probing");
        let video_descs = probe_all(toolkit, videos, &mut progress);
        let audio_descs = probe_all(toolkit, audios, &mut progress);

        if video_descs.is_empty() {
            return Err(MatchError::NoVideoFiles.into());
        }
        if audio_descs.is_empty() {
            return Err(MatchError::NoAudioFiles.into());
        }

        logger.phase(&format!("Matching ({})", mode.name()));
        let matches = match mode {
            SyncMode::Timecode => TimecodeMatcher::new(self.settings.matching.tolerance_secs)
                .match_files(&video_descs, &audio_descs)?,
            SyncMode::Audio => {
                self.match_by_waveform(&video_descs, &audio_descs, toolkit, &mut progress)?
            }
        };
        progress.finish("Matching complete");

        if matches.is_empty() {
            return Err(SyncError::NoMatchFound);
        }
        for m in &matches {
            logger.info(&m.summary());
        }

        logger.phase("Building timeline");
        let mut builder = TimelineBuilder::from_settings(&self.settings.document);
        for m in &matches {
            builder.add_match(m);
        }
        let document_xml = write_document(&builder.build())?;

        logger.success(&format!("Synced {} clip(s)", matches.len()));
        Ok(SyncReport {
            mode,
            matches,
            document_xml,
        })
    }

    /// Correlation matching with one progress step per waveform and per pair.
    fn match_by_waveform<T: MediaToolkit>(
        &self,
        videos: &[MediaDescriptor],
        audios: &[MediaDescriptor],
        toolkit: &T,
        progress: &mut Progress<'_>,
    ) -> SyncResult<Vec<SyncMatch>> {
        let matcher = CorrelationMatcher::new(CorrelationConfig::from(&self.settings.correlation));
        let matches = matcher.match_files_with(videos, audios, toolkit, |event| match event {
            CorrelationEvent::Extracted { descriptor, usable } => {
                progress.advance(&format!("Extracted {}", descriptor.file_name()));
                if !usable {
                    progress
                        .logger
                        .warn(&format!("No usable audio in {}", descriptor.file_name()));
                }
            }
            CorrelationEvent::Correlated { video, audio, .. } => progress.advance(&format!(
                "Correlated {} x {}",
                video.file_name(),
                audio.file_name()
            )),
        })?;
        Ok(matches)
    }
}

/// Progress steps for a run over `videos` x `audios` inputs: one per input
/// file, plus one per waveform and per pair when correlating.
fn total_steps(mode: SyncMode, videos: usize, audios: usize) -> usize {
    let files = videos + audios;
    match mode {
        SyncMode::Timecode => files,
        SyncMode::Audio => files * 2 + videos * audios,
    }
}

/// Run-wide step counter, so progress never restarts between phases.
///
/// The total is fixed up front from the input counts; steps skipped for
/// dropped files are made up by [`Progress::finish`].
struct Progress<'a> {
    logger: &'a RunLogger,
    step: usize,
    total: usize,
}

impl<'a> Progress<'a> {
    fn new(logger: &'a RunLogger, total: usize) -> Self {
        Self {
            logger,
            step: 0,
            total,
        }
    }

    fn advance(&mut self, message: &str) {
        self.step = (self.step + 1).min(self.total);
        self.logger.step(self.step, self.total, message);
    }

    /// Jump to the last step if any were skipped.
    fn finish(&mut self, message: &str) {
        if self.step < self.total {
            self.step = self.total;
            self.logger.step(self.step, self.total, message);
        }
    }
}

/// Probe each path, dropping failures with a warning.
fn probe_all<P, T>(toolkit: &T, paths: &[P], progress: &mut Progress<'_>) -> Vec<MediaDescriptor>
where
    P: AsRef<Path>,
    T: MediaToolkit,
{
    paths
        .iter()
        .filter_map(|path| {
            let path = path.as_ref();
            progress.advance(&format!("Probing {}", path.display()));
            match toolkit.probe(path) {
                Ok(desc) => Some(desc),
                Err(e) => {
                    tracing::warn!("Dropping {}: {}", path.display(), e);
                    progress
                        .logger
                        .warn(&format!("Dropping {}: {}", path.display(), e));
                    None
                }
            }
        })
        .collect()
}
