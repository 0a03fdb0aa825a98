//! Per-run logger with callback and optional file output.
//!
//! Each sync run gets its own logger that:
//! - Reports `(step, total, message)` progress to a callback
//! - Sends formatted lines to a line callback (if provided)
//! - Optionally mirrors lines into a log file
//! - Maintains a tail buffer for error diagnosis

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LineCallback, LogConfig, LogLevel, MessagePrefix, ProgressCallback};

/// Progress and message sink for one run.
pub struct RunLogger {
    config: LogConfig,
    log_path: Option<PathBuf>,
    file_writer: Mutex<Option<BufWriter<File>>>,
    line_callback: Option<LineCallback>,
    progress_callback: Option<ProgressCallback>,
    tail_buffer: Mutex<VecDeque<String>>,
    /// Last progress percentage written (compact mode).
    last_progress: Mutex<Option<u32>>,
}

impl Default for RunLogger {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl RunLogger {
    /// In-memory logger; lines only reach callbacks and the tail buffer.
    pub fn new(config: LogConfig) -> Self {
        let capacity = config.error_tail;
        Self {
            config,
            log_path: None,
            file_writer: Mutex::new(None),
            line_callback: None,
            progress_callback: None,
            tail_buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            last_progress: Mutex::new(None),
        }
    }

    /// Also write every line to `path`, creating parent directories.
    pub fn with_log_file(mut self, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.file_writer = Mutex::new(Some(BufWriter::new(file)));
        self.log_path = Some(path.to_path_buf());
        Ok(self)
    }

    pub fn with_line_callback(mut self, callback: LineCallback) -> Self {
        self.line_callback = Some(callback);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }
        let formatted = self.format_message(message);
        self.output(&formatted);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// Log a phase marker.
    pub fn phase(&self, phase_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Report one finished unit of work.
    ///
    /// The progress callback sees every step. The log line is filtered to
    /// `progress_step` intervals in compact mode; returns whether it was
    /// written.
    pub fn step(&self, step: usize, total: usize, message: &str) -> bool {
        if let Some(callback) = &self.progress_callback {
            callback(step, total, message);
        }

        let percent = if total == 0 {
            100
        } else {
            (step.min(total) * 100 / total) as u32
        };

        if self.config.compact {
            let mut last = self.last_progress.lock();
            let stride = self.config.progress_step.max(1);
            let current_step = percent / stride;
            let blocked = matches!(*last, Some(prev) if prev / stride >= current_step);
            if blocked && percent < 100 {
                self.push_tail(&format!("[{}/{}] {}", step, total, message));
                return false;
            }
            *last = Some(percent);
        }

        self.info(&format!("[{}/{}] {}", step, total, message));
        true
    }

    /// Show the tail buffer (typically after an error).
    pub fn show_tail(&self, header: &str) {
        let lines = self.tail();
        if lines.is_empty() {
            return;
        }
        self.write_line(&self.format_message(&format!("[{}/tail]", header)));
        for line in &lines {
            self.write_line(line);
        }
    }

    /// Current tail buffer contents, oldest first.
    pub fn tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    pub fn clear_tail(&self) {
        self.tail_buffer.lock().clear();
    }

    /// Flush the log file.
    pub fn flush(&self) {
        if let Some(writer) = self.file_writer.lock().as_mut() {
            let _ = writer.flush();
        }
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    fn push_tail(&self, line: &str) {
        if self.config.error_tail == 0 {
            return;
        }
        let mut buffer = self.tail_buffer.lock();
        if buffer.len() >= self.config.error_tail {
            buffer.pop_front();
        }
        buffer.push_back(line.to_string());
    }

    fn output(&self, formatted: &str) {
        self.push_tail(formatted);
        self.write_line(formatted);
    }

    fn write_line(&self, formatted: &str) {
        if let Some(writer) = self.file_writer.lock().as_mut() {
            let _ = writeln!(writer, "{}", formatted);
        }
        if let Some(callback) = &self.line_callback {
            callback(formatted);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.flush();
    }
}
