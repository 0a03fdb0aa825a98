//! Configuration management for Sync Hole.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use synchole_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/sync-hole.toml");
//! config.load_or_create()?;
//!
//! println!("Mode: {}", config.settings().matching.mode);
//!
//! config.settings_mut().matching.mode = "audio".to_string();
//! config.update_section(ConfigSection::Matching)?;
//! # Ok::<(), synchole_core::config::ConfigError>(())
//! ```

mod manager;
mod settings;

pub(crate) use manager::atomic_write;
pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, CorrelationSettings, DocumentSettings, LoggingSettings, MatchingSettings,
    Settings, ToolSettings,
};
