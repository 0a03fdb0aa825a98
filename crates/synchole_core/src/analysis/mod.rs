//! Waveform analysis for acoustic sync.
//!
//! The correlation matcher composes these pure functions:
//!
//! 1. **Extraction** happens outside this module, through
//!    [`MediaToolkit::extract`](crate::toolkit::MediaToolkit::extract),
//!    which yields mono [`AudioData`] at the analysis rate.
//!
//! 2. **Correlation** (`correlation`): zero-padded FFT cross-correlation,
//!    energy-normalized, with the peak converted to a signed sample lag.
//!
//! # Usage
//!
//! ```
//! use synchole_core::analysis::cross_correlate;
//!
//! let signal: Vec<f64> = (0..2000).map(|i| ((i * 7919) % 113) as f64 - 56.0).collect();
//! let result = cross_correlate(&signal, &signal);
//! assert_eq!(result.lag_samples, 0);
//! ```

mod correlation;
pub mod types;

pub use correlation::{circular_to_linear_lag, correlation_series, cross_correlate};
pub use types::{AudioData, CorrelationResult};

/// Default sample rate for analysis (8 kHz is plenty for sync).
pub const DEFAULT_ANALYSIS_SAMPLE_RATE: u32 = 8000;
