//! FFT cross-correlation.
//!
//! Pure functions: no I/O, no logging.

use rustfft::{num_complex::Complex, FftPlanner};

use super::types::CorrelationResult;

/// Energies below this product are treated as silence.
const MIN_ENERGY: f64 = 1e-12;

/// Cross-correlate `candidate` against `reference` and locate the peak.
///
/// Both signals are zero-padded to the next power of two that holds the
/// full linear correlation (`len(a) + len(b) - 1`), so the circular result
/// has no wrap-around overlap. The series is normalized by the product of
/// the signals' root-sum-of-squares energies; the confidence is the
/// magnitude at the peak.
pub fn cross_correlate(reference: &[f64], candidate: &[f64]) -> CorrelationResult {
    if reference.is_empty() || candidate.is_empty() {
        return CorrelationResult::silent();
    }

    let ref_energy = reference.iter().map(|x| x * x).sum::<f64>().sqrt();
    let cand_energy = candidate.iter().map(|x| x * x).sum::<f64>().sqrt();
    let denom = ref_energy * cand_energy;
    if denom.is_nan() || denom < MIN_ENERGY {
        return CorrelationResult::silent();
    }

    let correlation = correlation_series(reference, candidate);
    let fft_len = correlation.len();

    // First index wins on ties.
    let mut peak_idx = 0;
    let mut peak_val = f64::NEG_INFINITY;
    for (i, value) in correlation.iter().enumerate() {
        let magnitude = value.abs();
        if magnitude > peak_val {
            peak_val = magnitude;
            peak_idx = i;
        }
    }

    CorrelationResult {
        lag_samples: circular_to_linear_lag(peak_idx, fft_len),
        confidence: peak_val / denom,
    }
}

/// Raw (unnormalized) circular cross-correlation.
///
/// Index `k` holds `sum(reference[n + k] * candidate[n])`; negative lags
/// wrap to the end of the buffer.
pub fn correlation_series(reference: &[f64], candidate: &[f64]) -> Vec<f64> {
    let correlation_len = reference.len() + candidate.len() - 1;
    let fft_len = correlation_len.next_power_of_two();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(fft_len);
    let ifft = planner.plan_fft_inverse(fft_len);

    let mut ref_spectrum = zero_padded(reference, fft_len);
    let mut cand_spectrum = zero_padded(candidate, fft_len);

    fft.process(&mut ref_spectrum);
    fft.process(&mut cand_spectrum);

    let mut product: Vec<Complex<f64>> = ref_spectrum
        .iter()
        .zip(cand_spectrum.iter())
        .map(|(r, c)| r * c.conj())
        .collect();

    ifft.process(&mut product);

    // rustfft leaves the inverse unscaled.
    let scale = 1.0 / fft_len as f64;
    product.iter().map(|c| c.re * scale).collect()
}

/// Map a circular FFT index onto a signed lag.
///
/// Indices past the midpoint are negative lags; the midpoint itself and
/// everything before it are non-negative.
pub fn circular_to_linear_lag(index: usize, fft_len: usize) -> i64 {
    if index > fft_len / 2 {
        index as i64 - fft_len as i64
    } else {
        index as i64
    }
}

fn zero_padded(signal: &[f64], len: usize) -> Vec<Complex<f64>> {
    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(len, Complex::new(0.0, 0.0));
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(len: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    #[test]
    fn identical_signals_have_zero_lag() {
        let sig = noise(4000, 42);
        let result = cross_correlate(&sig, &sig);
        assert_eq!(result.lag_samples, 0);
        assert!(result.confidence > 0.95, "confidence {}", result.confidence);
    }

    #[test]
    fn candidate_starting_later_gives_positive_lag() {
        let sig = noise(6000, 7);
        let shift = 150;
        // candidate[n] == reference[n + shift]
        let reference = &sig[..sig.len() - shift];
        let candidate = &sig[shift..];

        let result = cross_correlate(reference, candidate);
        assert!(
            (result.lag_samples - shift as i64).abs() <= 2,
            "expected ~{shift}, got {}",
            result.lag_samples
        );
        assert!(result.confidence > 0.5);
    }

    #[test]
    fn candidate_starting_earlier_gives_negative_lag() {
        let sig = noise(6000, 11);
        let shift = 200;
        let reference = &sig[shift..];
        let candidate = &sig[..sig.len() - shift];

        let result = cross_correlate(reference, candidate);
        assert!(
            (result.lag_samples + shift as i64).abs() <= 2,
            "expected ~-{shift}, got {}",
            result.lag_samples
        );
        assert!(result.confidence > 0.5);
    }

    #[test]
    fn unrelated_noise_stays_below_threshold() {
        for seed in 0..5u64 {
            let a = noise(4000, seed);
            let b = noise(4000, seed + 1000);
            let result = cross_correlate(&a, &b);
            assert!(result.confidence < 0.15, "seed {seed}: {}", result.confidence);
        }
    }

    #[test]
    fn silence_yields_zero() {
        let silence = vec![0.0; 1000];
        let result = cross_correlate(&silence, &silence);
        assert_eq!(result, CorrelationResult::silent());

        let sig = noise(1000, 3);
        assert_eq!(cross_correlate(&sig, &silence).confidence, 0.0);
    }

    #[test]
    fn empty_input_yields_zero() {
        assert_eq!(cross_correlate(&[], &[1.0]), CorrelationResult::silent());
    }

    #[test]
    fn series_length_is_padded_power_of_two() {
        let series = correlation_series(&[1.0; 5], &[1.0; 4]);
        assert_eq!(series.len(), 8);
    }

    #[test]
    fn circular_index_maps_to_signed_lag() {
        assert_eq!(circular_to_linear_lag(0, 16), 0);
        assert_eq!(circular_to_linear_lag(8, 16), 8);
        assert_eq!(circular_to_linear_lag(9, 16), -7);
        assert_eq!(circular_to_linear_lag(15, 16), -1);
    }
}
