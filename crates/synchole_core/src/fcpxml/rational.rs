//! Rational time literals (`"1001/24000s"`).
//!
//! Every encoder here is total: non-finite input maps to zero and nothing
//! panics or fails.

use std::fmt;

/// Default bound for [`seconds_to_rational`].
pub const DEFAULT_MAX_DENOMINATOR: u64 = 100_000;

/// Largest magnitude accepted before clamping.
const MAX_MAGNITUDE: f64 = (1u64 << 52) as f64;

/// A rational time value in seconds.
///
/// Displays as `"{num}/{den}s"`. Values built by [`Rational::reduced`] are
/// in lowest terms; sample-aligned values are kept over the sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    num: i64,
    den: u64,
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };

    /// Fraction as given. A zero denominator yields zero.
    pub fn new(num: i64, den: u64) -> Self {
        if den == 0 {
            Self::ZERO
        } else {
            Self { num, den }
        }
    }

    /// Fraction in lowest terms.
    pub fn reduced(num: i64, den: u64) -> Self {
        if den == 0 {
            return Self::ZERO;
        }
        let g = gcd(num.unsigned_abs(), den);
        Self {
            num: num / g as i64,
            den: den / g,
        }
    }

    /// Whole seconds.
    pub fn whole(seconds: i64) -> Self {
        Self { num: seconds, den: 1 }
    }

    pub fn numerator(&self) -> i64 {
        self.num
    }

    pub fn denominator(&self) -> u64 {
        self.den
    }

    pub fn to_seconds(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}s", self.num, self.den)
    }
}

/// Closest fraction to `seconds` with a denominator of at most
/// `max_denominator`, in lowest terms.
///
/// Works from the exact binary value of the float, so `0.1` becomes
/// `1/10` rather than a power-of-two fraction.
pub fn seconds_to_rational(seconds: f64, max_denominator: u64) -> Rational {
    if !seconds.is_finite() {
        return Rational::ZERO;
    }
    let max_den = max_denominator.max(1) as i128;
    let seconds = seconds.clamp(-MAX_MAGNITUDE, MAX_MAGNITUDE);
    let negative = seconds < 0.0;
    let magnitude = seconds.abs();

    // Anything closer to zero than to 1/max_den rounds to zero.
    if magnitude * 2.0 * (max_den as f64) <= 1.0 {
        return Rational::ZERO;
    }

    let (n, d) = exact_fraction(magnitude);
    let (num, den) = limit_denominator(n, d, max_den);
    let num = num as i64;
    Rational::reduced(if negative { -num } else { num }, den as u64)
}

/// `seconds` rounded to the nearest whole frame, expressed exactly in
/// frame durations (`fps_den / fps_num` each).
pub fn frame_aligned(seconds: f64, fps_num: u32, fps_den: u32) -> Rational {
    if fps_num == 0 || fps_den == 0 || !seconds.is_finite() {
        return Rational::ZERO;
    }
    let frames = (seconds.clamp(-MAX_MAGNITUDE, MAX_MAGNITUDE) * fps_num as f64 / fps_den as f64)
        .round() as i64;
    Rational::reduced(frames.saturating_mul(fps_den as i64), fps_num as u64)
}

/// `seconds` rounded to the nearest whole sample, kept over the sample rate.
pub fn sample_aligned(seconds: f64, sample_rate: u32) -> Rational {
    if sample_rate == 0 || !seconds.is_finite() {
        return Rational::ZERO;
    }
    let samples = (seconds.clamp(-MAX_MAGNITUDE, MAX_MAGNITUDE) * sample_rate as f64).round();
    Rational::new(samples as i64, sample_rate as u64)
}

/// `seconds` rounded to the nearest whole second.
pub fn whole_seconds(seconds: f64) -> Rational {
    if !seconds.is_finite() {
        return Rational::ZERO;
    }
    Rational::whole(seconds.clamp(-MAX_MAGNITUDE, MAX_MAGNITUDE).round() as i64)
}

/// Exact `numerator / denominator` of a positive finite float.
///
/// Callers guarantee the value is large enough that the denominator
/// fits in an `i128`.
fn exact_fraction(value: f64) -> (i128, i128) {
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32;
    let fraction = (bits & ((1u64 << 52) - 1)) as i128;
    let (mantissa, exp) = if exponent == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1i128 << 52), exponent - 1075)
    };

    if exp >= 0 {
        (mantissa << exp.min(74), 1)
    } else {
        let shift = (-exp).min(126);
        let mut num = mantissa;
        let mut den = 1i128 << shift;
        // Strip common powers of two.
        while num & 1 == 0 && den > 1 {
            num >>= 1;
            den >>= 1;
        }
        (num, den)
    }
}

/// Best rational approximation of `n / d` with denominator at most
/// `max_den`, via continued fractions.
fn limit_denominator(n: i128, d: i128, max_den: i128) -> (i128, i128) {
    if d <= max_den {
        return (n, d);
    }

    let (mut p0, mut q0, mut p1, mut q1) = (0i128, 1i128, 1i128, 0i128);
    let (mut n, mut d) = (n, d);
    let original_d = d;
    loop {
        let a = n / d;
        let q2 = q0 + a * q1;
        if q2 > max_den {
            break;
        }
        (p0, q0, p1, q1) = (p1, q1, p0 + a * p1, q2);
        (n, d) = (d, n - a * d);
        if d == 0 {
            return (p1, q1);
        }
    }

    // Choose between the last convergent and the best semiconvergent.
    let k = (max_den - q0) / q1;
    if 2 * d * (q0 + k * q1) <= original_d {
        (p1, q1)
    } else {
        (p0 + k * p1, q0 + k * q1)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}
