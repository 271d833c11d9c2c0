//! Comparison policies
//!
//! Every equation ends in one of three acceptance rules:
//!
//! - `RoundedEquals`: the computed probability, rounded to a fixed number
//!   of decimal places, equals 0.0 or 1.0 exactly (asymptotic vanishing or
//!   certainty)
//! - `ScaleDependentRange`: below n = 10^6 the candidate count must lie in
//!   `expect ± 2·√expect`; at or above it, the first two characters of the
//!   decimal renderings of `expect` and the count must agree
//! - `RelativeBand`: the count must lie in `expect ± expect·(c₁ − 1)`
//!
//! The leading-characters rule is a string comparison, not a numeric
//! tolerance. It ignores magnitude entirely ("12.5" matches "1234") and
//! an integral float keeps its ".0" suffix ("5.0" does not match "5").

use serde::{Deserialize, Serialize};

/// Population size at which the range check switches to the digit-prefix rule
pub const LARGE_SCALE_CROSSOVER: u64 = 1_000_000;

/// Number of leading characters compared by the digit-prefix rule
pub const LEADING_DIGITS: usize = 2;

/// Acceptance rule for one equation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ComparisonPolicy {
    /// `round(observed, places) == target`
    RoundedEquals {
        /// 0.0 or 1.0
        target: f64,
        /// Decimal places kept before the equality test
        places: u32,
    },
    /// Normal-approximation band below the crossover, digit prefix at or above
    ScaleDependentRange {
        /// Population size n selecting the branch
        population: u64,
    },
    /// Symmetric band proportional to the expectation
    RelativeBand {
        /// Tolerance multiplier c₁ (> 1)
        multiplier: f64,
    },
}

impl ComparisonPolicy {
    /// Probability must round to exactly 0.0
    pub fn vanishes(places: u32) -> Self {
        Self::RoundedEquals {
            target: 0.0,
            places,
        }
    }

    /// Probability must round to exactly 1.0
    pub fn certain(places: u32) -> Self {
        Self::RoundedEquals {
            target: 1.0,
            places,
        }
    }

    /// Decide whether `observed` is acceptable against `expected`
    ///
    /// For `RoundedEquals`, `expected` is ignored in favour of the policy's
    /// target and `observed` is the computed probability. For the range
    /// policies, `expected` is the predicted count and `observed` is the
    /// candidate count r.
    ///
    /// # Examples
    ///
    /// ```
    /// use repverify::core::ComparisonPolicy;
    ///
    /// assert!(ComparisonPolicy::vanishes(6).accept(0.0, 4e-7));
    /// assert!(!ComparisonPolicy::vanishes(6).accept(0.0, 6e-7));
    ///
    /// let small = ComparisonPolicy::ScaleDependentRange { population: 10_000 };
    /// assert!(small.accept(100.0, 115.0));
    /// assert!(!small.accept(100.0, 125.0));
    /// ```
    pub fn accept(&self, expected: f64, observed: f64) -> bool {
        match *self {
            ComparisonPolicy::RoundedEquals { target, places } => {
                rounded_equals(observed, target, places)
            }
            ComparisonPolicy::ScaleDependentRange { population } => {
                if population < LARGE_SCALE_CROSSOVER {
                    let stdev = 2.0 * expected.sqrt();
                    observed >= expected - stdev && observed <= expected + stdev
                } else {
                    leading_digits_match(expected, observed, LEADING_DIGITS)
                }
            }
            ComparisonPolicy::RelativeBand { multiplier } => {
                let dev = expected * (multiplier - 1.0);
                observed >= expected - dev && observed <= expected + dev
            }
        }
    }
}

/// Round to `places` decimals, ties to even
pub fn round_to(x: f64, places: u32) -> f64 {
    let scale = 10_f64.powi(places as i32);
    (x * scale).round_ties_even() / scale
}

/// `round(value, places) == target`, compared on the scaled integers
pub fn rounded_equals(value: f64, target: f64, places: u32) -> bool {
    let scale = 10_f64.powi(places as i32);
    (value * scale).round_ties_even() == (target * scale).round_ties_even()
}

/// Approximate equality on the first `digits` characters of two decimal renderings
///
/// `expected` renders as a float (see [`float_repr`]); `observed` is a
/// count and renders as an integer.
pub fn leading_digits_match(expected: f64, observed: f64, digits: usize) -> bool {
    let expected = float_repr(expected);
    let observed = count_repr(observed);
    prefix(&expected, digits) == prefix(&observed, digits)
}

fn prefix(s: &str, digits: usize) -> &str {
    match s.char_indices().nth(digits) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Shortest round-trip rendering of a float
///
/// Integral values keep a ".0" suffix. Magnitudes outside [1e-4, 1e16)
/// use exponent notation with an explicit sign and at least two exponent
/// digits (`1.5e+16`, `5e-05`).
pub fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = x.abs();
    if x == 0.0 || (1e-4..1e16).contains(&magnitude) {
        let s = format!("{}", x);
        if s.contains('.') {
            s
        } else {
            format!("{}.0", s)
        }
    } else {
        let s = format!("{:e}", x);
        match s.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => s,
        }
    }
}

fn count_repr(x: f64) -> String {
    if x.fract() == 0.0 && x.is_finite() {
        format!("{}", x as i64)
    } else {
        float_repr(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================
    // Rounded Equality
    // ==========================================

    #[test]
    fn test_rounded_equals_zero() {
        assert!(rounded_equals(0.0, 0.0, 6));
        assert!(rounded_equals(4.9e-7, 0.0, 6));
        assert!(!rounded_equals(5.1e-7, 0.0, 6));
        assert!(rounded_equals(0.004, 0.0, 2));
        assert!(!rounded_equals(0.006, 0.0, 2));
    }

    #[test]
    fn test_rounded_equals_one() {
        assert!(rounded_equals(0.9999996, 1.0, 6));
        assert!(!rounded_equals(0.9999994, 1.0, 6));
        // Five places is looser
        assert!(rounded_equals(0.999996, 1.0, 5));
        assert!(!rounded_equals(0.999996, 1.0, 6));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(7.0, 6), 7.0);
    }

    // ==========================================
    // Scale-Dependent Range
    // ==========================================

    #[test]
    fn test_small_scale_uses_stdev_band() {
        let policy = ComparisonPolicy::ScaleDependentRange { population: 10_000 };
        // expect = 49, band = 49 ± 14
        assert!(policy.accept(49.0, 35.0));
        assert!(policy.accept(49.0, 63.0));
        assert!(!policy.accept(49.0, 34.0));
        assert!(!policy.accept(49.0, 64.0));
    }

    #[test]
    fn test_large_scale_uses_digit_prefix() {
        let policy = ComparisonPolicy::ScaleDependentRange {
            population: 10_000_000,
        };
        assert!(policy.accept(1234.56, 1299.0));
        // Magnitude is ignored
        assert!(policy.accept(12.5, 1234.0));
        assert!(!policy.accept(1234.56, 1334.0));
    }

    #[test]
    fn test_crossover_is_inclusive() {
        let at = ComparisonPolicy::ScaleDependentRange {
            population: LARGE_SCALE_CROSSOVER,
        };
        // Inside the stdev band but different leading digits
        assert!(!at.accept(100.0, 99.0));
        let below = ComparisonPolicy::ScaleDependentRange {
            population: LARGE_SCALE_CROSSOVER - 1,
        };
        assert!(below.accept(100.0, 99.0));
    }

    #[test]
    fn test_integral_float_keeps_suffix() {
        // "5.0"[..2] is "5." while "5"[..2] is "5"
        assert!(!leading_digits_match(5.0, 5.0, 2));
        assert!(leading_digits_match(57.0, 5700.0, 2));
    }

    // ==========================================
    // Relative Band
    // ==========================================

    #[test]
    fn test_relative_band() {
        let policy = ComparisonPolicy::RelativeBand { multiplier: 1.0999 };
        assert!(policy.accept(100.0, 109.0));
        assert!(policy.accept(100.0, 91.0));
        assert!(!policy.accept(100.0, 111.0));
        assert!(!policy.accept(100.0, 89.0));
    }

    // ==========================================
    // Float Rendering
    // ==========================================

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(0.0), "0.0");
        assert_eq!(float_repr(12.0), "12.0");
        assert_eq!(float_repr(1234.56), "1234.56");
        assert_eq!(float_repr(0.001), "0.001");
        assert_eq!(float_repr(5e-5), "5e-05");
        assert_eq!(float_repr(1.5e16), "1.5e+16");
        assert_eq!(float_repr(1e100), "1e+100");
        assert_eq!(float_repr(-2.5), "-2.5");
    }

    #[test]
    fn test_prefix_shorter_than_digits() {
        assert_eq!(prefix("7", 2), "7");
        assert_eq!(prefix("72", 2), "72");
        assert_eq!(prefix("725", 2), "72");
    }
}
