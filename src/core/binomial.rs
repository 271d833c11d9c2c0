//! Binomial primitives
//!
//! The two distribution functions every equation is composed from:
//!
//! - `survival(count, p, threshold)`: P(X ≥ threshold) for X ~ Binomial(count, p)
//! - `point_mass(count, p, j)`: P(X = j)
//!
//! # Non-integer arguments
//!
//! The equations feed fractional counts and thresholds (r/2, r/10, 2r/3)
//! into both functions. The conventions, applied everywhere, are:
//!
//! - The threshold is floored: `survival(count, p, 2.5)` is P(X ≥ 2).
//!   This is the survival function evaluated at `threshold - 1` with the
//!   argument floored, since ⌊t − 1⌋ + 1 = ⌊t⌋.
//! - An integral count goes through `statrs`'s `Binomial`. A fractional
//!   count is relaxed continuously: the survival is `I_p(k, count − k + 1)`
//!   and the point mass uses log-gamma in place of the binomial coefficient.
//! - The point mass at a non-integral `j` is 0.
//!
//! Both paths stay in log space or in the incomplete beta relation, so
//! counts of 10^7 and beyond neither overflow nor cancel.

use super::error::CheckError;
use statrs::distribution::{Binomial, Discrete, DiscreteCDF};
use statrs::function::{beta, gamma};

/// Largest count still represented exactly as an integer in an f64
const MAX_EXACT_COUNT: f64 = 9_007_199_254_740_992.0;

/// Results outside [0, 1] by less than this are clamped, not rejected
const CLAMP_TOLERANCE: f64 = 1e-9;

/// P(X ≥ ⌊threshold⌋) for X ~ Binomial(count, p)
///
/// # Errors
///
/// `InvalidParameter` if `p` is outside [0, 1], `count` is negative or not
/// finite, or `threshold` is NaN. `NumericInstability` if the result is not
/// a probability.
///
/// # Examples
///
/// ```
/// use repverify::core::binomial::survival;
///
/// // At least zero successes is certain
/// assert_eq!(survival(50.0, 0.01, 0.0).unwrap(), 1.0);
///
/// // P(X ≥ 1) = 1 - (1 - p)^n
/// let p = survival(10.0, 0.1, 1.0).unwrap();
/// assert!((p - (1.0 - 0.9_f64.powi(10))).abs() < 1e-12);
/// ```
pub fn survival(count: f64, p: f64, threshold: f64) -> Result<f64, CheckError> {
    validate_arguments(count, p)?;
    if threshold.is_nan() {
        return Err(CheckError::invalid("threshold", threshold, "must be a number"));
    }

    let k = threshold.floor();
    if k <= 0.0 {
        return Ok(1.0);
    }
    if k > count {
        return Ok(0.0);
    }
    // k >= 1 and k <= count from here on
    if p == 0.0 {
        return Ok(0.0);
    }
    if p == 1.0 {
        return Ok(1.0);
    }

    let value = match integral_count(count) {
        Some(n) => distribution(n, p)?.sf(k as u64 - 1),
        None => beta::beta_reg(k, count - k + 1.0, p),
    };
    checked_probability("survival", value)
}

/// P(X = j) for X ~ Binomial(count, p)
///
/// Zero for `j` outside `0..=count` or not an integer.
///
/// # Errors
///
/// Same domain as [`survival`].
pub fn point_mass(count: f64, p: f64, j: f64) -> Result<f64, CheckError> {
    validate_arguments(count, p)?;
    if j.is_nan() {
        return Err(CheckError::invalid("j", j, "must be a number"));
    }
    if j < 0.0 || j.fract() != 0.0 || j > count {
        return Ok(0.0);
    }

    let value = match integral_count(count) {
        Some(n) => distribution(n, p)?.pmf(j as u64),
        None => relaxed_point_mass(count, p, j),
    };
    checked_probability("point_mass", value)
}

/// Continuous relaxation of the point mass for a fractional count
fn relaxed_point_mass(count: f64, p: f64, j: f64) -> f64 {
    if p == 0.0 {
        return if j == 0.0 { 1.0 } else { 0.0 };
    }
    if p == 1.0 {
        // j is integral and count is not, so j != count
        return 0.0;
    }
    let ln_coefficient =
        gamma::ln_gamma(count + 1.0) - gamma::ln_gamma(j + 1.0) - gamma::ln_gamma(count - j + 1.0);
    (ln_coefficient + j * p.ln() + (count - j) * (1.0 - p).ln()).exp()
}

fn distribution(n: u64, p: f64) -> Result<Binomial, CheckError> {
    Binomial::new(p, n).map_err(|_| CheckError::invalid("p", p, "must be in [0, 1]"))
}

fn integral_count(count: f64) -> Option<u64> {
    if count.fract() == 0.0 && count <= MAX_EXACT_COUNT {
        Some(count as u64)
    } else {
        None
    }
}

fn validate_arguments(count: f64, p: f64) -> Result<(), CheckError> {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return Err(CheckError::invalid("p", p, "must be in [0, 1]"));
    }
    if !count.is_finite() || count < 0.0 {
        return Err(CheckError::invalid("count", count, "must be finite and >= 0"));
    }
    Ok(())
}

fn checked_probability(context: &'static str, value: f64) -> Result<f64, CheckError> {
    if value.is_nan() || value < -CLAMP_TOLERANCE || value > 1.0 + CLAMP_TOLERANCE {
        return Err(CheckError::unstable(context, value));
    }
    Ok(value.clamp(0.0, 1.0))
}
