//! Equation evaluators
//!
//! Each evaluator reconstructs the theoretical probability behind one
//! named equation from the binomial primitives and applies that
//! equation's comparison policy. Equations are labelled `2.1` … `2.6`
//! with a family marker:
//!
//! | Family | Labels | Module |
//! |---|---|---|
//! | two-step, disjoint representation | `2.1` … `2.6` | [`two_step_disjoint`] |
//! | two-step, shared representation | `2.1'` … `2.6'` | [`two_step_shared`] |
//! | one-step, shared or disjoint sum | `2.1''` … `2.6''` | [`one_step`] |

pub mod one_step;
pub mod two_step_disjoint;
pub mod two_step_shared;

use super::binomial::{point_mass, survival};
use super::comparison::ComparisonPolicy;
use super::derived;
use super::error::{validate_bounded, validate_population, validate_probability, CheckError};
use super::nested::nested_sum;
use serde::{Serialize, Serializer};
use std::str::FromStr;
use tracing::debug;

/// Label of one named equation, e.g. `2.3'`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EquationId {
    /// Equation number 1..=6
    pub number: u8,
    /// Family marker: 0 two-step disjoint, 1 two-step shared, 2 one-step
    pub primes: u8,
}

impl EquationId {
    /// Two-step disjoint equation `2.{number}`
    pub const fn plain(number: u8) -> Self {
        Self { number, primes: 0 }
    }

    /// Two-step shared equation `2.{number}'`
    pub const fn dash(number: u8) -> Self {
        Self { number, primes: 1 }
    }

    /// One-step equation `2.{number}''`
    pub const fn double_dash(number: u8) -> Self {
        Self { number, primes: 2 }
    }
}

impl std::fmt::Display for EquationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "2.{}", self.number)?;
        for _ in 0..self.primes {
            f.write_str("'")?;
        }
        Ok(())
    }
}

impl FromStr for EquationId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .trim()
            .strip_prefix("2.")
            .ok_or_else(|| format!("Equation label '{}' must start with '2.'", s))?;
        let mut chars = rest.chars();
        let number = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .filter(|d| (1..=6).contains(d))
            .ok_or_else(|| format!("Equation label '{}' must be numbered 2.1 to 2.6", s))?;
        let marks = chars.as_str();
        if !marks.chars().all(|c| c == '\'') || marks.len() > 2 {
            return Err(format!(
                "Equation label '{}' may only carry up to two ' markers",
                s
            ));
        }
        Ok(Self {
            number: number as u8,
            primes: marks.len() as u8,
        })
    }
}

impl Serialize for EquationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of one named equation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    /// Equation label
    pub equation: EquationId,
    /// Whether the equation holds for the given parameters
    pub passed: bool,
    /// Predicted value: the target probability or the expected count
    pub expected: f64,
    /// Computed value: the probability or the candidate count r
    pub observed: f64,
    /// Rule that decided `passed`
    pub policy: ComparisonPolicy,
}

impl CheckResult {
    /// Apply `policy` and record the values it was applied to
    pub fn decide(
        equation: EquationId,
        policy: ComparisonPolicy,
        expected: f64,
        observed: f64,
    ) -> Self {
        let passed = policy.accept(expected, observed);
        debug!(equation = %equation, expected, observed, passed, "Equation evaluated");
        Self {
            equation,
            passed,
            expected,
            observed,
            policy,
        }
    }

    /// The probability must round to 0.0 at `places` decimals
    pub(crate) fn vanishes(equation: EquationId, places: u32, probability: f64) -> Self {
        Self::decide(equation, ComparisonPolicy::vanishes(places), 0.0, probability)
    }

    /// The probability must round to 1.0 at `places` decimals
    pub(crate) fn certain(equation: EquationId, places: u32, probability: f64) -> Self {
        Self::decide(equation, ComparisonPolicy::certain(places), 1.0, probability)
    }

    /// A derived count is negative, so the probability is undefined and the
    /// equation does not hold
    pub(crate) fn undefined(
        equation: EquationId,
        policy: ComparisonPolicy,
        expected: f64,
        count: (&'static str, f64),
    ) -> Self {
        debug!(equation = %equation, count = count.0, value = count.1, "Derived count is negative");
        Self {
            equation,
            passed: false,
            expected,
            observed: f64::NAN,
            policy,
        }
    }

    /// Same outcome reported under another label
    pub fn relabel(mut self, equation: EquationId) -> Self {
        self.equation = equation;
        self
    }
}

/// Checks shared by every evaluator: n > 0, p ∈ (0, 1), r ≤ n
pub(crate) fn validate_common(n: u64, p: f64, r: u64) -> Result<(), CheckError> {
    validate_population(n)?;
    validate_probability(p)?;
    validate_bounded("r", r, n)
}

/// Validates a threshold count k, k_a or k_m
pub(crate) fn validate_threshold(name: &'static str, k: u64, n: u64) -> Result<(), CheckError> {
    validate_bounded(name, k, n)
}

/// Probability that an element is over threshold given the pairwise overlap r'
///
/// ```text
/// B(r', p, k) + Σ_{i=0}^{k-1} T(r', p, i) · factor(k − i)
/// ```
///
/// The overlap region alone reaches the threshold, or contributes `i`
/// and the non-overlapping remainder supplies the rest, as described by
/// `factor`.
pub(crate) fn overlap_sum<F>(n: u64, p: f64, k: u64, r: u64, factor: F) -> Result<f64, CheckError>
where
    F: Fn(f64, f64) -> Result<f64, CheckError>,
{
    let r_dash = derived::r_dash(n, r)? as f64;
    let weight = |i: u64| point_mass(r_dash, p, i as f64);
    let total = nested_sum(&[&weight], |_| k, |idx| factor(r_dash, (k - idx[0]) as f64))?;
    // rounding can carry a sum of near-certain terms just past 1
    Ok((survival(r_dash, p, k as f64)? + total).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equation_labels() {
        assert_eq!(EquationId::plain(1).to_string(), "2.1");
        assert_eq!(EquationId::dash(3).to_string(), "2.3'");
        assert_eq!(EquationId::double_dash(6).to_string(), "2.6''");
    }

    #[test]
    fn test_parse_equation_labels() {
        assert_eq!("2.3".parse::<EquationId>(), Ok(EquationId::plain(3)));
        assert_eq!("2.3'".parse::<EquationId>(), Ok(EquationId::dash(3)));
        assert_eq!(" 2.5'' ".parse::<EquationId>(), Ok(EquationId::double_dash(5)));
    }

    #[test]
    fn test_rejects_malformed_labels() {
        for label in ["3.1", "2.7", "2.0", "2.1'''", "2.1x", "2."] {
            assert!(label.parse::<EquationId>().is_err(), "{} accepted", label);
        }
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&EquationId::double_dash(2)).unwrap();
        assert_eq!(json, "\"2.2''\"");
    }

    #[test]
    fn test_validate_common() {
        assert!(validate_common(100, 0.01, 100).is_ok());
        assert!(validate_common(0, 0.01, 0).is_err());
        assert!(validate_common(100, 0.0, 10).is_err());
        assert!(validate_common(100, 1.0, 10).is_err());
        assert!(validate_common(100, 0.01, 101).is_err());
    }

    #[test]
    fn test_overlap_sum_without_overlap_is_factor_at_k() {
        // r' = round(50² / 10000) = 0: only i = 0 carries weight
        let value = overlap_sum(10_000, 0.01, 3, 50, |r_dash, threshold| {
            assert_eq!(r_dash, 0.0);
            Ok(threshold / 10.0)
        })
        .unwrap();
        assert!((value - 0.3).abs() < 1e-15);
    }
}
