//! Derived parameter calculation
//!
//! Secondary counts used by the shared-representation equations:
//!
//! ```text
//! r'  = round(r² / n)        candidates expected to collide pairwise
//! r'' = round(r³ / n²)       candidates expected to collide three ways
//! r^  = r' − r''
//! r#  = r − 2r' + r''
//! ```
//!
//! Rounding is half-to-even on the floating quotient. Half-away-from-zero
//! changes r' at exact half-integers (e.g. r = 5, n = 10 gives 2.5 → 2),
//! which moves equation outcomes near those boundaries.

use super::error::{validate_population, CheckError};
use serde::{Deserialize, Serialize};

/// Round half to even, the convention for every derived count
pub fn round_half_even(x: f64) -> f64 {
    x.round_ties_even()
}

/// The derived counts for one (n, r) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedCounts {
    /// r' = round(r² / n)
    pub r_dash: i64,
    /// r'' = round(r³ / n²)
    pub r_ddash: i64,
    /// r^ = r' − r''
    pub r_caret: i64,
    /// r# = r − 2r' + r''
    pub r_sharp: i64,
}

impl DerivedCounts {
    /// Compute all derived counts from the population size and candidate count
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when `n == 0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use repverify::core::DerivedCounts;
    ///
    /// let d = DerivedCounts::new(10_000, 500).unwrap();
    /// assert_eq!(d.r_dash, 25);
    /// assert_eq!(d.r_ddash, 1);
    /// assert_eq!(d.r_caret, 24);
    /// assert_eq!(d.r_sharp, 451);
    /// ```
    pub fn new(n: u64, r: u64) -> Result<Self, CheckError> {
        let r_dash = r_dash(n, r)?;
        let r_ddash = r_ddash(n, r)?;
        let r = r as i64;
        Ok(Self {
            r_dash,
            r_ddash,
            r_caret: r_dash - r_ddash,
            // The literal combination r − 2r' + r''; the sign of the last
            // term is an open question in the analytic derivation.
            r_sharp: r - 2 * r_dash + r_ddash,
        })
    }
}

/// r' = round(r² / n)
pub fn r_dash(n: u64, r: u64) -> Result<i64, CheckError> {
    validate_population(n)?;
    let r = r as f64;
    Ok(round_half_even(r * r / n as f64) as i64)
}

/// r'' = round(r³ / n²)
pub fn r_ddash(n: u64, r: u64) -> Result<i64, CheckError> {
    validate_population(n)?;
    let (r, n) = (r as f64, n as f64);
    Ok(round_half_even(r.powi(3) / (n * n)) as i64)
}
