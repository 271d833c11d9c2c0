//! Two-step mechanisms over a shared representation (equations 2.1' … 2.6')
//!
//! Sources share storage, so r' = round(r²/n) candidates overlap pairwise
//! and r'' = round(r³/n²) three ways. The over-threshold probability is
//! split by how many of the k slots the overlap already fills.

use super::{
    overlap_sum, two_step_disjoint, validate_common, validate_threshold, CheckResult, EquationId,
};
use crate::core::binomial::{point_mass, survival};
use crate::core::comparison::{round_to, ComparisonPolicy};
use crate::core::derived::{self, DerivedCounts};
use crate::core::error::CheckError;
use crate::core::nested::{nested_sum, remaining_budget};

/// Default tolerance multiplier c₁ for equation 2.1'
pub const DEFAULT_C1: f64 = 1.0999;

/// `B(r', p, k) + Σ_{i<k} T(r', p, i) · B(r − r', p, k − i)²`
fn pair_over_threshold(n: u64, p: f64, k: u64, r: u64) -> Result<f64, CheckError> {
    let rf = r as f64;
    overlap_sum(n, p, k, r, |r_dash, remaining| {
        Ok(survival(rf - r_dash, p, remaining)?.powi(2))
    })
}

/// 2.1': r lies within `expect ± expect·(c₁ − 1)` where `expect = n · p'`
pub fn eq_2_1_dash(n: u64, p: f64, k: u64, r: u64, c_1: f64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k", k, n)?;
    if c_1.is_nan() || c_1 <= 1.0 {
        return Err(CheckError::invalid("c_1", c_1, "must be > 1"));
    }
    let p_dash = pair_over_threshold(n, p, k, r)?;
    let expect = round_to(n as f64 * p_dash, 6);
    Ok(CheckResult::decide(
        EquationId::dash(1),
        ComparisonPolicy::RelativeBand { multiplier: c_1 },
        expect,
        r as f64,
    ))
}

/// 2.2': `B(n, p', r/10)` vanishes, with the second source holding only r/2
pub fn eq_2_2_dash(n: u64, p: f64, k: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k", k, n)?;
    let rf = r as f64;
    let half_exclusive = rf / 2.0 - derived::r_dash(n, r)? as f64;
    if half_exclusive < 0.0 {
        return Ok(CheckResult::undefined(
            EquationId::dash(2),
            ComparisonPolicy::vanishes(6),
            0.0,
            ("r/2 - r'", half_exclusive),
        ));
    }
    let p_dash = overlap_sum(n, p, k, r, |r_dash, remaining| {
        Ok(survival(rf - r_dash, p, remaining)? * survival(rf / 2.0 - r_dash, p, remaining)?)
    })?;
    let expect = survival(n as f64, p_dash, rf / 10.0)?;
    Ok(CheckResult::vanishes(EquationId::dash(2), 6, expect))
}

/// Collision probability behind 2.3'
///
/// Four nested indices: i, j, l drawn from the pairwise-only overlap r^
/// and m from the three-way overlap r''. Every range is inclusive of the
/// remaining budget (`0..k − Σouter + 1`). The leaf combines the three
/// exclusive regions of size r#:
///
/// ```text
/// B(r#, p, k−i−j−m) · B(r#, p, k−j−l−m) · (1 − B(r#, p, k−i−l−m))
/// ```
///
/// # Errors
///
/// `InvalidParameter` when r# is negative.
pub fn collision_probability(n: u64, p: f64, k: u64, r: u64) -> Result<f64, CheckError> {
    let counts = DerivedCounts::new(n, r)?;
    let r_caret = counts.r_caret as f64;
    let r_ddash = counts.r_ddash as f64;
    let r_sharp = counts.r_sharp as f64;

    let pairwise = |x: u64| point_mass(r_caret, p, x as f64);
    let three_way = |m: u64| point_mass(r_ddash, p, m as f64);
    let k = k as i64;

    nested_sum(
        &[&pairwise, &pairwise, &pairwise, &three_way],
        |outer| remaining_budget(k as u64, outer) + 1,
        |idx| {
            let (i, j, l, m) = (idx[0] as i64, idx[1] as i64, idx[2] as i64, idx[3] as i64);
            let first = survival(r_sharp, p, (k - i - j - m) as f64)?;
            let second = survival(r_sharp, p, (k - j - l - m) as f64)?;
            let third = survival(r_sharp, p, (k - i - l - m) as f64)?;
            Ok(first * second * (1.0 - third))
        },
    )
}

/// 2.3': `B(n, p', 2r/3)` is certain at five decimal places
pub fn eq_2_3_dash(n: u64, p: f64, k: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k", k, n)?;
    let r_sharp = DerivedCounts::new(n, r)?.r_sharp;
    if r_sharp < 0 {
        return Ok(CheckResult::undefined(
            EquationId::dash(3),
            ComparisonPolicy::certain(5),
            1.0,
            ("r#", r_sharp as f64),
        ));
    }
    let p_dash = collision_probability(n, p, k, r)?.min(1.0);
    let expect = survival(n as f64, p_dash, 2.0 * r as f64 / 3.0)?;
    Ok(CheckResult::certain(EquationId::dash(3), 5, expect))
}

/// 2.4': identical to 2.4
pub fn eq_2_4_dash(n: u64, p: f64, k: u64, r: u64) -> Result<CheckResult, CheckError> {
    Ok(two_step_disjoint::eq_2_4(n, p, k, r)?.relabel(EquationId::dash(4)))
}

/// 2.5': identical to 2.5
pub fn eq_2_5_dash(n: u64, p: f64, k: u64, r: u64) -> Result<CheckResult, CheckError> {
    Ok(two_step_disjoint::eq_2_5(n, p, k, r)?.relabel(EquationId::dash(5)))
}

/// 2.6': with `p'' = p' · B(n, p', k)`, `B(r, p'', r/2)` vanishes
pub fn eq_2_6_dash(n: u64, p: f64, k: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k", k, n)?;
    let p_dash = pair_over_threshold(n, p, k, r)?;
    let p_ddash = p_dash * survival(n as f64, p_dash, k as f64)?;
    let rf = r as f64;
    let expect = survival(rf, p_ddash, rf / 2.0)?;
    Ok(CheckResult::vanishes(EquationId::dash(6), 6, expect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_probability_matches_hand_written_nest() {
        let (n, p, k, r) = (1_000, 0.02, 2, 120);
        let d = DerivedCounts::new(n, r).unwrap();
        let (rc, rdd, rs) = (d.r_caret as f64, d.r_ddash as f64, d.r_sharp as f64);
        let t = |c: f64, j: i64| point_mass(c, p, j as f64).unwrap();
        let b = |j: i64| survival(rs, p, j as f64).unwrap();

        let k = k as i64;
        let mut expected = 0.0;
        for i in 0..k + 1 {
            let mut total_j = 0.0;
            for j in 0..k - i + 1 {
                let mut total_l = 0.0;
                for l in 0..k - i - j + 1 {
                    let mut total_m = 0.0;
                    for m in 0..k - i - j - l + 1 {
                        total_m += t(rdd, m)
                            * (b(k - i - j - m) * b(k - j - l - m) * (1.0 - b(k - i - l - m)));
                    }
                    total_l += t(rc, l) * total_m;
                }
                total_j += t(rc, j) * total_l;
            }
            expected += t(rc, i) * total_j;
        }

        let value = collision_probability(n, p, k as u64, r).unwrap();
        assert!(
            (value - expected).abs() <= 1e-15 * expected.abs().max(1.0),
            "nested {} vs hand-written {}",
            value,
            expected
        );
    }

    #[test]
    fn test_no_overlap_reduces_to_disjoint_pair() {
        // r' = 0 at r = 50, n = 10_000, so p' = B(r, p, k)²
        let (n, p, k, r) = (10_000, 0.05, 3, 50);
        let pair = pair_over_threshold(n, p, k, r).unwrap();
        let disjoint = survival(r as f64, p, k as f64).unwrap().powi(2);
        assert!((pair - disjoint).abs() < 1e-15);
    }

    #[test]
    fn test_eq_2_1_dash_band() {
        let (n, p, k, r) = (10_000, 0.05, 3, 50);
        let result = eq_2_1_dash(n, p, k, r, DEFAULT_C1).unwrap();
        let expect = round_to(n as f64 * pair_over_threshold(n, p, k, r).unwrap(), 6);
        assert_eq!(result.expected, expect);
        let dev = expect * (DEFAULT_C1 - 1.0);
        assert_eq!(result.passed, (expect - dev..=expect + dev).contains(&50.0));
    }

    #[test]
    fn test_eq_2_1_dash_rejects_c1_not_above_one() {
        assert!(eq_2_1_dash(10_000, 0.05, 3, 50, 1.0).is_err());
        assert!(eq_2_1_dash(10_000, 0.05, 3, 50, 0.5).is_err());
    }

    #[test]
    fn test_delegated_equations_keep_outcome() {
        let (n, p, k, r) = (10_000, 0.001, 3, 50);
        let plain = two_step_disjoint::eq_2_4(n, p, k, r).unwrap();
        let dashed = eq_2_4_dash(n, p, k, r).unwrap();
        assert_eq!(plain.passed, dashed.passed);
        assert_eq!(plain.observed, dashed.observed);
        assert_eq!(dashed.equation.to_string(), "2.4'");
        assert_eq!(eq_2_5_dash(n, p, k, r).unwrap().equation.to_string(), "2.5'");
    }

    #[test]
    fn test_eq_2_2_dash_overlap_beyond_half_does_not_hold() {
        // r' = round(800² / 1000) = 640 > r/2, so r/2 − r' is a negative count
        let result = eq_2_2_dash(1_000, 0.01, 2, 800).unwrap();
        assert!(!result.passed);
        assert!(result.observed.is_nan());
        assert_eq!(result.equation, EquationId::dash(2));
    }

    #[test]
    fn test_eq_2_3_dash_negative_exclusive_count_does_not_hold() {
        // r' = 12, r'' = 9, so r# = 14 − 24 + 9 = −1
        let result = eq_2_3_dash(17, 0.1, 2, 14).unwrap();
        assert!(!result.passed);
        assert!(result.observed.is_nan());
        assert_eq!(result.expected, 1.0);
    }
}
