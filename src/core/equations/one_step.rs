//! One-step mechanisms (equations 2.1'' … 2.6'')
//!
//! One-step mechanisms use separate thresholds for membership (k_m) and
//! addition (k_a). The representation is either fully shared or
//! partially shared; the two differ only in how the collision
//! probability of 2.3'' is decomposed ([`Sharing`]).

use super::{overlap_sum, validate_common, validate_threshold, CheckResult, EquationId};
use crate::core::binomial::{point_mass, survival};
use crate::core::comparison::{round_to, ComparisonPolicy};
use crate::core::derived::{self, DerivedCounts};
use crate::core::error::CheckError;
use crate::core::nested::{nested_sum, remaining_budget};
use serde::{Deserialize, Serialize};

/// How the membership budget of 2.3'' is decomposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sharing {
    /// Independent sources: one sum over the slots filled by the candidates
    Disjoint,
    /// Shared storage: five nested sums over exclusive, pairwise and three-way regions
    Shared,
}

/// 2.1'': r lies in the range predicted by `n · B(2r − r', p, k_m)`
pub fn eq_2_1_ddash(n: u64, p: f64, k_m: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k_m", k_m, n)?;
    let r_dash = derived::r_dash(n, r)? as f64;
    let p_dash = survival(2.0 * r as f64 - r_dash, p, k_m as f64)?;
    let expect = round_to(n as f64 * p_dash, 2);
    Ok(CheckResult::decide(
        EquationId::double_dash(1),
        ComparisonPolicy::ScaleDependentRange { population: n },
        expect,
        r as f64,
    ))
}

/// 2.2'': with `p' = B(3r/2, p, k_m)`, `B(n, p', r/10)` vanishes
pub fn eq_2_2_ddash(n: u64, p: f64, k_m: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k_m", k_m, n)?;
    let r = r as f64;
    let p_dash = survival(3.0 * r / 2.0, p, k_m as f64)?;
    let expect = survival(n as f64, p_dash, r / 10.0)?;
    Ok(CheckResult::vanishes(EquationId::double_dash(2), 6, expect))
}

/// Collision probability for disjoint storage
///
/// ```text
/// Σ_{s<k_m} T(r, p, s) · B(r, p, k_m − s) · (1 − B(r, p, k_m − s))
/// ```
pub fn collision_probability_disjoint(p: f64, k_m: u64, r: u64) -> Result<f64, CheckError> {
    let r = r as f64;
    let filled = |s: u64| point_mass(r, p, s as f64);
    nested_sum(&[&filled], |_| k_m, |idx| {
        let over = survival(r, p, (k_m - idx[0]) as f64)?;
        Ok(over * (1.0 - over))
    })
}

/// Collision probability for shared storage
///
/// Five nested indices in the order s, i, j, m, l, weighted by the point
/// masses of the exclusive region r#, the pairwise regions r^ (i, j, l)
/// and the three-way region r'' (m). Each range is exclusive of the
/// remaining budget, `0..k_m − Σouter`. The leaf evaluates the exclusive
/// region against whatever budget is left.
///
/// # Errors
///
/// `InvalidParameter` when r# is negative.
pub fn collision_probability_shared(n: u64, p: f64, k_m: u64, r: u64) -> Result<f64, CheckError> {
    let counts = DerivedCounts::new(n, r)?;
    let r_caret = counts.r_caret as f64;
    let r_ddash = counts.r_ddash as f64;
    let r_sharp = counts.r_sharp as f64;

    let exclusive = |s: u64| point_mass(r_sharp, p, s as f64);
    let pairwise = |x: u64| point_mass(r_caret, p, x as f64);
    let three_way = |m: u64| point_mass(r_ddash, p, m as f64);

    nested_sum(
        &[&exclusive, &pairwise, &pairwise, &three_way, &pairwise],
        |outer| remaining_budget(k_m, outer),
        |idx| {
            let over = survival(r_sharp, p, remaining_budget(k_m, idx) as f64)?;
            Ok(over * (1.0 - over))
        },
    )
}

/// 2.3'': `B(n, p', 2r/3)` is certain, with p' decomposed per `sharing`
pub fn eq_2_3_ddash(
    n: u64,
    p: f64,
    k_m: u64,
    r: u64,
    sharing: Sharing,
) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k_m", k_m, n)?;
    let p_dash = match sharing {
        Sharing::Disjoint => collision_probability_disjoint(p, k_m, r)?,
        Sharing::Shared => {
            let r_sharp = DerivedCounts::new(n, r)?.r_sharp;
            if r_sharp < 0 {
                return Ok(CheckResult::undefined(
                    EquationId::double_dash(3),
                    ComparisonPolicy::certain(6),
                    1.0,
                    ("r#", r_sharp as f64),
                ));
            }
            collision_probability_shared(n, p, k_m, r)?
        }
    };
    let p_dash = p_dash.min(1.0);
    let expect = survival(n as f64, p_dash, 2.0 * r as f64 / 3.0)?;
    Ok(CheckResult::certain(EquationId::double_dash(3), 6, expect))
}

/// 2.4'': with `p' = p · B(r, p, k_a)`, `B(n, p', k_a)` is certain
pub fn eq_2_4_ddash(n: u64, p: f64, k_a: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k_a", k_a, n)?;
    let k_a = k_a as f64;
    let p_dash = p * survival(r as f64, p, k_a)?;
    let y = survival(n as f64, p_dash, k_a)?;
    Ok(CheckResult::certain(EquationId::double_dash(4), 6, y))
}

/// 2.5'': with `p'' = B(n, p · B(r/2, p, k_a), k_a)`, `B(r, p'', r/2)` vanishes
pub fn eq_2_5_ddash(n: u64, p: f64, k_a: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k_a", k_a, n)?;
    let (r, k_a) = (r as f64, k_a as f64);
    let p_dash = p * survival(r / 2.0, p, k_a)?;
    let p_ddash = survival(n as f64, p_dash, k_a)?;
    let expect = survival(r, p_ddash, r / 2.0)?;
    Ok(CheckResult::vanishes(EquationId::double_dash(5), 6, expect))
}

/// 2.6'': the overlap-aware addition probability still vanishes at r/2
///
/// ```text
/// p'  = p · (B(r', p, k_a) + Σ_{i<k_a} T(r', p, i) · B(r − r', p, k_a − i)²)
/// p'' = B(n, p', k_a)
/// ```
pub fn eq_2_6_ddash(n: u64, p: f64, k_a: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k_a", k_a, n)?;
    let rf = r as f64;
    let over = overlap_sum(n, p, k_a, r, |r_dash, remaining| {
        Ok(survival(rf - r_dash, p, remaining)?.powi(2))
    })?;
    let p_dash = p * over;
    let p_ddash = survival(n as f64, p_dash, k_a as f64)?;
    let expect = survival(rf, p_ddash, rf / 2.0)?;
    Ok(CheckResult::vanishes(EquationId::double_dash(6), 6, expect))
}
