//! Two-step mechanisms over a disjoint representation (equations 2.1 … 2.6)
//!
//! Every source owns its own storage, so the equations only combine
//! survival probabilities at the candidate count r and its fractions.

use super::{validate_common, validate_threshold, CheckResult, EquationId};
use crate::core::binomial::survival;
use crate::core::comparison::{round_to, ComparisonPolicy};
use crate::core::error::CheckError;

/// 2.1: r falls in the range predicted by `n · B(r, p, k)²`
pub fn eq_2_1(n: u64, p: f64, k: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k", k, n)?;
    let over = survival(r as f64, p, k as f64)?;
    let expect = round_to(n as f64 * over.powi(2), 2);
    Ok(CheckResult::decide(
        EquationId::plain(1),
        ComparisonPolicy::ScaleDependentRange { population: n },
        expect,
        r as f64,
    ))
}

/// 2.2: with `p' = B(r/2, p, k) · B(r, p, k)`, `B(n, p', r/10)` vanishes
pub fn eq_2_2(n: u64, p: f64, k: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k", k, n)?;
    let (r, k) = (r as f64, k as f64);
    let p_dash = survival(r / 2.0, p, k)? * survival(r, p, k)?;
    let expect = survival(n as f64, p_dash, r / 10.0)?;
    Ok(CheckResult::vanishes(EquationId::plain(2), 6, expect))
}

/// 2.3: with `p' = (1 − B(r, p, k)) · B(r, p, k)²`, `B(n, p', 2r/3)` is certain
pub fn eq_2_3(n: u64, p: f64, k: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k", k, n)?;
    let r = r as f64;
    let over = survival(r, p, k as f64)?;
    let p_dash = (1.0 - over) * over.powi(2);
    let expect = survival(n as f64, p_dash, 2.0 * r / 3.0)?;
    Ok(CheckResult::certain(EquationId::plain(3), 6, expect))
}

/// 2.4: with `p' = p · B(r, p, k)`, `B(n, p', k)` is certain
pub fn eq_2_4(n: u64, p: f64, k: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k", k, n)?;
    let k = k as f64;
    let p_dash = p * survival(r as f64, p, k)?;
    let y = survival(n as f64, p_dash, k)?;
    Ok(CheckResult::certain(EquationId::plain(4), 6, y))
}

/// 2.5: with `p'' = B(n, p · B(r/2, p, k), k)`, `B(r, p'', r/2)` vanishes
pub fn eq_2_5(n: u64, p: f64, k: u64, r: u64) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k", k, n)?;
    let (r, k) = (r as f64, k as f64);
    let p_ddash = survival(n as f64, p * survival(r / 2.0, p, k)?, k)?;
    let expect = survival(r, p_ddash, r / 2.0)?;
    Ok(CheckResult::vanishes(EquationId::plain(5), 6, expect))
}

/// 2.6: after `t` insertion attempts, `B(r, p'', r/2)` vanishes
///
/// ```text
/// p'  = p · (1 − (1 − B(r, p, k))^t)
/// p'' = B(n, p' · B(r, p, k), k)
/// ```
pub fn eq_2_6(n: u64, p: f64, k: u64, r: u64, t: u32) -> Result<CheckResult, CheckError> {
    validate_common(n, p, r)?;
    validate_threshold("k", k, n)?;
    if t == 0 {
        return Err(CheckError::invalid("t", 0.0, "must be >= 1"));
    }
    let (r, k) = (r as f64, k as f64);
    let over = survival(r, p, k)?;
    let p_dash = p * (1.0 - (1.0 - over).powf(t as f64));
    let p_ddash = survival(n as f64, p_dash * over, k)?;
    let approx = survival(r, p_ddash, r / 2.0)?;
    Ok(CheckResult::vanishes(EquationId::plain(6), 6, approx))
}
