//! Bounded nested accumulation
//!
//! The collision equations decompose a probability by how a budget of
//! threshold slots is consumed by several sources. Written out, they are
//! loop nests of the form
//!
//! ```text
//! Σ_{i₀ < b(∅)} w₀(i₀) · Σ_{i₁ < b(i₀)} w₁(i₁) · … · Σ_{i_d < b(i₀..)} w_d(i_d) · leaf(i₀..i_d)
//! ```
//!
//! where every inner exclusive bound depends on all outer indices.
//! [`nested_sum`] runs such a nest with an explicit index stack. Each
//! level's partial sum is folded into its parent, multiplied by the
//! parent's weight, when the level is exhausted, which is the same order
//! of floating-point operations as the hand-written nest.
//!
//! The bound function is supplied by the caller. Families differ by one
//! in their bound arithmetic (`k − Σ` versus `k − Σ + 1`) and each keeps
//! its own.

use super::error::CheckError;
use tracing::debug;

/// Weight of one index at one level of the nest
pub type Weight<'a> = &'a dyn Fn(u64) -> Result<f64, CheckError>;

/// Exclusive bound `budget − Σ outer` (zero once the budget is spent)
pub fn remaining_budget(budget: u64, outer: &[u64]) -> u64 {
    budget.saturating_sub(outer.iter().sum())
}

/// Evaluate a nested sum with one weight per level
///
/// * `weights` - weight function per level, outermost first; the depth is `weights.len()`
/// * `bound` - exclusive upper bound of the next level given the indices of all outer levels
/// * `leaf` - innermost term given the full index tuple
///
/// With no weights the result is `leaf(&[])`.
///
/// # Examples
///
/// ```
/// use repverify::core::nested::{nested_sum, remaining_budget};
/// use repverify::core::CheckError;
///
/// // Σ_{i<3} Σ_{j<3-i} 1 = 3 + 2 + 1
/// fn one(_: u64) -> Result<f64, CheckError> {
///     Ok(1.0)
/// }
/// let total = nested_sum(&[&one, &one], |outer| remaining_budget(3, outer), |_| Ok(1.0)).unwrap();
/// assert_eq!(total, 6.0);
/// ```
pub fn nested_sum<B, L>(weights: &[Weight<'_>], bound: B, mut leaf: L) -> Result<f64, CheckError>
where
    B: Fn(&[u64]) -> u64,
    L: FnMut(&[u64]) -> Result<f64, CheckError>,
{
    let depth = weights.len();
    if depth == 0 {
        return leaf(&[]);
    }

    let mut indices: Vec<u64> = Vec::with_capacity(depth);
    let mut bounds: Vec<u64> = Vec::with_capacity(depth);
    let mut partial = vec![0.0_f64; depth];
    let mut terms = 0_u64;

    bounds.push(bound(&[]));
    indices.push(0);

    loop {
        let level = indices.len() - 1;
        let index = indices[level];

        if index >= bounds[level] {
            indices.pop();
            bounds.pop();
            if level == 0 {
                break;
            }
            let parent = level - 1;
            let weight = weights[parent](indices[parent])?;
            partial[parent] += weight * partial[level];
            partial[level] = 0.0;
            indices[parent] += 1;
            continue;
        }

        if level + 1 == depth {
            let term = weights[level](index)? * leaf(&indices)?;
            partial[level] += term;
            indices[level] += 1;
            terms += 1;
        } else {
            bounds.push(bound(&indices));
            indices.push(0);
        }
    }

    debug!(depth, terms, total = partial[0], "Nested sum evaluated");
    Ok(partial[0])
}
