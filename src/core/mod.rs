//! Core verification algorithms
//!
//! This module contains the analytic checks for hashed representations:
//! - `binomial`: survival function and point mass of the binomial law
//! - `derived`: overlap counts r', r'', r^ and r# of a shared representation
//! - `comparison`: how an expected value is compared against an observation
//! - `nested`: bounded nested sums with shrinking index ranges
//! - `equations`: the eighteen equations of the four representation variants
//! - `suite`: runs the six equations of a variant and folds them into a verdict

pub mod binomial;
pub mod comparison;
pub mod derived;
pub mod equations;
pub mod error;
pub mod nested;
pub mod suite;

pub use binomial::{point_mass, survival};
pub use comparison::ComparisonPolicy;
pub use derived::DerivedCounts;
pub use equations::one_step::Sharing;
pub use equations::{CheckResult, EquationId};
pub use error::CheckError;
pub use suite::{evaluate, Parameters, SuiteHeader, SuiteReport, SuiteRunner, Variant, Verdict};
