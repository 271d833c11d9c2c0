//! Check suite runner
//!
//! Sequences the six named equations of one representation variant,
//! reports every outcome on the [`EventBus`] and folds them into a
//! [`Verdict`]. A variant is consistent only if all six equations hold.

use super::comparison::float_repr;
use super::derived::round_half_even;
use super::equations::one_step::{self, Sharing};
use super::equations::{two_step_disjoint, two_step_shared, CheckResult, EquationId};
use super::error::{validate_bounded, validate_population, validate_probability, CheckError};
use crate::events::{CheckEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

/// Representation scheme under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Disjoint representation, two-step mechanisms (2.1 … 2.6)
    TwoStepDisjoint,
    /// Shared representation, two-step mechanisms (2.1' … 2.6')
    TwoStepShared,
    /// Shared representation, one-step mechanisms (2.1'' … 2.6'')
    OneStepShared,
    /// Partially-shared representation, one-step mechanisms; 2.3'' uses the disjoint sum
    OneStepDisjoint,
}

impl Variant {
    /// Every variant, in reporting order
    pub const ALL: [Variant; 4] = [
        Variant::TwoStepDisjoint,
        Variant::TwoStepShared,
        Variant::OneStepShared,
        Variant::OneStepDisjoint,
    ];

    /// Label of equation `number` in this variant's family
    pub fn equation(self, number: u8) -> EquationId {
        match self {
            Variant::TwoStepDisjoint => EquationId::plain(number),
            Variant::TwoStepShared => EquationId::dash(number),
            Variant::OneStepShared | Variant::OneStepDisjoint => EquationId::double_dash(number),
        }
    }

    /// The variant an equation label belongs to; `sharing` selects the one-step sum
    pub fn for_equation(equation: EquationId, sharing: Sharing) -> Self {
        match (equation.primes, sharing) {
            (0, _) => Variant::TwoStepDisjoint,
            (1, _) => Variant::TwoStepShared,
            (_, Sharing::Shared) => Variant::OneStepShared,
            (_, Sharing::Disjoint) => Variant::OneStepDisjoint,
        }
    }

    /// True when equation `number` runs the deep nested sum
    pub fn is_slow(self, number: u8) -> bool {
        number == 3 && matches!(self, Variant::TwoStepShared | Variant::OneStepShared)
    }

    /// Qualifier printed next to an equation label
    pub fn note(self, number: u8) -> Option<&'static str> {
        match (self, number) {
            (Variant::OneStepDisjoint, 3) => Some("Disjoint"),
            _ => None,
        }
    }

    /// Heading of the textual report
    pub fn title(self) -> &'static str {
        match self {
            Variant::TwoStepDisjoint => "For a Disjoint Representation with Two-Step Mechanisms,",
            Variant::TwoStepShared => "For a Shared Representation with Two-Step Mechanisms,",
            Variant::OneStepShared => "For a Shared Representation with One-Step Mechanisms,",
            Variant::OneStepDisjoint => {
                "For a Partially-Shared Representation with One-Step Mechanisms,"
            }
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Variant::TwoStepDisjoint => "two-step-disjoint",
            Variant::TwoStepShared => "two-step-shared",
            Variant::OneStepShared => "one-step-shared",
            Variant::OneStepDisjoint => "one-step-disjoint",
        };
        f.write_str(name)
    }
}

/// Overall outcome of a suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// All six equations hold
    Passed,
    /// At least one equation does not hold
    Failed,
}

impl Verdict {
    /// AND over the individual outcomes
    pub fn from_results(results: &[CheckResult]) -> Self {
        if results.iter().all(|r| r.passed) {
            Verdict::Passed
        } else {
            Verdict::Failed
        }
    }

    /// True for `Passed`
    pub fn is_passed(self) -> bool {
        self == Verdict::Passed
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Passed => f.write_str("Passed"),
            Verdict::Failed => f.write_str("Failed"),
        }
    }
}

/// Validated parameter bundle for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Population size n
    pub n: u64,
    /// Per-trial success probability p
    pub p: f64,
    /// Threshold k (two-step) and addition threshold k_a (one-step)
    pub k: u64,
    /// Membership threshold multiplier: k_m = round(k_adj · k_a)
    pub k_adj: f64,
    /// Candidate count r
    pub r: u64,
    /// Insertion attempts t (two-step disjoint 2.6)
    pub t: u32,
    /// Tolerance multiplier c₁ (two-step shared 2.1')
    pub c_1: f64,
}

impl Parameters {
    /// Parameters with the default k_adj, t and c₁
    pub fn new(n: u64, p: f64, k: u64, r: u64) -> Self {
        Self {
            n,
            p,
            k,
            k_adj: 1.0,
            r,
            t: 1,
            c_1: two_step_shared::DEFAULT_C1,
        }
    }

    /// Membership threshold of the one-step mechanisms
    pub fn k_m(&self) -> u64 {
        round_half_even(self.k_adj * self.k as f64) as u64
    }

    /// Density d = round(n · p)
    pub fn density(&self) -> u64 {
        round_half_even(self.n as f64 * self.p) as u64
    }

    /// Enforce n > 0, 0 < p < 1, k, r ≤ n, t ≥ 1, c₁ > 1 and k_adj > 0
    pub fn validate(&self) -> Result<(), CheckError> {
        validate_population(self.n)?;
        validate_probability(self.p)?;
        validate_bounded("k", self.k, self.n)?;
        validate_bounded("r", self.r, self.n)?;
        if !self.k_adj.is_finite() || self.k_adj <= 0.0 {
            return Err(CheckError::invalid("k_adj", self.k_adj, "must be finite and > 0"));
        }
        if self.t == 0 {
            return Err(CheckError::invalid("t", 0.0, "must be >= 1"));
        }
        if self.c_1.is_nan() || self.c_1 <= 1.0 {
            return Err(CheckError::invalid("c_1", self.c_1, "must be > 1"));
        }
        Ok(())
    }

    /// [`validate`](Self::validate), plus k_m ≤ n for the one-step variants
    pub fn validate_for(&self, variant: Variant) -> Result<(), CheckError> {
        self.validate()?;
        match variant {
            Variant::OneStepShared | Variant::OneStepDisjoint => {
                validate_bounded("k_m", self.k_m(), self.n)
            }
            Variant::TwoStepDisjoint | Variant::TwoStepShared => Ok(()),
        }
    }
}

/// Values shown in a suite's header line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteHeader {
    pub n: u64,
    pub d: u64,
    pub r: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k_a: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k_m: Option<u64>,
}

impl SuiteHeader {
    pub fn new(variant: Variant, params: &Parameters) -> Self {
        let mut header = Self {
            n: params.n,
            d: params.density(),
            r: params.r,
            k: None,
            t: None,
            c_1: None,
            k_a: None,
            k_m: None,
        };
        match variant {
            Variant::TwoStepDisjoint => {
                header.k = Some(params.k);
                header.t = Some(params.t);
            }
            Variant::TwoStepShared => {
                header.k = Some(params.k);
                header.c_1 = Some(params.c_1);
            }
            Variant::OneStepShared | Variant::OneStepDisjoint => {
                header.k_a = Some(params.k);
                header.k_m = Some(params.k_m());
            }
        }
        header
    }
}

impl std::fmt::Display for SuiteHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, " set n={}, d={}", self.n, self.d)?;
        if let Some(k) = self.k {
            write!(f, ", k={}", k)?;
        }
        if let Some(t) = self.t {
            write!(f, ", t={}", t)?;
        }
        if let Some(c_1) = self.c_1 {
            write!(f, ", c_1={}", float_repr(c_1))?;
        }
        if let Some(k_a) = self.k_a {
            write!(f, ", k_a={}", k_a)?;
        }
        if let Some(k_m) = self.k_m {
            write!(f, ", k_m={}", k_m)?;
        }
        write!(f, ",\n and test r={}:", self.r)
    }
}

/// Outcome of one suite
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteReport {
    pub variant: Variant,
    pub header: SuiteHeader,
    pub results: Vec<CheckResult>,
    pub verdict: Verdict,
}

/// Evaluate equation `number` (1..=6) of `variant`
///
/// # Errors
///
/// `InvalidParameter` for an out-of-domain parameter or a number outside 1..=6.
pub fn evaluate(
    variant: Variant,
    number: u8,
    params: &Parameters,
) -> Result<CheckResult, CheckError> {
    let Parameters {
        n, p, k, r, t, c_1, ..
    } = *params;
    match variant {
        Variant::TwoStepDisjoint => match number {
            1 => two_step_disjoint::eq_2_1(n, p, k, r),
            2 => two_step_disjoint::eq_2_2(n, p, k, r),
            3 => two_step_disjoint::eq_2_3(n, p, k, r),
            4 => two_step_disjoint::eq_2_4(n, p, k, r),
            5 => two_step_disjoint::eq_2_5(n, p, k, r),
            6 => two_step_disjoint::eq_2_6(n, p, k, r, t),
            _ => Err(unknown_equation(number)),
        },
        Variant::TwoStepShared => match number {
            1 => two_step_shared::eq_2_1_dash(n, p, k, r, c_1),
            2 => two_step_shared::eq_2_2_dash(n, p, k, r),
            3 => two_step_shared::eq_2_3_dash(n, p, k, r),
            4 => two_step_shared::eq_2_4_dash(n, p, k, r),
            5 => two_step_shared::eq_2_5_dash(n, p, k, r),
            6 => two_step_shared::eq_2_6_dash(n, p, k, r),
            _ => Err(unknown_equation(number)),
        },
        Variant::OneStepShared | Variant::OneStepDisjoint => {
            let (k_a, k_m) = (k, params.k_m());
            let sharing = if variant == Variant::OneStepShared {
                Sharing::Shared
            } else {
                Sharing::Disjoint
            };
            match number {
                1 => one_step::eq_2_1_ddash(n, p, k_m, r),
                2 => one_step::eq_2_2_ddash(n, p, k_m, r),
                3 => one_step::eq_2_3_ddash(n, p, k_m, r, sharing),
                4 => one_step::eq_2_4_ddash(n, p, k_a, r),
                5 => one_step::eq_2_5_ddash(n, p, k_a, r),
                6 => one_step::eq_2_6_ddash(n, p, k_a, r),
                _ => Err(unknown_equation(number)),
            }
        }
    }
}

fn unknown_equation(number: u8) -> CheckError {
    CheckError::invalid("equation", number as f64, "must be numbered 1 to 6")
}

/// Runs suites and reports them on an event bus
pub struct SuiteRunner {
    bus: EventBus,
}

impl SuiteRunner {
    /// Create a runner reporting to `bus`
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    /// Run the six equations of `variant` in order
    ///
    /// The first error aborts the suite; no partial report is returned.
    pub fn run(
        &mut self,
        variant: Variant,
        params: &Parameters,
    ) -> Result<SuiteReport, CheckError> {
        params.validate_for(variant)?;
        let header = SuiteHeader::new(variant, params);
        self.bus.emit(CheckEvent::SuiteStarted {
            variant,
            header: header.clone(),
        });

        let mut results = Vec::with_capacity(6);
        for number in 1..=6 {
            let equation = variant.equation(number);
            self.bus.emit(CheckEvent::EquationStarted {
                equation,
                slow: variant.is_slow(number),
            });

            let started = Instant::now();
            let result = evaluate(variant, number, params).map_err(|e| {
                warn!(equation = %equation, error = %e, "Suite aborted");
                e
            })?;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            self.bus.emit(CheckEvent::EquationEvaluated {
                result: result.clone(),
                note: variant.note(number),
                elapsed_ms,
            });
            results.push(result);
        }

        let verdict = Verdict::from_results(&results);
        let passed = results.iter().filter(|r| r.passed).count();
        self.bus.emit(CheckEvent::SuiteFinished {
            variant,
            verdict,
            passed,
        });

        Ok(SuiteReport {
            variant,
            header,
            results,
            verdict,
        })
    }

    /// Run every variant with the same parameters
    pub fn run_all(&mut self, params: &Parameters) -> Result<Vec<SuiteReport>, CheckError> {
        Variant::ALL
            .iter()
            .map(|&variant| self.run(variant, params))
            .collect()
    }

    /// Give the bus back, e.g. to inspect observers
    pub fn into_bus(self) -> EventBus {
        self.bus
    }
}
