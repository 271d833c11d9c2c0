//! Error taxonomy for equation evaluation
//!
//! Every evaluator is a total function over its valid domain. The only
//! ways to fail are an out-of-domain argument or a probability that could
//! not be computed stably; both surface immediately to the caller.

/// Error type shared by the binomial primitives, the derived-parameter
/// calculator and the equation evaluators
#[derive(Debug, Clone, PartialEq)]
pub enum CheckError {
    /// An argument lies outside the domain of the operation
    InvalidParameter {
        /// Parameter name as it appears in the equations (`n`, `p`, `count`, ...)
        name: &'static str,
        /// Offending value
        value: f64,
        /// Constraint that was violated
        reason: &'static str,
    },
    /// A probability evaluated to NaN or left [0, 1]
    NumericInstability {
        /// Operation that produced the value
        context: &'static str,
        /// The unusable result
        value: f64,
    },
}

impl CheckError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        CheckError::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    pub(crate) fn unstable(context: &'static str, value: f64) -> Self {
        CheckError::NumericInstability { context, value }
    }

    /// True for `InvalidParameter`
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, CheckError::InvalidParameter { .. })
    }
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckError::InvalidParameter {
                name,
                value,
                reason,
            } => write!(f, "Invalid parameter {}={}: {}", name, value, reason),
            CheckError::NumericInstability { context, value } => {
                write!(
                    f,
                    "Numeric instability in {}: result {} is not a probability",
                    context, value
                )
            }
        }
    }
}

impl std::error::Error for CheckError {}

/// Validates a model-level success probability, which must lie strictly in (0, 1)
pub fn validate_probability(p: f64) -> Result<(), CheckError> {
    if p.is_nan() || p <= 0.0 || p >= 1.0 {
        return Err(CheckError::invalid("p", p, "must be in (0, 1)"));
    }
    Ok(())
}

/// Validates the population size, which must be positive
pub fn validate_population(n: u64) -> Result<(), CheckError> {
    if n == 0 {
        return Err(CheckError::invalid("n", 0.0, "must be > 0"));
    }
    Ok(())
}

/// Validates a count that may not exceed the population
pub fn validate_bounded(name: &'static str, value: u64, n: u64) -> Result<(), CheckError> {
    if value > n {
        return Err(CheckError::invalid(name, value as f64, "must not exceed n"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_degenerate_probabilities() {
        for p in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            assert!(validate_probability(p).is_err(), "p={} accepted", p);
        }
        assert!(validate_probability(0.001).is_ok());
    }

    #[test]
    fn test_rejects_zero_population() {
        assert_eq!(
            validate_population(0),
            Err(CheckError::invalid("n", 0.0, "must be > 0"))
        );
        assert!(validate_population(1).is_ok());
    }

    #[test]
    fn test_bounded_counts() {
        assert!(validate_bounded("r", 10, 10).is_ok());
        assert!(validate_bounded("r", 11, 10).unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_error_display_all_variants() {
        let invalid = CheckError::invalid("p", 1.5, "must be in (0, 1)");
        assert!(invalid.to_string().contains("p=1.5"));

        let unstable = CheckError::unstable("survival", f64::NAN);
        assert!(unstable.to_string().contains("survival"));
        assert!(!unstable.is_invalid_parameter());
    }

    #[test]
    fn test_error_is_error_trait() {
        let err: Box<dyn std::error::Error> =
            Box::new(CheckError::invalid("n", 0.0, "must be > 0"));
        assert!(err.to_string().contains("n=0"));
    }
}
