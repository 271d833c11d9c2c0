//! Run configuration
//!
//! A [`CheckConfig`] is the user-facing parameter bundle: it can be read
//! from a JSON file, overridden field by field from the command line and
//! resolved into validated [`Parameters`]. Counts are signed here so that
//! a negative value in a file reaches validation and is reported as an
//! invalid parameter instead of a parse error.

use crate::core::equations::two_step_shared::DEFAULT_C1;
use crate::core::error::CheckError;
use crate::core::suite::{Parameters, Variant};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Parameter bundle for one run
///
/// ```
/// use repverify::config::CheckConfig;
///
/// let json = r#"{"n": 10000, "d": 10, "k": 3, "r": 50}"#;
/// let config: CheckConfig = serde_json::from_str(json).unwrap();
/// let params = config.resolve().unwrap();
/// assert_eq!(params.p, 0.001);
/// assert_eq!(params.t, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    /// Representation variant checked by `repverify check`
    #[serde(default = "default_variant")]
    pub variant: Variant,
    /// Population size n
    pub n: i64,
    /// Per-trial success probability p
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<f64>,
    /// Density d; gives p = d / n when p is not set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<f64>,
    /// Threshold k, the addition threshold k_a of one-step mechanisms
    pub k: i64,
    /// Membership threshold multiplier of one-step mechanisms
    #[serde(default = "default_k_adj")]
    pub k_adj: f64,
    /// Candidate count r
    pub r: i64,
    /// Insertion attempts t
    #[serde(default = "default_t")]
    pub t: i64,
    /// Tolerance multiplier c₁
    #[serde(default = "default_c_1")]
    pub c_1: f64,
}

fn default_variant() -> Variant {
    Variant::TwoStepDisjoint
}

fn default_k_adj() -> f64 {
    1.0
}

fn default_t() -> i64 {
    1
}

fn default_c_1() -> f64 {
    DEFAULT_C1
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            variant: default_variant(),
            n: 10_000,
            p: None,
            d: Some(10.0),
            k: 3,
            k_adj: default_k_adj(),
            r: 50,
            t: default_t(),
            c_1: default_c_1(),
        }
    }
}

/// Individual field overrides, typically from command-line flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub variant: Option<Variant>,
    pub n: Option<i64>,
    pub p: Option<f64>,
    pub d: Option<f64>,
    pub k: Option<i64>,
    pub k_adj: Option<f64>,
    pub r: Option<i64>,
    pub t: Option<i64>,
    pub c_1: Option<f64>,
}

/// Failure to obtain a usable configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The file could not be read
    Io { path: String, message: String },
    /// The file is not a valid configuration document
    Parse { path: String, message: String },
    /// A value is outside its domain
    Invalid(CheckError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "cannot read config {}: {}", path, message)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "malformed config {}: {}", path, message)
            }
            ConfigError::Invalid(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<CheckError> for ConfigError {
    fn from(e: CheckError) -> Self {
        ConfigError::Invalid(e)
    }
}

impl CheckConfig {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: shown.clone(),
            message: e.to_string(),
        })?;
        let config = serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: shown.clone(),
            message: e.to_string(),
        })?;
        debug!(path = %shown, "Loaded configuration");
        Ok(config)
    }

    /// Apply every override that is set
    ///
    /// Setting one of p and d clears the other, so the override wins over
    /// whatever the file specified.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(variant) = overrides.variant {
            self.variant = variant;
        }
        if let Some(n) = overrides.n {
            self.n = n;
        }
        if let Some(p) = overrides.p {
            self.p = Some(p);
            self.d = None;
        }
        if let Some(d) = overrides.d {
            self.d = Some(d);
            self.p = None;
        }
        if let Some(k) = overrides.k {
            self.k = k;
        }
        if let Some(k_adj) = overrides.k_adj {
            self.k_adj = k_adj;
        }
        if let Some(r) = overrides.r {
            self.r = r;
        }
        if let Some(t) = overrides.t {
            self.t = t;
        }
        if let Some(c_1) = overrides.c_1 {
            self.c_1 = c_1;
        }
    }

    /// The success probability, given directly or as d / n
    pub fn probability(&self) -> Result<f64, CheckError> {
        match (self.p, self.d) {
            (Some(_), Some(d)) => Err(CheckError::invalid("d", d, "conflicts with p")),
            (Some(p), None) => Ok(p),
            (None, Some(d)) => {
                if self.n <= 0 {
                    return Err(CheckError::invalid("n", self.n as f64, "must be > 0"));
                }
                Ok(d / self.n as f64)
            }
            (None, None) => Err(CheckError::invalid("p", f64::NAN, "p or d is required")),
        }
    }

    /// Convert into validated [`Parameters`]
    pub fn resolve(&self) -> Result<Parameters, CheckError> {
        let params = Parameters {
            n: non_negative("n", self.n)?,
            p: self.probability()?,
            k: non_negative("k", self.k)?,
            k_adj: self.k_adj,
            r: non_negative("r", self.r)?,
            t: u32::try_from(self.t)
                .map_err(|_| CheckError::invalid("t", self.t as f64, "must be in 1..=u32::MAX"))?,
            c_1: self.c_1,
        };
        params.validate()?;
        Ok(params)
    }
}

fn non_negative(name: &'static str, value: i64) -> Result<u64, CheckError> {
    u64::try_from(value).map_err(|_| CheckError::invalid(name, value as f64, "must be >= 0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config() -> CheckConfig {
        CheckConfig::default()
    }

    #[test]
    fn test_default_resolves() {
        let params = config().resolve().unwrap();
        assert_eq!(params.n, 10_000);
        assert_eq!(params.p, 0.001);
        assert_eq!(params.k_adj, 1.0);
        assert_eq!(params.c_1, DEFAULT_C1);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: CheckConfig =
            serde_json::from_str(r#"{"n": 1000, "p": 0.01, "k": 2, "r": 40}"#).unwrap();
        assert_eq!(config.variant, Variant::TwoStepDisjoint);
        assert_eq!(config.t, 1);
        assert_eq!(config.c_1, DEFAULT_C1);
        assert_eq!(config.d, None);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let parsed: Result<CheckConfig, _> =
            serde_json::from_str(r#"{"n": 1000, "p": 0.01, "k": 2, "r": 40, "q": 1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_variant_parses_kebab_case() {
        let config: CheckConfig = serde_json::from_str(
            r#"{"variant": "one-step-disjoint", "n": 1000, "p": 0.01, "k": 2, "r": 40}"#,
        )
        .unwrap();
        assert_eq!(config.variant, Variant::OneStepDisjoint);
    }

    #[test]
    fn test_negative_counts_are_invalid_parameters() {
        for field in ["n", "k", "r"] {
            let mut c = config();
            match field {
                "n" => c.n = -1,
                "k" => c.k = -1,
                _ => c.r = -5,
            }
            let err = c.resolve().unwrap_err();
            assert!(err.is_invalid_parameter(), "{} accepted", field);
        }
        let mut c = config();
        c.t = -1;
        assert!(c.resolve().unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_p_and_d_conflict() {
        let mut c = config();
        c.p = Some(0.001);
        assert!(c.resolve().is_err());
        c.p = None;
        c.d = None;
        assert!(c.resolve().is_err());
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut c = config();
        c.apply(&ConfigOverrides {
            variant: Some(Variant::TwoStepShared),
            p: Some(0.002),
            r: Some(80),
            ..Default::default()
        });
        assert_eq!(c.variant, Variant::TwoStepShared);
        assert_eq!(c.d, None);
        let params = c.resolve().unwrap();
        assert_eq!(params.p, 0.002);
        assert_eq!(params.r, 80);
        assert_eq!(params.k, 3);
    }

    #[test]
    fn test_from_file() {
        let name = format!("repverify-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"n": 5000, "d": 5, "k": 2, "r": 30, "t": 2}}"#).unwrap();
        drop(file);

        let config = CheckConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.n, 5000);
        assert_eq!(config.t, 2);
        assert_eq!(config.resolve().unwrap().p, 0.001);
    }

    #[test]
    fn test_from_file_reports_missing_file() {
        let err = CheckConfig::from_file("/nonexistent/repverify.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/repverify.json"));
    }
}
